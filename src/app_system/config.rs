use std::env;

use anyhow::{anyhow, Context};

use crate::actor_framework::ActorOptions;
use crate::domain::OrderStatus;

/// What happens to an order once it is collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionPolicy {
    /// Completed orders are deleted from the store.
    Delete,
    /// Completed orders stay in the store as history and can be archived.
    Retain,
}

/// The lifecycle variant the kitchen runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Workflow {
    pub start_status: OrderStatus,
    pub completion: CompletionPolicy,
}

impl Default for Workflow {
    fn default() -> Self {
        Self {
            start_status: OrderStatus::Preparing,
            completion: CompletionPolicy::Delete,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BoardConfig {
    pub workflow: Workflow,
    pub channel_buffer: usize,
    pub feed_capacity: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        let options = ActorOptions::default();
        Self {
            workflow: Workflow::default(),
            channel_buffer: options.buffer_size,
            feed_capacity: options.feed_capacity,
        }
    }
}

impl BoardConfig {
    /// Reads `BOARD_*` variables from the process environment (and `.env`).
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let start_status = match lookup("BOARD_START_STATUS").as_deref().map(str::trim) {
            None | Some("") => defaults.workflow.start_status,
            Some(value) => match value.to_ascii_lowercase().as_str() {
                "preparing" => OrderStatus::Preparing,
                "pending" => OrderStatus::Pending,
                other => {
                    return Err(anyhow!(
                        "BOARD_START_STATUS must be `preparing` or `pending`, got `{other}`"
                    ))
                }
            },
        };

        let completion = match lookup("BOARD_COMPLETED_ORDERS").as_deref().map(str::trim) {
            None | Some("") => defaults.workflow.completion,
            Some(value) => match value.to_ascii_lowercase().as_str() {
                "delete" => CompletionPolicy::Delete,
                "retain" => CompletionPolicy::Retain,
                other => {
                    return Err(anyhow!(
                        "BOARD_COMPLETED_ORDERS must be `delete` or `retain`, got `{other}`"
                    ))
                }
            },
        };

        let channel_buffer = parse_size(&lookup, "BOARD_CHANNEL_BUFFER", defaults.channel_buffer)?;
        let feed_capacity = parse_size(&lookup, "BOARD_FEED_CAPACITY", defaults.feed_capacity)?;

        Ok(Self {
            workflow: Workflow {
                start_status,
                completion,
            },
            channel_buffer,
            feed_capacity,
        })
    }

    pub fn actor_options(&self) -> ActorOptions {
        ActorOptions {
            buffer_size: self.channel_buffer,
            feed_capacity: self.feed_capacity,
            retain_retired: self.workflow.completion == CompletionPolicy::Retain,
        }
    }
}

fn parse_size(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: usize,
) -> anyhow::Result<usize> {
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    let size: usize = raw
        .trim()
        .parse()
        .with_context(|| format!("{key} must be a positive integer, got `{raw}`"))?;
    if size == 0 {
        return Err(anyhow!("{key} must be greater than zero"));
    }
    Ok(size)
}
