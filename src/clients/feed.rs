use std::collections::HashSet;

use serde::Serialize;

use crate::actor_framework::{Feed, Snapshot};
use crate::domain::{Order, OrderStatus};

/// Which orders a board view is interested in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusFilter {
    /// `Preparing` and `Ready`: the live board.
    Active,
    Only(HashSet<OrderStatus>),
    All,
}

impl StatusFilter {
    pub fn only(statuses: impl IntoIterator<Item = OrderStatus>) -> Self {
        StatusFilter::Only(statuses.into_iter().collect())
    }

    pub fn matches(&self, status: OrderStatus) -> bool {
        match self {
            StatusFilter::Active => status.is_active(),
            StatusFilter::Only(statuses) => statuses.contains(&status),
            StatusFilter::All => true,
        }
    }
}

/// One filtered view of the board, oldest order first.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BoardSnapshot {
    pub version: u64,
    pub orders: Vec<Order>,
}

impl BoardSnapshot {
    pub fn from_snapshot(snapshot: &Snapshot<Order>, filter: &StatusFilter) -> Self {
        Self::from_orders(
            snapshot.version,
            snapshot
                .items
                .iter()
                .filter(|order| filter.matches(order.status))
                .cloned(),
        )
    }

    pub fn from_orders(version: u64, orders: impl IntoIterator<Item = Order>) -> Self {
        let mut orders: Vec<Order> = orders.into_iter().collect();
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Self { version, orders }
    }

    pub fn with_status(&self, status: OrderStatus) -> impl Iterator<Item = &Order> + '_ {
        self.orders.iter().filter(move |order| order.status == status)
    }

    /// The "ready to collect" section.
    pub fn ready(&self) -> Vec<&Order> {
        self.with_status(OrderStatus::Ready).collect()
    }

    /// The "currently preparing" section.
    pub fn preparing(&self) -> Vec<&Order> {
        self.with_status(OrderStatus::Preparing).collect()
    }

    pub fn get(&self, id: &str) -> Option<&Order> {
        self.orders.iter().find(|order| order.id == id)
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

/// Live, filtered board subscription.
///
/// Snapshots arrive in the order the store applied its writes. Dropping the
/// feed (or calling [`OrderFeed::unsubscribe`]) releases it.
#[derive(Debug)]
pub struct OrderFeed {
    inner: Feed<Order>,
    filter: StatusFilter,
}

impl OrderFeed {
    pub(crate) fn new(inner: Feed<Order>, filter: StatusFilter) -> Self {
        Self { inner, filter }
    }

    pub fn filter(&self) -> &StatusFilter {
        &self.filter
    }

    /// Next board view, or `None` once the store has shut down.
    pub async fn next(&mut self) -> Option<BoardSnapshot> {
        let snapshot = self.inner.next().await?;
        Some(BoardSnapshot::from_snapshot(&snapshot, &self.filter))
    }

    pub fn unsubscribe(self) {
        self.inner.unsubscribe();
    }
}
