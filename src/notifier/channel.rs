use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::info;

use super::NotificationError;
use crate::domain::{CouponNumber, CustomerId, Order};

/// Whether the alert primitive may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Permission {
    Granted,
    Denied,
    Undetermined,
    Unsupported,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Permission::Granted => "granted",
            Permission::Denied => "denied",
            Permission::Undetermined => "undetermined",
            Permission::Unsupported => "unsupported",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub recipient: CustomerId,
    pub order_id: String,
    pub coupon_number: CouponNumber,
    pub title: String,
    pub body: String,
}

impl Notification {
    pub fn order_ready(recipient: CustomerId, order: &Order) -> Self {
        Self {
            recipient,
            order_id: order.id.clone(),
            coupon_number: order.coupon_number,
            title: "Order Ready!".to_string(),
            body: format!("Coupon #{} is ready for pickup.", order.coupon_number),
        }
    }
}

/// Fire-and-forget local alert primitive.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn permission(&self) -> Permission;

    /// Asks the user; resolves to the new permission state.
    async fn request_permission(&self) -> Permission;

    async fn deliver(&self, notification: &Notification) -> Result<(), NotificationError>;
}

/// Emits alerts as structured log events.
pub struct TracingChannel {
    permission: Mutex<Permission>,
    grant_on_request: bool,
}

impl TracingChannel {
    pub fn new(permission: Permission, grant_on_request: bool) -> Self {
        Self {
            permission: Mutex::new(permission),
            grant_on_request,
        }
    }

    pub fn granted() -> Self {
        Self::new(Permission::Granted, true)
    }
}

#[async_trait]
impl NotificationChannel for TracingChannel {
    async fn permission(&self) -> Permission {
        *self.permission.lock().await
    }

    async fn request_permission(&self) -> Permission {
        let mut permission = self.permission.lock().await;
        if *permission == Permission::Undetermined {
            *permission = if self.grant_on_request {
                Permission::Granted
            } else {
                Permission::Denied
            };
        }
        *permission
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), NotificationError> {
        let permission = *self.permission.lock().await;
        if permission != Permission::Granted {
            return Err(NotificationError::Unavailable(permission));
        }
        info!(
            recipient = %notification.recipient,
            order_id = %notification.order_id,
            title = %notification.title,
            "{}",
            notification.body
        );
        Ok(())
    }
}
