use thiserror::Error;

use super::Permission;

/// Failures around ready alerts. None of them stop order updates from
/// reaching the board.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum NotificationError {
    #[error("Notifications unavailable: permission {0}")]
    Unavailable(Permission),
    #[error("Notification delivery failed: {0}")]
    Delivery(String),
    #[error("Subscription store error: {0}")]
    Store(String),
}
