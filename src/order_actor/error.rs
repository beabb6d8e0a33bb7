use thiserror::Error;

use crate::actor_framework::FrameworkError;
use crate::domain::{CouponNumber, OrderStatus};

/// Errors that can occur during order operations. All of them are
/// recoverable: the board state is unchanged when one is returned.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    #[error("Coupon #{0} is already in the queue")]
    DuplicateCoupon(CouponNumber),
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("Order not found: {0}")]
    NotFound(String),
    #[error("Order validation error: {0}")]
    Validation(String),
    #[error("Order persistence error: {0}")]
    Persistence(String),
    #[error("Actor communication error: {0}")]
    ActorCommunication(String),
}

impl OrderError {
    /// Worth retrying unchanged: the store or the actor was unreachable.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            OrderError::Persistence(_) | OrderError::ActorCommunication(_)
        )
    }
}

impl From<FrameworkError> for OrderError {
    fn from(err: FrameworkError) -> Self {
        match err {
            FrameworkError::NotFound(id) => OrderError::NotFound(id),
            FrameworkError::Persistence(e) => OrderError::Persistence(e.to_string()),
            FrameworkError::ActorClosed | FrameworkError::ActorDropped => {
                OrderError::ActorCommunication(err.to_string())
            }
        }
    }
}
