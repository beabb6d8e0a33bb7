use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::order_actor::OrderError;

/// Lifecycle position of an order on the board.
///
/// ```text
/// Pending -> Preparing -> Ready -> Completed [-> Archived]
///                 ^---------'
///                 send back
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Completed,
    Archived,
}

/// The kind of edge a status change travels along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Advance,
    SendBack,
    Archive,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Completed,
        OrderStatus::Archived,
    ];

    /// Shown on the live board.
    pub fn is_active(self) -> bool {
        matches!(self, OrderStatus::Preparing | OrderStatus::Ready)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Archived)
    }

    /// Holds its coupon number: no other order may use it meanwhile.
    pub fn occupies_coupon(self) -> bool {
        !self.is_terminal()
    }

    /// Next step in the forward progression, if any.
    pub fn next(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Preparing),
            OrderStatus::Preparing => Some(OrderStatus::Ready),
            OrderStatus::Ready => Some(OrderStatus::Completed),
            OrderStatus::Completed | OrderStatus::Archived => None,
        }
    }

    /// Looks `self -> to` up in the transition table.
    pub fn transition_to(self, to: OrderStatus) -> Result<Transition, OrderError> {
        use OrderStatus::*;

        match (self, to) {
            (Pending, Preparing) | (Preparing, Ready) | (Ready, Completed) => Ok(Transition::Advance),
            (Ready, Preparing) => Ok(Transition::SendBack),
            (Completed, Archived) => Ok(Transition::Archive),
            (from, to) => Err(OrderError::InvalidTransition { from, to }),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Preparing => "Preparing",
            OrderStatus::Ready => "Ready",
            OrderStatus::Completed => "Completed",
            OrderStatus::Archived => "Archived",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown order status: {s}"))
    }
}
