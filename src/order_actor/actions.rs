use crate::domain::{OrderStatus, Transition};

/// Status changes staff can apply to an order.
#[derive(Debug, Clone)]
pub enum OrderAction {
    /// Move to an explicit status; must be an edge of the transition table.
    SetStatus(OrderStatus),
    /// Move one step along `Pending -> Preparing -> Ready -> Completed`.
    Advance,
    /// Return a `Ready` order to `Preparing`.
    SendBack,
}

/// What a successful [`OrderAction`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub transition: Transition,
}
