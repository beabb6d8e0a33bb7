use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CustomerId, OrderStatus};

/// The number printed on a customer's coupon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CouponNumber(pub u32);

impl fmt::Display for CouponNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for CouponNumber {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub quantity: u32,
}

impl OrderItem {
    pub fn new(name: impl Into<String>, quantity: u32) -> Self {
        Self {
            name: name.into(),
            quantity,
        }
    }

    /// What a bare coupon entry buys.
    pub fn coupon_meal() -> Self {
        Self::new("Coupon Meal", 1)
    }
}

/// An order tracked by the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub coupon_number: CouponNumber,
    pub customer: CustomerId,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a new order.
#[derive(Debug, Clone)]
pub struct OrderCreate {
    pub coupon_number: CouponNumber,
    pub items: Vec<OrderItem>,
    /// Owner of the order. Derived from the coupon when absent.
    pub customer: Option<CustomerId>,
    pub initial_status: OrderStatus,
}

impl OrderCreate {
    pub fn coupon(coupon_number: impl Into<CouponNumber>) -> Self {
        Self {
            coupon_number: coupon_number.into(),
            items: vec![OrderItem::coupon_meal()],
            customer: None,
            initial_status: OrderStatus::Preparing,
        }
    }

    pub fn with_items(mut self, items: Vec<OrderItem>) -> Self {
        self.items = items;
        self
    }

    pub fn for_customer(mut self, customer: CustomerId) -> Self {
        self.customer = Some(customer);
        self
    }

    pub fn starting_at(mut self, status: OrderStatus) -> Self {
        self.initial_status = status;
        self
    }
}

/// Staff corrections to an existing order.
#[derive(Debug, Clone, Default)]
pub struct OrderPatch {
    pub coupon_number: Option<CouponNumber>,
    pub items: Option<Vec<OrderItem>>,
}

impl Order {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// True when both orders hold the same coupon number at the same time.
    pub fn shares_coupon_with(&self, other: &Order) -> bool {
        self.id != other.id
            && self.coupon_number == other.coupon_number
            && self.status.occupies_coupon()
            && other.status.occupies_coupon()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(id: &str, coupon: u32, status: OrderStatus) -> Order {
        Order {
            id: id.to_string(),
            coupon_number: CouponNumber(coupon),
            customer: CustomerId::for_coupon(CouponNumber(coupon)),
            items: vec![OrderItem::coupon_meal()],
            status,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn finished_orders_release_their_coupon() {
        let live = order("a", 42, OrderStatus::Ready);
        assert!(live.shares_coupon_with(&order("b", 42, OrderStatus::Preparing)));
        assert!(live.shares_coupon_with(&order("b", 42, OrderStatus::Pending)));
        assert!(!live.shares_coupon_with(&order("b", 42, OrderStatus::Completed)));
        assert!(!live.shares_coupon_with(&order("b", 7, OrderStatus::Ready)));
        assert!(!live.shares_coupon_with(&order("a", 42, OrderStatus::Ready)));
    }

    #[test]
    fn coupon_entry_defaults() {
        let create = OrderCreate::coupon(42);
        assert_eq!(create.items, vec![OrderItem::new("Coupon Meal", 1)]);
        assert_eq!(create.initial_status, OrderStatus::Preparing);
        assert!(create.customer.is_none());
    }
}
