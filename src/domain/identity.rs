use std::fmt;

use serde::{Deserialize, Serialize};

use super::CouponNumber;

/// Stable, opaque identity of a customer or staff member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CustomerId(String);

impl CustomerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The owner key the board derives for an order entered by coupon alone.
    pub fn for_coupon(coupon: CouponNumber) -> Self {
        Self(format!("student-{}", coupon))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Staff,
    Customer,
}

/// Who is acting. Handed explicitly to the order client and the dispatcher
/// instead of being read from session globals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityContext {
    pub id: CustomerId,
    pub role: Role,
}

impl IdentityContext {
    pub fn staff(id: impl Into<String>) -> Self {
        Self {
            id: CustomerId::new(id),
            role: Role::Staff,
        }
    }

    pub fn customer(id: impl Into<String>) -> Self {
        Self {
            id: CustomerId::new(id),
            role: Role::Customer,
        }
    }
}

impl fmt::Display for IdentityContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.role {
            Role::Staff => write!(f, "staff:{}", self.id),
            Role::Customer => write!(f, "customer:{}", self.id),
        }
    }
}
