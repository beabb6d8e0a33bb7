//! Order-specific domain logic: the lifecycle actions and the coupon invariant.

mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;
