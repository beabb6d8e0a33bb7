//! "Your order is ready" alerts.
//!
//! The dispatcher watches the live board, detects orders moving from
//! `Preparing` to `Ready`, and alerts the customers who asked for it. Every
//! subscription fires once and is then cleared.

pub mod channel;
pub mod dispatcher;
pub mod error;
pub mod subscriptions;

pub use channel::*;
pub use dispatcher::*;
pub use error::*;
pub use subscriptions::*;
