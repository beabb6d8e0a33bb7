//! Typed client handles over the resource actors.

#[macro_use]
mod macros;

pub mod feed;
pub mod order_client;

pub use feed::*;
pub use order_client::*;
