//! # Canteen order board
//!
//! Staff enter coupon numbers and move each order through
//! `Pending -> Preparing -> Ready -> Completed`; customers watch a live board
//! and can ask for a one-time alert when their order is ready.
//!
//! - [`clients::OrderClient`] is the order store API. Writes go through a
//!   single [`actor_framework::ResourceActor`], which keeps coupon numbers
//!   unique among unfinished orders.
//! - [`clients::OrderFeed`] streams board snapshots in write order.
//! - [`notifier::NotificationDispatcher`] turns `Preparing -> Ready` edges into
//!   alerts and clears each subscription once it fires.
//! - [`app_system::BoardSystem`] wires everything together.

pub mod actor_framework;
pub mod app_system;
pub mod clients;
pub mod domain;
pub mod notifier;
pub mod order_actor;
pub mod storage;

#[cfg(test)]
mod mock_framework;
