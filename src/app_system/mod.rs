//! System orchestration, configuration, startup, and shutdown logic.

pub mod board_system;
pub mod config;
pub mod telemetry;

pub use board_system::*;
pub use config::*;
pub use telemetry::*;
