pub mod identity;
pub mod order;
pub mod status;

pub use identity::*;
pub use order::*;
pub use status::*;
