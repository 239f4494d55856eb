//! Order Lifecycle Module
//!
//! - [`OrderStatus`]: the lifecycle states and the transitions between them
//! - [`TransitionError`]: why a requested status change was refused

pub mod status;

// Re-exports
pub use status::{OrderStatus, TransitionError};
