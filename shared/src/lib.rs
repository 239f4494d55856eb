//! Shared types for the storefront
//!
//! Domain models, the order status machine, the typed event contract and the
//! unified error codes. Everything here is plain data plus pure helpers; the
//! persistence layer lives in `storefront-store`.

pub mod error;
pub mod event;
pub mod models;
pub mod order;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use error::{AppError, AppResult, ErrorCategory, ErrorCode};
pub use event::{CategoryChange, EventEnvelope, EventType, OrderChange, StoreEvent};
pub use order::OrderStatus;
