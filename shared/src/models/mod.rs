//! Data models
//!
//! Persisted entity shapes (camelCase on the wire) plus their create/update
//! payloads. Validation here is field-level only; cross-entity rules belong
//! to the repository.

pub mod cart_settings;
pub mod category;
pub mod common;
pub mod contact;
pub mod dish;
pub mod image_ref;
pub mod order;
pub mod restaurant_settings;

// Re-exports
pub use cart_settings::*;
pub use category::*;
pub use common::*;
pub use contact::*;
pub use dish::*;
pub use image_ref::*;
pub use order::*;
pub use restaurant_settings::*;
