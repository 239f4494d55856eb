//! Unified error codes for the storefront
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 4xxx: Order errors
//! - 6xxx: Menu errors (dishes, categories)
//! - 7xxx: Settings errors (cart, restaurant, delivery zones)
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so the UI can map them to
/// localized messages without parsing text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,

    // ==================== 4xxx: Order ====================
    OrderNotFound = 4001,
    OrderAlreadyCompleted = 4003,
    OrderAlreadyCancelled = 4004,
    OrderEmpty = 4007,
    /// Status change not allowed by the order lifecycle
    OrderInvalidTransition = 4008,

    // ==================== 6xxx: Menu ====================
    DishNotFound = 6001,
    DishInvalidPrice = 6002,
    CategoryNotFound = 6101,
    /// Category still referenced by dishes
    CategoryHasDishes = 6102,

    // ==================== 7xxx: Settings ====================
    CartSettingsNotFound = 7001,
    DeliveryZoneNotFound = 7101,

    // ==================== 9xxx: System ====================
    DatabaseError = 9002,

    // ==================== 94xx: Storage ====================
    StorageFull = 9401,
    StorageCorrupted = 9403,
    /// Another tab wrote the collection since it was read
    WriteConflict = 9405,
    /// Stored data was written by a newer schema
    UnsupportedSchema = 9406,
}

impl ErrorCode {
    /// Get the numeric code
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Whether repeating the same call after a fresh read may succeed
    pub const fn is_retryable(&self) -> bool {
        matches!(self, ErrorCode::WriteConflict)
    }

    /// Default English message for this code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderAlreadyCompleted => "Order has already been completed",
            ErrorCode::OrderAlreadyCancelled => "Order has already been cancelled",
            ErrorCode::OrderEmpty => "Order is empty",
            ErrorCode::OrderInvalidTransition => "Order status change is not allowed",

            // Menu
            ErrorCode::DishNotFound => "Dish not found",
            ErrorCode::DishInvalidPrice => "Dish has invalid price",
            ErrorCode::CategoryNotFound => "Category not found",
            ErrorCode::CategoryHasDishes => "Cannot delete a category that still has dishes",

            // Settings
            ErrorCode::CartSettingsNotFound => "Cart settings not found",
            ErrorCode::DeliveryZoneNotFound => "Delivery zone not found",

            // System
            ErrorCode::DatabaseError => "Database error",

            // Storage
            ErrorCode::StorageFull => "Storage full (disk space insufficient)",
            ErrorCode::StorageCorrupted => "Storage corrupted (data file damaged)",
            ErrorCode::WriteConflict => "Data was changed in another window, please retry",
            ErrorCode::UnsupportedSchema => "Stored data was written by a newer version",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4003 => Ok(ErrorCode::OrderAlreadyCompleted),
            4004 => Ok(ErrorCode::OrderAlreadyCancelled),
            4007 => Ok(ErrorCode::OrderEmpty),
            4008 => Ok(ErrorCode::OrderInvalidTransition),

            // Menu
            6001 => Ok(ErrorCode::DishNotFound),
            6002 => Ok(ErrorCode::DishInvalidPrice),
            6101 => Ok(ErrorCode::CategoryNotFound),
            6102 => Ok(ErrorCode::CategoryHasDishes),

            // Settings
            7001 => Ok(ErrorCode::CartSettingsNotFound),
            7101 => Ok(ErrorCode::DeliveryZoneNotFound),

            // System
            9002 => Ok(ErrorCode::DatabaseError),

            // Storage
            9401 => Ok(ErrorCode::StorageFull),
            9403 => Ok(ErrorCode::StorageCorrupted),
            9405 => Ok(ErrorCode::WriteConflict),
            9406 => Ok(ErrorCode::UnsupportedSchema),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::OrderInvalidTransition.code(), 4008);
        assert_eq!(ErrorCode::CategoryHasDishes.code(), 6102);
        assert_eq!(ErrorCode::WriteConflict.code(), 9405);
    }

    #[test]
    fn test_try_from_u16() {
        assert_eq!(ErrorCode::try_from(6102), Ok(ErrorCode::CategoryHasDishes));
        assert_eq!(ErrorCode::try_from(9405), Ok(ErrorCode::WriteConflict));
        assert_eq!(ErrorCode::try_from(4242), Err(InvalidErrorCode(4242)));
    }

    #[test]
    fn test_serde_as_number() {
        let json = serde_json::to_string(&ErrorCode::DishNotFound).unwrap();
        assert_eq!(json, "6001");

        let code: ErrorCode = serde_json::from_str("4008").unwrap();
        assert_eq!(code, ErrorCode::OrderInvalidTransition);

        assert!(serde_json::from_str::<ErrorCode>("12345").is_err());
    }

    #[test]
    fn test_retryable() {
        assert!(ErrorCode::WriteConflict.is_retryable());
        assert!(!ErrorCode::ValidationFailed.is_retryable());
    }
}
