//! Value types shared by several entities

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bilingual text: every user-visible name carries both locales
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub primary: String,
    #[serde(default)]
    pub secondary: String,
}

impl LocalizedText {
    pub fn new(primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            secondary: secondary.into(),
        }
    }

    /// Both locales present (non-blank)
    pub fn is_complete(&self) -> bool {
        !self.primary.trim().is_empty() && !self.secondary.trim().is_empty()
    }

    /// Case-insensitive substring match on either locale
    pub fn matches(&self, needle_lower: &str) -> bool {
        self.primary.to_lowercase().contains(needle_lower)
            || self.secondary.to_lowercase().contains(needle_lower)
    }

    /// Require both locales, naming the first missing one as `<field>.primary`
    /// or `<field>.secondary`
    pub fn require_complete(&self, field: &str) -> Result<(), FieldError> {
        if self.primary.trim().is_empty() {
            return Err(FieldError::new(
                format!("{field}.primary"),
                "primary name is required",
            ));
        }
        if self.secondary.trim().is_empty() {
            return Err(FieldError::new(
                format!("{field}.secondary"),
                "secondary name is required",
            ));
        }
        Ok(())
    }
}

/// Opening hours as `"HH:MM"` strings
///
/// `to` earlier than `from` means the window runs past midnight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHours {
    pub from: String,
    pub to: String,
}

impl WorkingHours {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn parse(&self) -> Option<(NaiveTime, NaiveTime)> {
        let from = NaiveTime::parse_from_str(&self.from, "%H:%M").ok()?;
        let to = NaiveTime::parse_from_str(&self.to, "%H:%M").ok()?;
        Some((from, to))
    }

    /// Whether `time` falls inside the window (end exclusive)
    pub fn contains(&self, time: NaiveTime) -> bool {
        match self.parse() {
            Some((from, to)) if from <= to => time >= from && time < to,
            Some((from, to)) => time >= from || time < to,
            None => false,
        }
    }

    pub fn validate(&self, field: &str) -> Result<(), FieldError> {
        if self.parse().is_none() {
            return Err(FieldError::new(
                field,
                format!("expected HH:MM times, got {}-{}", self.from, self.to),
            ));
        }
        Ok(())
    }
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self::new("10:00", "22:00")
    }
}

/// Minute span shown to customers (`estimatedTime` of a delivery zone)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinuteSpan {
    pub from: u32,
    pub to: u32,
}

/// Kitchen processing estimate in minutes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingTime {
    pub min: u32,
    pub max: u32,
}

/// A single invalid input field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for FieldError {}

/// Largest accepted monetary amount
pub const MAX_AMOUNT: f64 = 1_000_000_000_000.0;

/// Validate a monetary amount: finite, non-negative, at most [`MAX_AMOUNT`]
pub fn require_amount(value: f64, field: &str) -> Result<(), FieldError> {
    if !value.is_finite() {
        return Err(FieldError::new(
            field,
            format!("must be a finite number, got {}", value),
        ));
    }
    if value < 0.0 {
        return Err(FieldError::new(
            field,
            format!("must be non-negative, got {}", value),
        ));
    }
    if value > MAX_AMOUNT {
        return Err(FieldError::new(
            field,
            format!("must not exceed {}, got {}", MAX_AMOUNT, value),
        ));
    }
    Ok(())
}

/// [`require_amount`] for a patch field that may be unset
pub fn require_patch_amount(value: Option<f64>, field: &str) -> Result<(), FieldError> {
    match value {
        Some(value) => require_amount(value, field),
        None => Ok(()),
    }
}

/// Validate a required free-text field
pub fn require_text(value: &str, field: &str) -> Result<(), FieldError> {
    if value.trim().is_empty() {
        return Err(FieldError::new(field, "is required"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_localized_text_complete() {
        assert!(LocalizedText::new("Pizza", "Пицца").is_complete());
        assert!(!LocalizedText::new("Pizza", " ").is_complete());

        let err = LocalizedText::new("Pizza", "")
            .require_complete("name")
            .unwrap_err();
        assert_eq!(err.field, "name.secondary");
    }

    #[test]
    fn test_working_hours_contains() {
        let day = WorkingHours::new("10:00", "22:00");
        assert!(day.contains(NaiveTime::from_hms_opt(10, 0, 0).unwrap()));
        assert!(!day.contains(NaiveTime::from_hms_opt(22, 0, 0).unwrap()));

        let night = WorkingHours::new("18:00", "02:00");
        assert!(night.contains(NaiveTime::from_hms_opt(23, 30, 0).unwrap()));
        assert!(night.contains(NaiveTime::from_hms_opt(1, 0, 0).unwrap()));
        assert!(!night.contains(NaiveTime::from_hms_opt(12, 0, 0).unwrap()));
    }

    #[test]
    fn test_working_hours_invalid() {
        let bad = WorkingHours::new("10am", "22:00");
        assert!(bad.validate("workingHours").is_err());
        assert!(!bad.contains(NaiveTime::from_hms_opt(12, 0, 0).unwrap()));
    }

    #[test]
    fn test_require_amount() {
        assert!(require_amount(0.0, "price").is_ok());
        assert!(require_amount(-0.5, "price").is_err());
        assert!(require_amount(f64::NAN, "price").is_err());
        assert!(require_amount(f64::INFINITY, "price").is_err());
        assert!(require_amount(MAX_AMOUNT, "price").is_ok());
        assert!(require_amount(1e30, "price").is_err());
        assert!(require_patch_amount(None, "price").is_ok());
        assert!(require_patch_amount(Some(f64::NAN), "price").is_err());
    }
}
