//! Cart Settings Model
//!
//! One record per restaurant: delivery zones, minimum amounts, opening
//! schedule and checkout switches.

use super::common::{
    FieldError, LocalizedText, MinuteSpan, ProcessingTime, WorkingHours, require_amount,
    require_patch_amount, require_text,
};
use chrono::{Datelike, Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Delivery zone with its own price and minimum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryZone {
    pub id: String,
    pub name: LocalizedText,
    pub price: f64,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Overrides the cart-wide minimum when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_order_amount: Option<f64>,
    #[serde(default)]
    pub estimated_time: MinuteSpan,
    pub created_at: String,
    pub updated_at: String,
}

impl DeliveryZone {
    pub fn validate(&self, index: usize) -> Result<(), FieldError> {
        let field = |name: &str| format!("deliveryZones[{index}].{name}");
        self.name.require_complete(&field("name"))?;
        require_amount(self.price, &field("price"))?;
        if let Some(min) = self.min_order_amount {
            require_amount(min, &field("minOrderAmount"))?;
        }
        if self.estimated_time.from > self.estimated_time.to {
            return Err(FieldError::new(
                field("estimatedTime"),
                "from must not exceed to",
            ));
        }
        Ok(())
    }
}

/// Checkout switches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutOptions {
    #[serde(default)]
    pub allow_scheduled_orders: bool,
    #[serde(default = "default_true")]
    pub require_phone: bool,
    #[serde(default)]
    pub require_address: bool,
    #[serde(default)]
    pub auto_confirm_orders: bool,
}

impl Default for CheckoutOptions {
    fn default() -> Self {
        Self {
            allow_scheduled_orders: false,
            require_phone: true,
            require_address: false,
            auto_confirm_orders: false,
        }
    }
}

/// Cart settings entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSettings {
    pub restaurant_id: String,
    #[serde(default)]
    pub delivery_zones: Vec<DeliveryZone>,
    #[serde(default)]
    pub min_order_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_delivery_amount: Option<f64>,
    pub currency: String,
    #[serde(default)]
    pub working_hours: WorkingHours,
    /// Weekdays, 0 = Sunday
    #[serde(default = "all_week")]
    pub working_days: Vec<u8>,
    #[serde(default = "default_true")]
    pub is_delivery_enabled: bool,
    #[serde(default = "default_true")]
    pub is_takeaway_enabled: bool,
    #[serde(default)]
    pub order_processing_time: ProcessingTime,
    #[serde(default)]
    pub settings: CheckoutOptions,
    pub created_at: String,
    pub updated_at: String,
}

fn default_true() -> bool {
    true
}

fn all_week() -> Vec<u8> {
    (0..=6).collect()
}

/// Checkout rule violation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CartRuleError {
    #[error("delivery is disabled")]
    DeliveryDisabled,

    #[error("delivery zone not found: {0}")]
    ZoneNotFound(String),

    #[error("delivery zone is inactive: {0}")]
    ZoneInactive(String),

    #[error("minimum order amount is {required}, got {actual}")]
    BelowMinimum { required: f64, actual: f64 },
}

impl CartSettings {
    /// Default record for a restaurant that has never been configured
    pub fn default_for(restaurant_id: &str, now: &str) -> Self {
        Self {
            restaurant_id: restaurant_id.to_string(),
            delivery_zones: Vec::new(),
            min_order_amount: 0.0,
            free_delivery_amount: None,
            currency: "USD".to_string(),
            working_hours: WorkingHours::default(),
            working_days: all_week(),
            is_delivery_enabled: true,
            is_takeaway_enabled: true,
            order_processing_time: ProcessingTime { min: 30, max: 60 },
            settings: CheckoutOptions::default(),
            created_at: now.to_string(),
            updated_at: now.to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        require_text(&self.restaurant_id, "restaurantId")?;
        require_text(&self.currency, "currency")?;
        require_amount(self.min_order_amount, "minOrderAmount")?;
        if let Some(free) = self.free_delivery_amount {
            require_amount(free, "freeDeliveryAmount")?;
        }
        self.working_hours.validate("workingHours")?;
        if let Some(day) = self.working_days.iter().find(|d| **d > 6) {
            return Err(FieldError::new(
                "workingDays",
                format!("weekday must be 0-6, got {day}"),
            ));
        }
        if self.order_processing_time.min > self.order_processing_time.max {
            return Err(FieldError::new(
                "orderProcessingTime",
                "min must not exceed max",
            ));
        }
        for (index, zone) in self.delivery_zones.iter().enumerate() {
            zone.validate(index)?;
        }
        Ok(())
    }

    pub fn zone(&self, zone_id: &str) -> Option<&DeliveryZone> {
        self.delivery_zones.iter().find(|z| z.id == zone_id)
    }

    pub fn active_zones(&self) -> impl Iterator<Item = &DeliveryZone> {
        self.delivery_zones.iter().filter(|z| z.is_active)
    }

    /// Whether orders are accepted at the given local time
    ///
    /// For windows past midnight the early-morning part belongs to the
    /// previous day's shift.
    pub fn is_open_at(&self, at: NaiveDateTime) -> bool {
        let time = at.time();
        if !self.working_hours.contains(time) {
            return false;
        }
        let shift_day = match self.working_hours.parse() {
            Some((from, to)) if from > to && time < to => at.date() - Duration::days(1),
            _ => at.date(),
        };
        let weekday = shift_day.weekday().num_days_from_sunday() as u8;
        self.working_days.contains(&weekday)
    }

    fn active_zone(&self, zone_id: &str) -> Result<&DeliveryZone, CartRuleError> {
        let zone = self
            .zone(zone_id)
            .ok_or_else(|| CartRuleError::ZoneNotFound(zone_id.to_string()))?;
        if !zone.is_active {
            return Err(CartRuleError::ZoneInactive(zone_id.to_string()));
        }
        Ok(zone)
    }

    /// Delivery price for a zone; free once `subtotal` reaches `freeDeliveryAmount`
    pub fn delivery_fee(&self, zone_id: &str, subtotal: f64) -> Result<f64, CartRuleError> {
        if !self.is_delivery_enabled {
            return Err(CartRuleError::DeliveryDisabled);
        }
        let zone = self.active_zone(zone_id)?;
        match self.free_delivery_amount {
            Some(free) if subtotal >= free => Ok(0.0),
            _ => Ok(zone.price),
        }
    }

    /// Check the order minimum; a zone minimum overrides the cart-wide one
    pub fn check_minimum(&self, zone_id: Option<&str>, subtotal: f64) -> Result<(), CartRuleError> {
        let required = match zone_id {
            Some(id) => self
                .active_zone(id)?
                .min_order_amount
                .unwrap_or(self.min_order_amount),
            None => self.min_order_amount,
        };
        if subtotal < required {
            return Err(CartRuleError::BelowMinimum {
                required,
                actual: subtotal,
            });
        }
        Ok(())
    }
}

/// Partial checkout switches
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutOptionsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_scheduled_orders: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_phone: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_address: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_confirm_orders: Option<bool>,
}

/// Update cart settings payload
///
/// Zones are edited through the zone operations, not here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSettingsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_order_amount: Option<f64>,
    /// `Some(None)` clears the threshold
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_delivery_amount: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_hours: Option<WorkingHours>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_days: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_delivery_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_takeaway_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_processing_time: Option<ProcessingTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<CheckoutOptionsUpdate>,
}

impl CartSettingsUpdate {
    pub fn validate(&self) -> Result<(), FieldError> {
        require_patch_amount(self.min_order_amount, "minOrderAmount")?;
        require_patch_amount(self.free_delivery_amount.flatten(), "freeDeliveryAmount")
    }
}

/// Create delivery zone payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryZoneCreate {
    pub id: Option<String>,
    pub name: LocalizedText,
    pub price: f64,
    pub is_active: Option<bool>,
    pub min_order_amount: Option<f64>,
    #[serde(default)]
    pub estimated_time: MinuteSpan,
}

/// Update delivery zone payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryZoneUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<LocalizedText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_order_amount: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<MinuteSpan>,
}

impl DeliveryZoneUpdate {
    pub fn validate(&self) -> Result<(), FieldError> {
        require_patch_amount(self.price, "deliveryZone.price")?;
        require_patch_amount(self.min_order_amount.flatten(), "deliveryZone.minOrderAmount")
    }
}
