//! Dish Model

use super::common::{FieldError, LocalizedText, require_amount, require_patch_amount, require_text};
use super::image_ref::AssetRef;
use serde::{Deserialize, Serialize};

/// Dish entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dish {
    pub id: String,
    pub name: LocalizedText,
    #[serde(default)]
    pub description: LocalizedText,
    pub price: f64,
    #[serde(default)]
    pub image: AssetRef,
    /// Category reference (must exist)
    pub category_id: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[serde(default)]
    pub is_popular: bool,
    /// Minutes
    #[serde(default)]
    pub preparation_time: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<u32>,
    /// Grams
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
    #[serde(default)]
    pub sort_order: i32,
    pub created_at: String,
    pub updated_at: String,
}

fn default_true() -> bool {
    true
}

impl Dish {
    /// Field-level checks; the category reference is checked by the repository
    pub fn validate(&self) -> Result<(), FieldError> {
        self.name.require_complete("name")?;
        require_amount(self.price, "price")?;
        require_text(&self.category_id, "categoryId")?;
        Ok(())
    }

    /// Orderable right now (category activity is checked by the caller)
    pub fn is_orderable(&self) -> bool {
        self.is_active && self.is_available
    }
}

/// Create dish payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DishCreate {
    pub id: Option<String>,
    pub name: LocalizedText,
    #[serde(default)]
    pub description: LocalizedText,
    pub price: f64,
    pub image: Option<AssetRef>,
    pub category_id: String,
    pub is_active: Option<bool>,
    pub is_available: Option<bool>,
    pub is_popular: Option<bool>,
    pub preparation_time: Option<u32>,
    pub calories: Option<u32>,
    pub weight: Option<u32>,
    pub sort_order: Option<i32>,
}

/// Update dish payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DishUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<LocalizedText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<AssetRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_popular: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preparation_time: Option<u32>,
    /// `Some(None)` clears the value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<Option<u32>>,
    /// `Some(None)` clears the value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
}

impl DishUpdate {
    /// Checks that must run before merging; a non-finite number would not survive JSON
    pub fn validate(&self) -> Result<(), FieldError> {
        require_patch_amount(self.price, "price")
    }
}
