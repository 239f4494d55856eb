//! Restaurant Settings Model

use super::common::{FieldError, LocalizedText, WorkingHours, require_text};
use super::image_ref::AssetRef;
use serde::{Deserialize, Serialize};

/// Restaurant profile (singleton)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantSettings {
    pub restaurant_id: String,
    pub name: LocalizedText,
    #[serde(default)]
    pub logo: AssetRef,
    /// Display order is preserved; at least one entry
    pub phones: Vec<String>,
    #[serde(default)]
    pub working_hours: WorkingHours,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,
    pub currency: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

fn default_true() -> bool {
    true
}

impl RestaurantSettings {
    pub fn default_for(restaurant_id: &str, now: &str) -> Self {
        Self {
            restaurant_id: restaurant_id.to_string(),
            name: LocalizedText::new("My Restaurant", "Мой ресторан"),
            logo: AssetRef::default(),
            phones: vec!["+10000000000".to_string()],
            working_hours: WorkingHours::default(),
            address: None,
            description: None,
            currency: "USD".to_string(),
            is_active: true,
            created_at: now.to_string(),
            updated_at: now.to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        require_text(&self.restaurant_id, "restaurantId")?;
        self.name.require_complete("name")?;
        if self.phones.is_empty() {
            return Err(FieldError::new("phones", "at least one phone is required"));
        }
        for (index, phone) in self.phones.iter().enumerate() {
            require_text(phone, &format!("phones[{index}]"))?;
        }
        self.working_hours.validate("workingHours")?;
        require_text(&self.currency, "currency")?;
        Ok(())
    }

    /// First listed phone
    pub fn primary_phone(&self) -> Option<&str> {
        self.phones.first().map(String::as_str)
    }
}

/// Update restaurant settings payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantSettingsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<LocalizedText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<AssetRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phones: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_hours: Option<WorkingHours>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<LocalizedText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}
