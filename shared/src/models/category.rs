//! Category Model

use super::common::{FieldError, LocalizedText};
use super::image_ref::AssetRef;
use serde::{Deserialize, Serialize};

/// Menu category entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: LocalizedText,
    #[serde(default)]
    pub image: AssetRef,
    /// Visual gradient token used by the storefront theme
    #[serde(default)]
    pub gradient: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,
    /// Display order (ascending)
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

fn default_true() -> bool {
    true
}

impl Category {
    pub fn validate(&self) -> Result<(), FieldError> {
        self.name.require_complete("name")
    }
}

/// Create category payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCreate {
    /// Caller-chosen id (fixtures, seed data); generated when absent
    pub id: Option<String>,
    pub name: LocalizedText,
    pub image: Option<AssetRef>,
    pub gradient: Option<String>,
    pub description: Option<LocalizedText>,
    /// Defaults to one past the current maximum
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

/// Update category payload
///
/// Only fields that are `Some` are merged over the stored record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<LocalizedText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<AssetRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gradient: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_legacy_record_defaults() {
        let json = r#"{
            "id": "c1",
            "name": {"primary": "Pizza", "secondary": "Пицца"},
            "createdAt": "2026-01-01T00:00:00.000Z",
            "updatedAt": "2026-01-01T00:00:00.000Z"
        }"#;
        let category: Category = serde_json::from_str(json).unwrap();
        assert!(category.is_active);
        assert_eq!(category.sort_order, 0);
        assert!(category.image.is_empty());
        assert!(category.description.is_none());
    }

    #[test]
    fn test_update_skips_unset_fields() {
        let update = CategoryUpdate {
            sort_order: Some(3),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"sortOrder": 3}));
    }

    #[test]
    fn test_update_ignores_id_in_input() {
        let update: CategoryUpdate =
            serde_json::from_str(r#"{"id": "hijack", "isActive": false}"#).unwrap();
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"isActive": false}));
    }
}
