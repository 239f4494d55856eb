//! Order Model

use super::common::{FieldError, require_amount, require_text};
use crate::order::OrderStatus;
use serde::{Deserialize, Serialize};

/// Order line, frozen at checkout time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub dish_id: String,
    pub dish_name: String,
    #[serde(default)]
    pub dish_name_secondary: String,
    /// Price in currency unit
    pub unit_price: f64,
    pub quantity: u32,
    /// Caller-computed `unit_price * quantity`
    pub line_total: f64,
}

impl OrderItem {
    pub fn validate(&self, index: usize) -> Result<(), FieldError> {
        let field = |name: &str| format!("items[{index}].{name}");
        require_text(&self.dish_id, &field("dishId"))?;
        if self.quantity < 1 {
            return Err(FieldError::new(field("quantity"), "must be at least 1"));
        }
        require_amount(self.unit_price, &field("unitPrice"))?;
        require_amount(self.line_total, &field("lineTotal"))?;
        Ok(())
    }
}

/// Order entity
///
/// Amounts are computed by the checkout UI and stored as given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub customer_name: String,
    pub customer_phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_address: Option<String>,
    pub items: Vec<OrderItem>,
    pub subtotal: f64,
    #[serde(default)]
    pub delivery_fee: f64,
    pub total_amount: f64,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    /// Set once, when the order enters `completed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

impl Order {
    pub fn validate(&self) -> Result<(), FieldError> {
        validate_order_fields(
            &self.customer_name,
            &self.items,
            [
                (self.subtotal, "subtotal"),
                (self.delivery_fee, "deliveryFee"),
                (self.total_amount, "totalAmount"),
            ],
        )
    }

    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Customer address, if one was given and is non-blank
    pub fn address(&self) -> Option<&str> {
        self.customer_address
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }
}

/// Create order payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreate {
    pub id: Option<String>,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: Option<String>,
    pub items: Vec<OrderItem>,
    pub subtotal: f64,
    #[serde(default)]
    pub delivery_fee: f64,
    pub total_amount: f64,
    /// Initial status, `new` when absent
    pub status: Option<OrderStatus>,
    pub notes: Option<String>,
}

impl OrderCreate {
    pub fn validate(&self) -> Result<(), FieldError> {
        validate_order_fields(
            &self.customer_name,
            &self.items,
            [
                (self.subtotal, "subtotal"),
                (self.delivery_fee, "deliveryFee"),
                (self.total_amount, "totalAmount"),
            ],
        )
    }
}

/// Shape checks shared by stored orders and new ones
///
/// The phone is not checked here: whether it is required is a checkout
/// setting (`requirePhone`).
fn validate_order_fields(
    name: &str,
    items: &[OrderItem],
    amounts: [(f64, &str); 3],
) -> Result<(), FieldError> {
    require_text(name, "customerName")?;
    if items.is_empty() {
        return Err(FieldError::new("items", "order must contain at least one item"));
    }
    for (index, item) in items.iter().enumerate() {
        item.validate(index)?;
    }
    for (value, field) in amounts {
        require_amount(value, field)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: u32) -> OrderItem {
        OrderItem {
            dish_id: "d1".to_string(),
            dish_name: "Margherita".to_string(),
            dish_name_secondary: "Маргарита".to_string(),
            unit_price: 10.0,
            quantity,
            line_total: 10.0 * quantity as f64,
        }
    }

    fn create() -> OrderCreate {
        OrderCreate {
            customer_name: "Ann".to_string(),
            customer_phone: "+100".to_string(),
            items: vec![item(2)],
            subtotal: 20.0,
            delivery_fee: 3.0,
            total_amount: 23.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(create().validate().is_ok());
    }

    #[test]
    fn test_validate_requires_items() {
        let mut c = create();
        c.items.clear();
        assert_eq!(c.validate().unwrap_err().field, "items");
    }

    #[test]
    fn test_validate_quantity() {
        let mut c = create();
        c.items.push(item(0));
        assert_eq!(c.validate().unwrap_err().field, "items[1].quantity");
    }

    #[test]
    fn test_validate_leaves_phone_to_checkout() {
        let mut c = create();
        c.customer_phone = "  ".to_string();
        assert!(c.validate().is_ok());
        c.customer_name = String::new();
        assert_eq!(c.validate().unwrap_err().field, "customerName");
    }

    #[test]
    fn test_validate_amounts() {
        let mut c = create();
        c.total_amount = f64::NAN;
        assert_eq!(c.validate().unwrap_err().field, "totalAmount");
        c.total_amount = 1e30;
        assert_eq!(c.validate().unwrap_err().field, "totalAmount");
    }

    #[test]
    fn test_order_layout() {
        let json = serde_json::json!({
            "id": "o1",
            "customerName": "Ann",
            "customerPhone": "+100",
            "items": [{
                "dishId": "d1", "dishName": "Margherita", "dishNameSecondary": "",
                "unitPrice": 10.0, "quantity": 3, "lineTotal": 30.0
            }],
            "subtotal": 30.0,
            "deliveryFee": 0.0,
            "totalAmount": 30.0,
            "status": "preparing",
            "createdAt": "2026-01-01T00:00:00.000Z",
            "updatedAt": "2026-01-01T00:00:00.000Z"
        });
        let order: Order = serde_json::from_value(json).unwrap();
        assert_eq!(order.status, OrderStatus::Preparing);
        assert_eq!(order.item_count(), 3);
        assert_eq!(order.address(), None);
        assert!(order.completed_at.is_none());
    }
}
