//! Contact Model
//!
//! Never stored: rebuilt from the order collection on every read.

use serde::{Deserialize, Serialize};

/// Customer roll-up keyed by phone number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub phone: String,
    /// Name from the newest order
    pub name: String,
    /// Newest non-empty address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub total_orders: u32,
    /// Sum over all orders, whatever their status
    pub total_amount: f64,
    pub first_order_date: String,
    pub last_order_date: String,
}
