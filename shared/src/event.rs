//! Store events
//!
//! Every successful repository mutation produces one [`StoreEvent`]. On the
//! wire it is wrapped in an [`EventEnvelope`] and reads
//! `{"type": "...", "data": {...}, "timestamp": "..."}`.

use crate::models::{CartSettings, Category, Dish, Order, RestaurantSettings};
use crate::order::OrderStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Event type names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    CategoryUpdated,
    DishCreated,
    DishUpdated,
    DishDeleted,
    OrderCreated,
    OrderUpdated,
    CartSettingsUpdated,
    RestaurantUpdated,
}

impl EventType {
    pub const ALL: [EventType; 8] = [
        EventType::CategoryUpdated,
        EventType::DishCreated,
        EventType::DishUpdated,
        EventType::DishDeleted,
        EventType::OrderCreated,
        EventType::OrderUpdated,
        EventType::CartSettingsUpdated,
        EventType::RestaurantUpdated,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            EventType::CategoryUpdated => "category_updated",
            EventType::DishCreated => "dish_created",
            EventType::DishUpdated => "dish_updated",
            EventType::DishDeleted => "dish_deleted",
            EventType::OrderCreated => "order_created",
            EventType::OrderUpdated => "order_updated",
            EventType::CartSettingsUpdated => "cart_settings_updated",
            EventType::RestaurantUpdated => "restaurant_updated",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to the category collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CategoryChange {
    Created { category: Category },
    Updated { category: Category },
    Deleted { id: String },
    /// Sort order reassigned; ids in their new order
    Reordered { ids: Vec<String> },
}

/// What happened to an existing order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum OrderChange {
    StatusChanged { order: Order, from: OrderStatus },
    Deleted { id: String },
}

/// Repository mutation notice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum StoreEvent {
    CategoryUpdated(CategoryChange),
    DishCreated(Dish),
    DishUpdated(Dish),
    DishDeleted { id: String },
    OrderCreated(Order),
    OrderUpdated(OrderChange),
    CartSettingsUpdated(CartSettings),
    RestaurantUpdated(RestaurantSettings),
}

impl StoreEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            StoreEvent::CategoryUpdated(_) => EventType::CategoryUpdated,
            StoreEvent::DishCreated(_) => EventType::DishCreated,
            StoreEvent::DishUpdated(_) => EventType::DishUpdated,
            StoreEvent::DishDeleted { .. } => EventType::DishDeleted,
            StoreEvent::OrderCreated(_) => EventType::OrderCreated,
            StoreEvent::OrderUpdated(_) => EventType::OrderUpdated,
            StoreEvent::CartSettingsUpdated(_) => EventType::CartSettingsUpdated,
            StoreEvent::RestaurantUpdated(_) => EventType::RestaurantUpdated,
        }
    }
}

/// Emitted event with its emission time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    #[serde(flatten)]
    pub event: StoreEvent,
    /// ISO-8601 UTC
    pub timestamp: String,
}

impl EventEnvelope {
    pub fn new(event: StoreEvent) -> Self {
        Self {
            event,
            timestamp: crate::util::now_iso(),
        }
    }

    pub fn event_type(&self) -> EventType {
        self.event.event_type()
    }
}
