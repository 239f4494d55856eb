//! Order status state machine
//!
//! ```text
//! new ──▶ confirmed ──▶ preparing ──▶ delivering ──▶ completed
//!  │          │             │              │
//!  └──────────┴─────────────┴──────────────┴───────▶ cancelled
//! ```
//!
//! Forward jumps along the main line are allowed (a takeaway order goes
//! `preparing → completed` without `delivering`). Backward moves are not.
//! `completed` and `cancelled` are terminal.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Order status
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    New,
    Confirmed,
    Preparing,
    Delivering,
    Completed,
    Cancelled,
}

/// Refused status change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("order is already {0}, no further status changes are accepted")]
    Terminal(OrderStatus),

    #[error("cannot move order from {from} to {to}")]
    NotAllowed { from: OrderStatus, to: OrderStatus },
}

impl OrderStatus {
    /// All statuses in lifecycle order
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::New,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Delivering,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    /// Statuses of orders still being worked on
    pub const ACTIVE: [OrderStatus; 4] = [
        OrderStatus::New,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Delivering,
    ];

    /// Statuses of finished orders
    pub const HISTORICAL: [OrderStatus; 2] = [OrderStatus::Completed, OrderStatus::Cancelled];

    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "new",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Delivering => "delivering",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Position on the main line; `None` for `cancelled`
    const fn step(&self) -> Option<u8> {
        match self {
            OrderStatus::New => Some(0),
            OrderStatus::Confirmed => Some(1),
            OrderStatus::Preparing => Some(2),
            OrderStatus::Delivering => Some(3),
            OrderStatus::Completed => Some(4),
            OrderStatus::Cancelled => None,
        }
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    pub const fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Next status on the main line, if any
    pub const fn next(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::New => Some(OrderStatus::Confirmed),
            OrderStatus::Confirmed => Some(OrderStatus::Preparing),
            OrderStatus::Preparing => Some(OrderStatus::Delivering),
            OrderStatus::Delivering => Some(OrderStatus::Completed),
            OrderStatus::Completed | OrderStatus::Cancelled => None,
        }
    }

    /// Check whether `self → to` is a legal transition
    pub fn check_transition(&self, to: OrderStatus) -> Result<(), TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError::Terminal(*self));
        }
        if to == OrderStatus::Cancelled {
            return Ok(());
        }
        match (self.step(), to.step()) {
            (Some(from), Some(target)) if target > from => Ok(()),
            _ => Err(TransitionError::NotAllowed { from: *self, to }),
        }
    }

    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        self.check_transition(to).is_ok()
    }

    /// Every status reachable from `self` in one call
    pub fn allowed_transitions(&self) -> Vec<OrderStatus> {
        Self::ALL
            .into_iter()
            .filter(|to| self.can_transition_to(*to))
            .collect()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown order status: {}", s))
    }
}
