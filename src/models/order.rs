use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Restaurant-owned status track. One canonical lowercase wire form;
/// normalization happens here, never at call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Accepted,
    Preparing,
    Ready,
    HandedOver,
    Rejected,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::HandedOver => "handed_over",
            OrderStatus::Rejected => "rejected",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Rejected | OrderStatus::Cancelled)
    }

    /// Statuses at which delivery-partner matching is attempted.
    pub fn is_dispatchable(self) -> bool {
        matches!(
            self,
            OrderStatus::Accepted
                | OrderStatus::Preparing
                | OrderStatus::Ready
                | OrderStatus::HandedOver
        )
    }

    /// Claiming is narrower than dispatch: the kitchen must have the food
    /// ready (or already handed over) before a partner can bind.
    pub fn is_claimable(self) -> bool {
        matches!(self, OrderStatus::Ready | OrderStatus::HandedOver)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Partner-owned status track, advanced independently of the restaurant
/// track once a partner binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Unassigned,
    Assigned,
    ReachedRestaurant,
    PickedUp,
    Delivered,
}

impl DeliveryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryStatus::Unassigned => "unassigned",
            DeliveryStatus::Assigned => "assigned",
            DeliveryStatus::ReachedRestaurant => "reached_restaurant",
            DeliveryStatus::PickedUp => "picked_up",
            DeliveryStatus::Delivered => "delivered",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    pub status: OrderStatus,
    pub delivery_status: DeliveryStatus,
    pub restaurant_id: u64,
    pub owner_id: u64,
    pub customer_id: u64,
    pub delivery_partner_id: Option<u64>,
    pub reject_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub ready_at: Option<DateTime<Utc>>,
    pub handed_over_at: Option<DateTime<Utc>>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub reached_restaurant_at: Option<DateTime<Utc>>,
    pub picked_up_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub released_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn new(id: u64, restaurant_id: u64, owner_id: u64, customer_id: u64) -> Self {
        Self {
            id,
            status: OrderStatus::Pending,
            delivery_status: DeliveryStatus::Unassigned,
            restaurant_id,
            owner_id,
            customer_id,
            delivery_partner_id: None,
            reject_reason: None,
            created_at: Utc::now(),
            accepted_at: None,
            ready_at: None,
            handed_over_at: None,
            assigned_at: None,
            reached_restaurant_at: None,
            picked_up_at: None,
            delivered_at: None,
            released_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal() || self.delivery_status == DeliveryStatus::Delivered
    }

    /// Jointly observed status: the restaurant track until a partner binds,
    /// the partner track afterwards.
    pub fn observed_status(&self) -> &'static str {
        if self.delivery_status == DeliveryStatus::Unassigned {
            self.status.as_str()
        } else {
            self.delivery_status.as_str()
        }
    }

    /// Combined label used in transition-rejection errors.
    pub fn state_label(&self) -> String {
        format!("{}/{}", self.status, self.delivery_status)
    }
}
