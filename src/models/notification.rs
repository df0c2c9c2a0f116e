use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::recipient::Recipient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    OrderUpdate,
    NewOrder,
    NewAvailableOrder,
    OrderReleased,
}

impl NotificationType {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationType::OrderUpdate => "order_update",
            NotificationType::NewOrder => "new_order",
            NotificationType::NewAvailableOrder => "new_available_order",
            NotificationType::OrderReleased => "order_released",
        }
    }
}

/// Durable record of one delivered event, one row per recipient.
/// Append-only; push and realtime delivery never mutate it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    #[serde(flatten)]
    pub recipient: Recipient,
    pub title: String,
    pub message: String,
    pub notification_type: NotificationType,
    pub order_id: u64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
