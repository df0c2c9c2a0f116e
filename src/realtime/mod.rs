use serde::{Deserialize, Serialize};

use crate::models::order::Order;
use crate::state::AppState;

pub const GLOBAL_ADMIN_ROOM: &str = "global_admin";
pub const AVAILABLE_PARTNERS_ROOM: &str = "available_delivery_partners";

pub fn restaurant_room(id: u64) -> String {
    format!("restaurant_{id}")
}

pub fn customer_room(id: u64) -> String {
    format!("customer_{id}")
}

pub fn partner_room(id: u64) -> String {
    format!("delivery_partner_{id}")
}

/// Order as carried on realtime frames: the full record plus the jointly
/// observed status so clients don't re-derive track precedence.
#[derive(Debug, Clone, Serialize)]
pub struct OrderPayload {
    #[serde(flatten)]
    order: Order,
    observed_status: &'static str,
}

impl From<&Order> for OrderPayload {
    fn from(order: &Order) -> Self {
        Self {
            observed_status: order.observed_status(),
            order: order.clone(),
        }
    }
}

/// Server-initiated realtime frames.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerEvent {
    RoomJoined { room: String },
    NewOrder { order: OrderPayload },
    OrderUpdate { order: OrderPayload },
    NewAvailableOrder { order: OrderPayload },
}

/// Client-initiated realtime frames: explicit join/leave room management.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientMessage {
    Join { room: String },
    Leave { room: String },
}

/// One event addressed to one room. All room traffic flows through a single
/// broadcast channel and each connection filters by its joined rooms; that
/// channel is the seam where a shared external bus would slot in when
/// connections span multiple processes.
#[derive(Debug, Clone)]
pub struct RoomEnvelope {
    pub room: String,
    pub event: ServerEvent,
}

fn send(state: &AppState, room: String, event: ServerEvent) {
    // Err means no connected subscribers; nothing to do.
    let _ = state.room_events_tx.send(RoomEnvelope { room, event });
}

/// Emits the updated order to every party's room plus the monitoring room.
pub fn emit_order_update(state: &AppState, order: &Order, is_new: bool) {
    let payload = OrderPayload::from(order);
    let event = |payload: OrderPayload| {
        if is_new {
            ServerEvent::NewOrder { order: payload }
        } else {
            ServerEvent::OrderUpdate { order: payload }
        }
    };

    send(state, restaurant_room(order.restaurant_id), event(payload.clone()));
    send(state, customer_room(order.customer_id), event(payload.clone()));
    if let Some(partner_id) = order.delivery_partner_id {
        send(state, partner_room(partner_id), event(payload.clone()));
    }
    send(state, GLOBAL_ADMIN_ROOM.to_string(), event(payload));

    tracing::debug!(order_id = order.id, "emitted realtime order update");
}

/// Tells every partner watching the available pool about an unclaimed order.
pub fn emit_new_available_order(state: &AppState, order: &Order) {
    send(
        state,
        AVAILABLE_PARTNERS_ROOM.to_string(),
        ServerEvent::NewAvailableOrder {
            order: OrderPayload::from(order),
        },
    );
}
