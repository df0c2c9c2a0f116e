//! Order status state machine. Every operation is an id-scoped atomic
//! read-modify-write: the mutation happens while holding the order's map
//! entry lock, which serializes all writers of that order id. Re-applying
//! an already-applied transition fails with `TransitionRejected` instead of
//! silently no-opping, so duplicate requests never double-fire fanout.

use chrono::Utc;

use crate::error::AppError;
use crate::models::order::{DeliveryStatus, Order, OrderStatus};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestaurantAction {
    Accept,
    Reject,
    Preparing,
    Ready,
    Handover,
}

impl RestaurantAction {
    /// Wire label of the status this action moves the order into.
    pub fn status_label(self) -> &'static str {
        match self {
            RestaurantAction::Accept => "accepted",
            RestaurantAction::Reject => "rejected",
            RestaurantAction::Preparing => "preparing",
            RestaurantAction::Ready => "ready",
            RestaurantAction::Handover => "handed_over",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartnerAction {
    Reached,
    PickedUp,
    Complete,
    Release,
}

impl PartnerAction {
    pub fn status_label(self) -> &'static str {
        match self {
            PartnerAction::Reached => "reached_restaurant",
            PartnerAction::PickedUp => "picked_up",
            PartnerAction::Complete => "delivered",
            PartnerAction::Release => "released",
        }
    }
}

/// Order placement (external collaborator surface): every order starts
/// `pending`/`unassigned`.
pub fn place_order(state: &AppState, restaurant_id: u64, owner_id: u64, customer_id: u64) -> Order {
    let order = Order::new(state.next_order_id(), restaurant_id, owner_id, customer_id);
    state.orders.insert(order.id, order.clone());
    order
}

pub fn apply_restaurant_action(
    state: &AppState,
    restaurant_id: u64,
    order_id: u64,
    action: RestaurantAction,
    reason: Option<String>,
) -> Result<Order, AppError> {
    let mut entry = state
        .orders
        .get_mut(&order_id)
        .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;
    let order = entry.value_mut();

    if order.restaurant_id != restaurant_id {
        return Err(AppError::Forbidden(format!(
            "order {order_id} does not belong to restaurant {restaurant_id}"
        )));
    }

    let now = Utc::now();
    match (action, order.status) {
        (RestaurantAction::Accept, OrderStatus::Pending) => {
            order.status = OrderStatus::Accepted;
            order.accepted_at = Some(now);
        }
        (RestaurantAction::Reject, OrderStatus::Pending) => {
            let reason = reason
                .filter(|r| !r.trim().is_empty())
                .ok_or_else(|| AppError::BadRequest("rejection requires a reason".to_string()))?;
            order.status = OrderStatus::Rejected;
            order.reject_reason = Some(reason);
        }
        (RestaurantAction::Preparing, OrderStatus::Accepted) => {
            order.status = OrderStatus::Preparing;
        }
        (RestaurantAction::Ready, OrderStatus::Preparing) => {
            order.status = OrderStatus::Ready;
            order.ready_at = Some(now);
        }
        (RestaurantAction::Handover, OrderStatus::Ready) => {
            order.status = OrderStatus::HandedOver;
            order.handed_over_at = Some(now);
        }
        _ => {
            return Err(AppError::TransitionRejected {
                current: order.state_label(),
                requested: action.status_label(),
            });
        }
    }

    Ok(order.clone())
}

/// Customer-initiated cancellation, only before the kitchen starts cooking.
pub fn cancel_order(state: &AppState, customer_id: u64, order_id: u64) -> Result<Order, AppError> {
    let mut entry = state
        .orders
        .get_mut(&order_id)
        .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;
    let order = entry.value_mut();

    if order.customer_id != customer_id {
        return Err(AppError::Forbidden(format!(
            "order {order_id} does not belong to customer {customer_id}"
        )));
    }

    match order.status {
        OrderStatus::Pending | OrderStatus::Accepted => {
            order.status = OrderStatus::Cancelled;
            Ok(order.clone())
        }
        _ => Err(AppError::TransitionRejected {
            current: order.state_label(),
            requested: "cancelled",
        }),
    }
}

/// Binds a delivery partner to an unclaimed order. This is the one
/// contended transition: the conditional write runs under the order's entry
/// lock, so of N concurrent claims exactly one observes an unbound order
/// and wins; every other claimer gets `AssignmentConflict`.
pub fn claim_order(state: &AppState, partner_id: u64, order_id: u64) -> Result<Order, AppError> {
    if !state.partners.contains_key(&partner_id) {
        return Err(AppError::NotFound(format!(
            "delivery partner {partner_id} not found"
        )));
    }

    let mut entry = state
        .orders
        .get_mut(&order_id)
        .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;
    let order = entry.value_mut();

    if order.delivery_partner_id.is_some() {
        return Err(AppError::AssignmentConflict);
    }
    if !order.status.is_claimable() {
        return Err(AppError::TransitionRejected {
            current: order.state_label(),
            requested: "assigned",
        });
    }

    order.delivery_partner_id = Some(partner_id);
    order.delivery_status = DeliveryStatus::Assigned;
    order.assigned_at = Some(Utc::now());

    Ok(order.clone())
}

pub fn apply_partner_action(
    state: &AppState,
    partner_id: u64,
    order_id: u64,
    action: PartnerAction,
) -> Result<Order, AppError> {
    let mut entry = state
        .orders
        .get_mut(&order_id)
        .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;
    let order = entry.value_mut();

    if order.delivery_partner_id != Some(partner_id) {
        return Err(AppError::Forbidden(format!(
            "order {order_id} is not assigned to delivery partner {partner_id}"
        )));
    }

    let now = Utc::now();
    match (action, order.delivery_status) {
        (PartnerAction::Reached, DeliveryStatus::Assigned) => {
            order.delivery_status = DeliveryStatus::ReachedRestaurant;
            order.reached_restaurant_at = Some(now);
        }
        (PartnerAction::PickedUp, DeliveryStatus::ReachedRestaurant) => {
            order.delivery_status = DeliveryStatus::PickedUp;
            order.picked_up_at = Some(now);
        }
        (PartnerAction::Complete, DeliveryStatus::PickedUp) => {
            order.delivery_status = DeliveryStatus::Delivered;
            order.delivered_at = Some(now);
        }
        // Unassignment: the only path that clears the binding. Once the
        // food is picked up the partner carries it and release no longer
        // makes sense.
        (
            PartnerAction::Release,
            DeliveryStatus::Assigned | DeliveryStatus::ReachedRestaurant,
        ) => {
            order.delivery_partner_id = None;
            order.delivery_status = DeliveryStatus::Unassigned;
            order.released_at = Some(now);
        }
        _ => {
            return Err(AppError::TransitionRejected {
                current: order.state_label(),
                requested: action.status_label(),
            });
        }
    }

    Ok(order.clone())
}
