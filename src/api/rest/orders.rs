use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use serde::Deserialize;

use crate::engine::fanout::FanoutJob;
use crate::engine::matcher;
use crate::engine::transition::{self, PartnerAction, RestaurantAction};
use crate::error::AppError;
use crate::models::order::{Order, OrderStatus};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", post(place_order))
        .route("/orders/:id", get(get_order))
        .route("/restaurants/:restaurant_id/orders", get(restaurant_orders))
        .route(
            "/restaurants/:restaurant_id/orders/:id/accept",
            post(accept_order),
        )
        .route(
            "/restaurants/:restaurant_id/orders/:id/reject",
            post(reject_order),
        )
        .route(
            "/restaurants/:restaurant_id/orders/:id/preparing",
            post(start_preparing),
        )
        .route(
            "/restaurants/:restaurant_id/orders/:id/ready",
            post(mark_ready),
        )
        .route(
            "/restaurants/:restaurant_id/orders/:id/handover",
            post(hand_over),
        )
        .route("/customers/:customer_id/orders/:id/cancel", post(cancel_order))
        .route("/partners/:partner_id/orders/available", get(available_orders))
        .route("/partners/:partner_id/orders/active", get(active_orders))
        .route("/partners/:partner_id/orders/:id/claim", post(claim_order))
        .route(
            "/partners/:partner_id/orders/:id/reached",
            post(reached_restaurant),
        )
        .route(
            "/partners/:partner_id/orders/:id/picked-up",
            post(mark_picked_up),
        )
        .route(
            "/partners/:partner_id/orders/:id/complete",
            post(complete_delivery),
        )
        .route(
            "/partners/:partner_id/orders/:id/release",
            post(release_order),
        )
}

#[derive(Deserialize)]
pub struct PlaceOrderRequest {
    pub restaurant_id: u64,
    pub owner_id: u64,
    pub customer_id: u64,
}

/// Order placement: the narrow surface the (external) checkout flow calls.
async fn place_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PlaceOrderRequest>,
) -> Json<Order> {
    let order = transition::place_order(
        &state,
        payload.restaurant_id,
        payload.owner_id,
        payload.customer_id,
    );
    state.submit_fanout(FanoutJob::new_order(order.clone()));
    Json(order)
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Order>, AppError> {
    let order = state
        .orders
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))?;
    Ok(Json(order.value().clone()))
}

fn restaurant_transition(
    state: &Arc<AppState>,
    restaurant_id: u64,
    order_id: u64,
    action: RestaurantAction,
    reason: Option<String>,
) -> Result<Json<Order>, AppError> {
    let order = transition::apply_restaurant_action(state, restaurant_id, order_id, action, reason)?;
    state.submit_fanout(FanoutJob::status_changed(
        order.clone(),
        action.status_label(),
    ));
    Ok(Json(order))
}

async fn accept_order(
    State(state): State<Arc<AppState>>,
    Path((restaurant_id, id)): Path<(u64, u64)>,
) -> Result<Json<Order>, AppError> {
    restaurant_transition(&state, restaurant_id, id, RestaurantAction::Accept, None)
}

#[derive(Deserialize, Default)]
pub struct RejectRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

async fn reject_order(
    State(state): State<Arc<AppState>>,
    Path((restaurant_id, id)): Path<(u64, u64)>,
    Json(payload): Json<RejectRequest>,
) -> Result<Json<Order>, AppError> {
    restaurant_transition(
        &state,
        restaurant_id,
        id,
        RestaurantAction::Reject,
        payload.reason,
    )
}

async fn start_preparing(
    State(state): State<Arc<AppState>>,
    Path((restaurant_id, id)): Path<(u64, u64)>,
) -> Result<Json<Order>, AppError> {
    restaurant_transition(&state, restaurant_id, id, RestaurantAction::Preparing, None)
}

async fn mark_ready(
    State(state): State<Arc<AppState>>,
    Path((restaurant_id, id)): Path<(u64, u64)>,
) -> Result<Json<Order>, AppError> {
    restaurant_transition(&state, restaurant_id, id, RestaurantAction::Ready, None)
}

async fn hand_over(
    State(state): State<Arc<AppState>>,
    Path((restaurant_id, id)): Path<(u64, u64)>,
) -> Result<Json<Order>, AppError> {
    restaurant_transition(&state, restaurant_id, id, RestaurantAction::Handover, None)
}

async fn cancel_order(
    State(state): State<Arc<AppState>>,
    Path((customer_id, id)): Path<(u64, u64)>,
) -> Result<Json<Order>, AppError> {
    let order = transition::cancel_order(&state, customer_id, id)?;
    state.submit_fanout(FanoutJob::status_changed(order.clone(), "cancelled"));
    Ok(Json(order))
}

/// Claim: the contended transition. The loser of the race gets a conflict
/// and should re-poll the available listing.
async fn claim_order(
    State(state): State<Arc<AppState>>,
    Path((partner_id, id)): Path<(u64, u64)>,
) -> Result<Json<Order>, AppError> {
    match transition::claim_order(&state, partner_id, id) {
        Ok(order) => {
            state.metrics.claims_total.with_label_values(&["won"]).inc();
            state.submit_fanout(FanoutJob::status_changed(order.clone(), "assigned"));
            Ok(Json(order))
        }
        Err(err @ AppError::AssignmentConflict) => {
            state
                .metrics
                .claims_total
                .with_label_values(&["conflict"])
                .inc();
            Err(err)
        }
        Err(err) => {
            state
                .metrics
                .claims_total
                .with_label_values(&["rejected"])
                .inc();
            Err(err)
        }
    }
}

fn partner_transition(
    state: &Arc<AppState>,
    partner_id: u64,
    order_id: u64,
    action: PartnerAction,
) -> Result<Json<Order>, AppError> {
    let order = transition::apply_partner_action(state, partner_id, order_id, action)?;
    let job = if action == PartnerAction::Release {
        FanoutJob::released(order.clone())
    } else {
        FanoutJob::status_changed(order.clone(), action.status_label())
    };
    state.submit_fanout(job);
    Ok(Json(order))
}

async fn reached_restaurant(
    State(state): State<Arc<AppState>>,
    Path((partner_id, id)): Path<(u64, u64)>,
) -> Result<Json<Order>, AppError> {
    partner_transition(&state, partner_id, id, PartnerAction::Reached)
}

async fn mark_picked_up(
    State(state): State<Arc<AppState>>,
    Path((partner_id, id)): Path<(u64, u64)>,
) -> Result<Json<Order>, AppError> {
    partner_transition(&state, partner_id, id, PartnerAction::PickedUp)
}

async fn complete_delivery(
    State(state): State<Arc<AppState>>,
    Path((partner_id, id)): Path<(u64, u64)>,
) -> Result<Json<Order>, AppError> {
    partner_transition(&state, partner_id, id, PartnerAction::Complete)
}

async fn release_order(
    State(state): State<Arc<AppState>>,
    Path((partner_id, id)): Path<(u64, u64)>,
) -> Result<Json<Order>, AppError> {
    partner_transition(&state, partner_id, id, PartnerAction::Release)
}

/// Unclaimed dispatchable orders within the calling partner's geofence.
/// Missing coordinates on either side fail open, matching the dispatch
/// matcher.
async fn available_orders(
    State(state): State<Arc<AppState>>,
    Path(partner_id): Path<u64>,
) -> Result<Json<Vec<Order>>, AppError> {
    let partner = state
        .partners
        .get(&partner_id)
        .ok_or_else(|| AppError::NotFound(format!("delivery partner {partner_id} not found")))?
        .clone();

    let mut orders: Vec<Order> = state
        .orders
        .iter()
        .filter(|entry| {
            entry.delivery_partner_id.is_none() && entry.status.is_dispatchable()
        })
        .filter(|entry| {
            let restaurant = state
                .restaurant_locations
                .get(&entry.restaurant_id)
                .and_then(|location| location.location);
            matcher::within_geofence(
                restaurant.as_ref(),
                partner.location.as_ref(),
                state.geofence_radius_km,
            )
        })
        .map(|entry| entry.value().clone())
        .collect();

    orders.sort_by_key(|order| order.id);
    Ok(Json(orders))
}

/// Orders bound to the calling partner that have not reached a terminal
/// state. Handed-over-but-assigned orders stay here, never back in
/// `available`.
async fn active_orders(
    State(state): State<Arc<AppState>>,
    Path(partner_id): Path<u64>,
) -> Result<Json<Vec<Order>>, AppError> {
    if !state.partners.contains_key(&partner_id) {
        return Err(AppError::NotFound(format!(
            "delivery partner {partner_id} not found"
        )));
    }

    let mut orders: Vec<Order> = state
        .orders
        .iter()
        .filter(|entry| {
            entry.delivery_partner_id == Some(partner_id) && !entry.is_terminal()
        })
        .map(|entry| entry.value().clone())
        .collect();

    orders.sort_by_key(|order| order.id);
    Ok(Json(orders))
}

#[derive(Deserialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum OrderView {
    New,
    Ongoing,
    Completed,
}

#[derive(Deserialize)]
pub struct RestaurantOrdersQuery {
    #[serde(default = "default_view")]
    pub view: OrderView,
}

fn default_view() -> OrderView {
    OrderView::Ongoing
}

async fn restaurant_orders(
    State(state): State<Arc<AppState>>,
    Path(restaurant_id): Path<u64>,
    Query(query): Query<RestaurantOrdersQuery>,
) -> Json<Vec<Order>> {
    let mut orders: Vec<Order> = state
        .orders
        .iter()
        .filter(|entry| entry.restaurant_id == restaurant_id)
        .filter(|entry| match query.view {
            OrderView::New => entry.status == OrderStatus::Pending,
            OrderView::Ongoing => entry.status.is_dispatchable() && !entry.is_terminal(),
            OrderView::Completed => entry.is_terminal(),
        })
        .map(|entry| entry.value().clone())
        .collect();

    orders.sort_by_key(|order| order.id);
    Json(orders)
}
