use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{patch, post};
use chrono::Utc;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::partner::{DeliveryPartner, GeoPoint};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/partners", post(create_partner).get(list_partners))
        .route("/partners/:partner_id/presence", patch(update_presence))
        .route("/partners/:partner_id/location", patch(update_location))
}

#[derive(Deserialize)]
pub struct CreatePartnerRequest {
    pub name: String,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    pub rating: f64,
}

async fn create_partner(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreatePartnerRequest>,
) -> Result<Json<DeliveryPartner>, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }

    let partner = DeliveryPartner {
        id: state.next_partner_id(),
        name: payload.name,
        is_online: true,
        is_active: true,
        location: payload.location,
        rating: payload.rating.clamp(0.0, 5.0),
        updated_at: Utc::now(),
    };

    state.partners.insert(partner.id, partner.clone());
    Ok(Json(partner))
}

async fn list_partners(State(state): State<Arc<AppState>>) -> Json<Vec<DeliveryPartner>> {
    let mut partners: Vec<DeliveryPartner> = state
        .partners
        .iter()
        .map(|entry| entry.value().clone())
        .collect();
    partners.sort_by_key(|partner| partner.id);
    Json(partners)
}

#[derive(Deserialize)]
pub struct UpdatePresenceRequest {
    pub is_online: bool,
    #[serde(default)]
    pub is_active: Option<bool>,
}

async fn update_presence(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(payload): Json<UpdatePresenceRequest>,
) -> Result<Json<DeliveryPartner>, AppError> {
    let mut partner = state
        .partners
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("delivery partner {id} not found")))?;

    partner.is_online = payload.is_online;
    if let Some(is_active) = payload.is_active {
        partner.is_active = is_active;
    }
    partner.updated_at = Utc::now();

    Ok(Json(partner.clone()))
}

#[derive(Deserialize)]
pub struct UpdateLocationRequest {
    pub location: GeoPoint,
}

async fn update_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(payload): Json<UpdateLocationRequest>,
) -> Result<Json<DeliveryPartner>, AppError> {
    let mut partner = state
        .partners
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("delivery partner {id} not found")))?;

    partner.location = Some(payload.location);
    partner.updated_at = Utc::now();

    Ok(Json(partner.clone()))
}
