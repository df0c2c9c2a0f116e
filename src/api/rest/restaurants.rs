use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::put;
use serde::Deserialize;

use crate::models::partner::GeoPoint;
use crate::models::restaurant::RestaurantLocation;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/restaurants/:restaurant_id/location", put(upsert_location))
}

#[derive(Deserialize)]
pub struct UpsertLocationRequest {
    #[serde(default)]
    pub location: Option<GeoPoint>,
}

/// Geocode registration for a restaurant. A null location is allowed and
/// makes the dispatch matcher fail open for this restaurant's orders.
async fn upsert_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(payload): Json<UpsertLocationRequest>,
) -> Json<RestaurantLocation> {
    let record = RestaurantLocation {
        restaurant_id: id,
        location: payload.location,
    };
    state.restaurant_locations.insert(id, record.clone());
    Json(record)
}
