use serde::{Deserialize, Serialize};

use crate::models::partner::GeoPoint;

/// Geocoded restaurant address. A missing row (or missing coordinates)
/// means the location is unknown and the dispatch matcher fails open.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestaurantLocation {
    pub restaurant_id: u64,
    pub location: Option<GeoPoint>,
}
