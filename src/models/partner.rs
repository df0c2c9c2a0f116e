use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryPartner {
    pub id: u64,
    pub name: String,
    pub is_online: bool,
    pub is_active: bool,
    pub location: Option<GeoPoint>,
    pub rating: f64,
    pub updated_at: DateTime<Utc>,
}
