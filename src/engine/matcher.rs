//! Dispatch matching: which delivery partners should hear about an
//! unclaimed order. Pure functions of the inputs; the fanout engine owns
//! all side effects.

use crate::geo::haversine_km;
use crate::models::partner::{DeliveryPartner, GeoPoint};

/// Geofence check with fail-open semantics: when either side's coordinates
/// are unknown the pair is treated as in range, so absent location data
/// never silently starves dispatch.
pub fn within_geofence(a: Option<&GeoPoint>, b: Option<&GeoPoint>, radius_km: f64) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => haversine_km(a, b) <= radius_km,
        _ => true,
    }
}

/// Candidate set for one dispatchable order: every online, active partner
/// within the geofence of the restaurant.
pub fn eligible_partners(
    restaurant: Option<&GeoPoint>,
    partners: &[DeliveryPartner],
    radius_km: f64,
) -> Vec<DeliveryPartner> {
    partners
        .iter()
        .filter(|partner| partner.is_online && partner.is_active)
        .filter(|partner| within_geofence(restaurant, partner.location.as_ref(), radius_km))
        .cloned()
        .collect()
}
