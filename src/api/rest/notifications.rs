use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Query, State};
use axum::routing::get;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::notification::Notification;
use crate::models::recipient::Recipient;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/notifications", get(list_notifications))
}

#[derive(Deserialize)]
pub struct NotificationsQuery {
    #[serde(default)]
    pub owner_id: Option<u64>,
    #[serde(default)]
    pub customer_id: Option<u64>,
    #[serde(default)]
    pub delivery_partner_id: Option<u64>,
}

/// Persisted notifications for one recipient, newest first.
async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NotificationsQuery>,
) -> Result<Json<Vec<Notification>>, AppError> {
    let recipient = Recipient::from_parts(
        query.owner_id,
        query.customer_id,
        query.delivery_partner_id,
    )
    .map_err(AppError::BadRequest)?;

    let mut notifications: Vec<Notification> = state
        .notifications
        .iter()
        .filter(|entry| entry.recipient == recipient)
        .map(|entry| entry.value().clone())
        .collect();

    notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(notifications))
}
