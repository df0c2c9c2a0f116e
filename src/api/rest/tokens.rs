use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::post;
use chrono::Utc;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::device_token::DeviceToken;
use crate::models::recipient::Recipient;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/device-tokens", post(register_device_token))
}

#[derive(Deserialize)]
pub struct RegisterTokenRequest {
    pub token: String,
    #[serde(flatten)]
    pub recipient: Recipient,
}

/// Registers a push token for exactly one role id. Re-registering an
/// existing token reactivates and rebinds it instead of duplicating.
async fn register_device_token(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterTokenRequest>,
) -> Result<Json<DeviceToken>, AppError> {
    if payload.token.trim().is_empty() {
        return Err(AppError::BadRequest("token cannot be empty".to_string()));
    }

    let record = match state.device_tokens.get_mut(&payload.token) {
        Some(mut existing) => {
            existing.is_active = true;
            existing.recipient = payload.recipient;
            existing.clone()
        }
        None => {
            let record = DeviceToken {
                token: payload.token.clone(),
                recipient: payload.recipient,
                is_active: true,
                registered_at: Utc::now(),
            };
            state.device_tokens.insert(payload.token, record.clone());
            record
        }
    };

    Ok(Json(record))
}
