use std::env;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub fanout_queue_size: usize,
    pub event_buffer_size: usize,
    pub geofence_radius_km: f64,
    pub push_endpoint: Option<String>,
    pub push_api_key: Option<String>,
    pub push_retry_attempts: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            fanout_queue_size: parse_or_default("FANOUT_QUEUE_SIZE", 1024)?,
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            geofence_radius_km: parse_or_default("GEOFENCE_RADIUS_KM", 5.0)?,
            push_endpoint: env::var("PUSH_ENDPOINT").ok(),
            push_api_key: env::var("PUSH_API_KEY").ok(),
            push_retry_attempts: parse_or_default("PUSH_RETRY_ATTEMPTS", 2)?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 3000,
            log_level: "info".to_string(),
            fanout_queue_size: 1024,
            event_buffer_size: 1024,
            geofence_radius_km: 5.0,
            push_endpoint: None,
            push_api_key: None,
            push_retry_attempts: 2,
        }
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
