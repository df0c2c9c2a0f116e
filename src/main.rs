mod api;
mod config;
mod engine;
mod error;
mod geo;
mod models;
mod observability;
mod push;
mod realtime;
mod state;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::push::client::{HttpPushClient, NoopPushClient, PushClient};

#[tokio::main]
async fn main() -> Result<(), error::AppError> {
    let config = config::Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let push: Arc<dyn PushClient> = match (&config.push_endpoint, &config.push_api_key) {
        (Some(endpoint), Some(api_key)) => {
            tracing::info!(endpoint = %endpoint, "push delivery enabled");
            Arc::new(HttpPushClient::new(endpoint.clone(), api_key.clone()))
        }
        _ => {
            tracing::warn!("no push endpoint configured; push delivery disabled");
            Arc::new(NoopPushClient)
        }
    };

    let (app_state, fanout_rx) = state::AppState::new(&config, push);
    let shared_state = Arc::new(app_state);

    let app = api::rest::router(shared_state.clone());

    tokio::spawn(engine::fanout::run_fanout_engine(
        shared_state.clone(),
        fanout_rx,
    ));

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| error::AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| error::AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
