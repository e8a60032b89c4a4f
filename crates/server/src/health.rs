//! Health check endpoint

use api_types::health::Health;
use axum::{Json, extract::State};

use crate::server::ServerState;

pub async fn get(State(state): State<ServerState>) -> Json<Health> {
    let database = match state.engine.ping().await {
        Ok(()) => true,
        Err(err) => {
            tracing::error!("health check failed: {err}");
            false
        }
    };

    Json(Health {
        status: if database { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database,
        online_payments: state.engine.has_gateway(),
    })
}
