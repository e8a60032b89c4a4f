use axum::{
    Router,
    routing::{get, post},
};

use std::sync::Arc;

use crate::{deposits, health, promo_codes, webhooks};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    /// Endpoint secret used to verify Stripe webhook signatures.
    pub webhook_secret: Option<Arc<str>>,
}

impl ServerState {
    pub fn new(engine: Engine, webhook_secret: Option<String>) -> Self {
        Self {
            engine: Arc::new(engine),
            webhook_secret: webhook_secret
                .filter(|secret| !secret.trim().is_empty())
                .map(Arc::from),
        }
    }
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/api/health", get(health::get))
        .route("/api/payments/create-deposit", post(deposits::create_deposit))
        .route("/api/promo-codes/{code}", get(promo_codes::get))
        .route("/api/webhooks/stripe", post(webhooks::stripe))
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    webhook_secret: Option<String>,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);
    if webhook_secret.is_none() {
        tracing::warn!("no Stripe webhook secret configured, webhooks will be refused");
    }

    let state = ServerState::new(engine, webhook_secret);
    axum::serve(listener, router(state)).await
}
