//! Stripe webhook endpoint
//!
//! The body is taken raw: the signature covers the exact bytes Stripe sent.

use api_types::webhook::WebhookAck;
use axum::{Json, body::Bytes, extract::State, http::HeaderName};
use axum_extra::{
    TypedHeader,
    headers::{Error as HeaderError, Header},
};
use engine::EngineError;
use gateway::{
    CHECKOUT_SESSION_COMPLETED, CHECKOUT_SESSION_EXPIRED, WebhookEvent, verify_webhook_signature,
};

use crate::{ServerError, server::ServerState};

static STRIPE_SIGNATURE: HeaderName = HeaderName::from_static("stripe-signature");

/// `TypedHeader` for the `Stripe-Signature` header.
#[derive(Debug)]
pub struct StripeSignature(String);

impl Header for StripeSignature {
    fn name() -> &'static HeaderName {
        &STRIPE_SIGNATURE
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, HeaderError>
    where
        Self: Sized,
        I: Iterator<Item = &'i axum::http::HeaderValue>,
    {
        let value = values.next().ok_or_else(HeaderError::invalid)?;
        let Ok(value) = value.to_str() else {
            return Err(HeaderError::invalid());
        };
        Ok(StripeSignature(value.to_string()))
    }

    fn encode<E: Extend<axum::http::HeaderValue>>(&self, values: &mut E) {
        match axum::http::HeaderValue::from_str(&self.0) {
            Ok(value) => values.extend(std::iter::once(value)),
            Err(_) => tracing::error!("failed to encode stripe-signature header"),
        }
    }
}

/// Handle checkout events posted by Stripe
pub async fn stripe(
    State(state): State<ServerState>,
    signature: Option<TypedHeader<StripeSignature>>,
    body: Bytes,
) -> Result<Json<WebhookAck>, ServerError> {
    let Some(secret) = state.webhook_secret.as_deref() else {
        return Err(EngineError::GatewayUnavailable(
            "webhook secret is not configured".to_string(),
        )
        .into());
    };
    let Some(TypedHeader(StripeSignature(signature))) = signature else {
        tracing::warn!("stripe webhook without signature");
        return Err(ServerError::Generic(
            "missing Stripe-Signature header".to_string(),
        ));
    };
    verify_webhook_signature(&body, &signature, secret).map_err(|err| {
        tracing::warn!("stripe webhook rejected: {err}");
        ServerError::Generic(err.to_string())
    })?;

    let event = WebhookEvent::parse(&body).map_err(|err| ServerError::Generic(err.to_string()))?;
    tracing::info!("received stripe event {} ({})", event.id, event.kind);

    match event.kind.as_str() {
        CHECKOUT_SESSION_COMPLETED => {
            let session = event
                .checkout_session()
                .map_err(|err| ServerError::Generic(err.to_string()))?;
            state
                .engine
                .complete_checkout(&session.session_id, session.payment_intent_id.as_deref())
                .await?;
        }
        CHECKOUT_SESSION_EXPIRED => {
            let session = event
                .checkout_session()
                .map_err(|err| ServerError::Generic(err.to_string()))?;
            state.engine.expire_checkout(&session.session_id).await?;
        }
        other => tracing::debug!("ignoring stripe event type {other}"),
    }

    Ok(Json(WebhookAck {
        received: true,
        event_id: event.id,
    }))
}
