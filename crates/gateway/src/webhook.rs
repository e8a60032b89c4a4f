//! Stripe webhook verification and decoding.
//!
//! Stripe signs every delivery with the endpoint secret: the
//! `Stripe-Signature` header carries `t=<unix seconds>` and one or more
//! `v1=<hex hmac-sha256>` entries computed over `"{t}.{raw body}"`.

use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

/// Maximum age (and clock skew) accepted for a signed delivery.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";
pub const CHECKOUT_SESSION_EXPIRED: &str = "checkout.session.expired";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WebhookError {
    #[error("invalid Stripe-Signature header")]
    InvalidHeader,
    #[error("webhook signature mismatch")]
    SignatureMismatch,
    #[error("webhook timestamp outside tolerance")]
    Expired,
    #[error("invalid webhook payload: {0}")]
    InvalidPayload(String),
}

/// Verify Stripe webhook signature (HMAC-SHA256) against the current time.
pub fn verify_webhook_signature(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
) -> Result<(), WebhookError> {
    verify_webhook_signature_at(payload, sig_header, secret, Utc::now().timestamp())
}

/// Same as [`verify_webhook_signature`] with an explicit clock.
pub fn verify_webhook_signature_at(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
    now: i64,
) -> Result<(), WebhookError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in sig_header.split(',') {
        let part = part.trim();
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = Some(t);
        } else if let Some(v) = part.strip_prefix("v1=") {
            signatures.push(v);
        }
    }
    let timestamp = timestamp.ok_or(WebhookError::InvalidHeader)?;
    if signatures.is_empty() {
        return Err(WebhookError::InvalidHeader);
    }
    let ts: i64 = timestamp.parse().map_err(|_| WebhookError::InvalidHeader)?;

    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| WebhookError::InvalidHeader)?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);

    // Secrets being rolled produce several v1 entries; one match is enough.
    let matched = signatures.iter().any(|signature| {
        hex::decode(signature)
            .map(|bytes| mac.clone().verify_slice(&bytes).is_ok())
            .unwrap_or(false)
    });
    if !matched {
        return Err(WebhookError::SignatureMismatch);
    }

    if (now - ts).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(WebhookError::Expired);
    }
    Ok(())
}

/// The envelope of a Stripe event.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: EventData,
}

#[derive(Debug, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

/// Fields of a checkout session object the booking flow cares about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckoutSessionEvent {
    pub session_id: String,
    pub payment_intent_id: Option<String>,
}

impl WebhookEvent {
    pub fn parse(payload: &[u8]) -> Result<Self, WebhookError> {
        serde_json::from_slice(payload).map_err(|err| WebhookError::InvalidPayload(err.to_string()))
    }

    /// The checkout session carried by `checkout.session.*` events.
    pub fn checkout_session(&self) -> Result<CheckoutSessionEvent, WebhookError> {
        let object = &self.data.object;
        let session_id = object["id"]
            .as_str()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| WebhookError::InvalidPayload("checkout session without id".to_string()))?;
        // `payment_intent` is an id unless the event was expanded.
        let payment_intent_id = match &object["payment_intent"] {
            serde_json::Value::String(id) => Some(id.clone()),
            serde_json::Value::Object(intent) => intent
                .get("id")
                .and_then(serde_json::Value::as_str)
                .map(String::from),
            _ => None,
        };
        Ok(CheckoutSessionEvent {
            session_id: session_id.to_string(),
            payment_intent_id,
        })
    }
}

/// Computes a `Stripe-Signature` header value for `payload`.
pub fn sign_payload(payload: &[u8], secret: &str, timestamp: i64) -> Result<String, WebhookError> {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| WebhookError::InvalidHeader)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    let signature = hex::encode(mac.finalize().into_bytes());
    Ok(format!("t={timestamp},v1={signature}"))
}
