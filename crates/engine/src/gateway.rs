//! Seam between the engine and a hosted payment provider.
//!
//! The engine only needs one capability from the provider: open a hosted
//! checkout session for a deposit and hand back its URL. Implementations
//! live outside the engine (see the `gateway` crate).

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::{Currency, Money};

/// Errors reported by a payment gateway implementation.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The provider could not be reached.
    #[error("gateway request failed: {0}")]
    Network(String),
    /// The provider answered with an error status.
    #[error("gateway rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    /// The provider answered 2xx with a body we could not use.
    #[error("invalid gateway response: {0}")]
    InvalidResponse(String),
}

/// Everything needed to open a checkout session for one deposit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub booking_id: Uuid,
    pub amount: Money,
    pub currency: Currency,
    pub product_name: String,
    pub customer_email: String,
    pub success_url: String,
    pub cancel_url: String,
    pub expires_at: DateTime<Utc>,
    /// Key/value pairs echoed back by the provider on webhook events.
    pub metadata: Vec<(String, String)>,
}

/// A session opened by the provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
    pub payment_intent_id: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync + fmt::Debug {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, GatewayError>;
}
