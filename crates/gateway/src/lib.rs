//! Stripe integration over its REST API.
//!
//! [`StripeClient`] implements the engine's [`engine::PaymentGateway`] by
//! opening hosted checkout sessions; [`webhook`] verifies and decodes the
//! events Stripe posts back.

pub use stripe::{DEFAULT_API_BASE, StripeClient, StripeError, checkout_form};
pub use webhook::{
    CHECKOUT_SESSION_COMPLETED, CHECKOUT_SESSION_EXPIRED, CheckoutSessionEvent,
    SIGNATURE_TOLERANCE_SECS, WebhookError, WebhookEvent, sign_payload, verify_webhook_signature,
    verify_webhook_signature_at,
};

mod stripe;
pub mod webhook;
