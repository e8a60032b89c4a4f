use std::fmt;

use async_trait::async_trait;
use engine::{CheckoutRequest, CheckoutSession, GatewayError, PaymentGateway};
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";

#[derive(Debug, Error)]
pub enum StripeError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("stripe api error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("unexpected stripe response: {0}")]
    Response(String),
}

impl From<StripeError> for GatewayError {
    fn from(err: StripeError) -> Self {
        match err {
            StripeError::Http(err) => GatewayError::Network(err.to_string()),
            StripeError::Api { status, message } => GatewayError::Rejected { status, message },
            StripeError::Response(message) => GatewayError::InvalidResponse(message),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    id: String,
    url: Option<String>,
    payment_intent: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

/// Stripe client authenticated with a secret key.
#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
    api_base: String,
}

impl fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StripeClient")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl StripeClient {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key: secret_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Point the client at another API host (used against local fakes).
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Create a Stripe Checkout Session (payment mode) for one deposit.
    pub async fn create_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, StripeError> {
        let response = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&checkout_form(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .ok()
                .and_then(|err| err.error.message)
                .unwrap_or(body);
            return Err(StripeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let session: SessionResponse = response.json().await?;
        let url = session.url.ok_or_else(|| {
            StripeError::Response(format!("checkout session {} has no url", session.id))
        })?;
        tracing::debug!("created checkout session {}", session.id);
        Ok(CheckoutSession {
            id: session.id,
            url,
            payment_intent_id: session.payment_intent,
        })
    }
}

#[async_trait]
impl PaymentGateway for StripeClient {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, GatewayError> {
        Ok(self.create_session(request).await?)
    }
}

/// Form fields of a one-line, card-only checkout session.
///
/// Metadata is attached to both the session and its payment intent so that
/// either kind of event can be traced back to the booking.
pub fn checkout_form(request: &CheckoutRequest) -> Vec<(String, String)> {
    let mut form: Vec<(String, String)> = [
        ("mode", "payment".to_string()),
        ("payment_method_types[0]", "card".to_string()),
        (
            "line_items[0][price_data][currency]",
            request.currency.gateway_code().to_string(),
        ),
        (
            "line_items[0][price_data][product_data][name]",
            request.product_name.clone(),
        ),
        (
            "line_items[0][price_data][unit_amount]",
            request.amount.minor().to_string(),
        ),
        ("line_items[0][quantity]", "1".to_string()),
        ("customer_email", request.customer_email.clone()),
        ("client_reference_id", request.booking_id.to_string()),
        ("success_url", request.success_url.clone()),
        ("cancel_url", request.cancel_url.clone()),
        ("expires_at", request.expires_at.timestamp().to_string()),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value))
    .collect();

    for (key, value) in &request.metadata {
        form.push((format!("metadata[{key}]"), value.clone()));
        form.push((format!("payment_intent_data[metadata][{key}]"), value.clone()));
    }
    form
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use engine::{Currency, Money};
    use uuid::Uuid;

    use super::*;

    fn request() -> CheckoutRequest {
        CheckoutRequest {
            booking_id: Uuid::nil(),
            amount: Money::new(2_500),
            currency: Currency::Usd,
            product_name: "Deposit - Mobile notary".to_string(),
            customer_email: "jane@example.com".to_string(),
            success_url: "https://book.example.com/booking/success?session_id={CHECKOUT_SESSION_ID}"
                .to_string(),
            cancel_url: "https://book.example.com/booking/cancel".to_string(),
            expires_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            metadata: vec![("bookingId".to_string(), Uuid::nil().to_string())],
        }
    }

    fn field<'a>(form: &'a [(String, String)], key: &str) -> Option<&'a str> {
        form.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn form_describes_one_deposit_line() {
        let form = checkout_form(&request());
        assert_eq!(field(&form, "mode"), Some("payment"));
        assert_eq!(field(&form, "line_items[0][price_data][currency]"), Some("usd"));
        assert_eq!(field(&form, "line_items[0][price_data][unit_amount]"), Some("2500"));
        assert_eq!(
            field(&form, "line_items[0][price_data][product_data][name]"),
            Some("Deposit - Mobile notary")
        );
        assert_eq!(field(&form, "expires_at"), Some("1772366400"));
        assert_eq!(
            field(&form, "success_url"),
            Some("https://book.example.com/booking/success?session_id={CHECKOUT_SESSION_ID}")
        );
    }

    #[test]
    fn metadata_goes_to_session_and_intent() {
        let form = checkout_form(&request());
        let nil = Uuid::nil().to_string();
        assert_eq!(field(&form, "metadata[bookingId]"), Some(nil.as_str()));
        assert_eq!(
            field(&form, "payment_intent_data[metadata][bookingId]"),
            Some(nil.as_str())
        );
    }

    #[test]
    fn api_errors_map_to_rejections() {
        let err = GatewayError::from(StripeError::Api {
            status: 400,
            message: "Invalid currency".to_string(),
        });
        assert!(matches!(err, GatewayError::Rejected { status: 400, .. }));
    }

    #[test]
    fn debug_hides_secret_key() {
        let client = StripeClient::new("sk_test_secret");
        assert!(!format!("{client:?}").contains("sk_test_secret"));
    }
}
