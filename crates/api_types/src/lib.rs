use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payment path chosen by the customer for the deposit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    StripeOnline,
    CashOnService,
}

impl PaymentMethod {
    /// Wire representation, as accepted in request bodies.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StripeOnline => "STRIPE_ONLINE",
            Self::CashOnService => "CASH_ON_SERVICE",
        }
    }
}

pub mod deposit {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BookingSummary {
        pub id: Uuid,
        /// Booking status after the call (`CONFIRMED` or `PAYMENT_PENDING`).
        pub status: String,
    }

    /// Successful answer of the deposit endpoint.
    ///
    /// The optional fields depend on the outcome:
    /// - promo waiver: `promo_code`
    /// - cash on service: `deposit_amount`, `payment_method`
    /// - online checkout: `checkout_url`, `session_id`, `deposit_amount`
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct DepositResponse {
        pub success: bool,
        pub message: String,
        pub payment_required: bool,
        pub booking: BookingSummary,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub promo_code: Option<String>,
        /// Deposit in major currency units (e.g. `25.0` for $25.00).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub deposit_amount: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub payment_method: Option<PaymentMethod>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub checkout_url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub session_id: Option<String>,
    }
}

pub mod promo {
    use super::*;

    /// Why a promo code cannot be used right now.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum PromoRejection {
        NotFound,
        Inactive,
        NotYetValid,
        Expired,
        UsageLimitReached,
    }

    /// Response body for `GET /api/promo-codes/{code}`.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PromoCodeLookup {
        /// Normalized (uppercase) code.
        pub code: String,
        pub valid: bool,
        pub skip_deposit: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub reason: Option<PromoRejection>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub valid_until: Option<DateTime<Utc>>,
    }
}

pub mod webhook {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct WebhookAck {
        pub received: bool,
        pub event_id: String,
    }
}

pub mod health {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Health {
        pub status: String,
        pub version: String,
        pub database: bool,
        /// Whether online checkout is configured.
        pub online_payments: bool,
    }
}

pub mod error {
    use super::*;

    /// A single invalid request field.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct FieldError {
        pub field: String,
        pub message: String,
    }

    /// Body of every non-2xx response.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ErrorBody {
        pub success: bool,
        pub error: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub details: Vec<FieldError>,
    }
}
