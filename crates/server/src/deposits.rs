//! Deposit API endpoints

use api_types::{
    PaymentMethod,
    deposit::{BookingSummary, DepositResponse},
};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use engine::{DepositCmd, DepositOutcome};
use serde_json::Value;

use crate::{ServerError, server::ServerState, validation::DepositRequest};

/// Handle requests for settling a booking deposit
pub async fn create_deposit(
    State(state): State<ServerState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<DepositResponse>, ServerError> {
    let Json(body) = payload.map_err(|rejection| {
        ServerError::Generic(format!("invalid JSON body: {}", rejection.body_text()))
    })?;
    let request = DepositRequest::from_json(&body).map_err(ServerError::Validation)?;

    let mut cmd = DepositCmd::new(request.booking_id, engine_method(request.payment_method));
    if let Some(code) = request.promo_code {
        cmd = cmd.promo_code(code);
    }
    if let Some(url) = request.return_url {
        cmd = cmd.return_url(url);
    }

    let outcome = state.engine.create_deposit(cmd).await?;
    Ok(Json(deposit_response(outcome)))
}

fn engine_method(method: PaymentMethod) -> engine::PaymentMethod {
    match method {
        PaymentMethod::StripeOnline => engine::PaymentMethod::StripeOnline,
        PaymentMethod::CashOnService => engine::PaymentMethod::CashOnService,
    }
}

fn deposit_response(outcome: DepositOutcome) -> DepositResponse {
    let mut response = DepositResponse {
        success: true,
        message: String::new(),
        payment_required: outcome.payment_required(),
        booking: BookingSummary {
            id: outcome.booking_id(),
            status: outcome.booking_status().as_str().to_string(),
        },
        promo_code: None,
        deposit_amount: outcome.deposit().map(engine::Money::to_major),
        payment_method: None,
        checkout_url: None,
        session_id: None,
    };

    match outcome {
        DepositOutcome::NotRequired { .. } => {
            response.message = "No deposit required. Booking confirmed.".to_string();
        }
        DepositOutcome::PromoWaived { code, .. } => {
            response.message = format!("Deposit waived with promo code {code}. Booking confirmed.");
            response.promo_code = Some(code);
        }
        DepositOutcome::CashOnService { deposit, .. } => {
            response.message = format!(
                "Booking confirmed. Deposit of {deposit} will be collected at your appointment."
            );
            response.payment_method = Some(PaymentMethod::CashOnService);
        }
        DepositOutcome::Checkout { session, .. } => {
            response.message =
                "Checkout session created. Complete the payment to confirm your booking."
                    .to_string();
            response.checkout_url = Some(session.url);
            response.session_id = Some(session.id);
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use engine::{CheckoutSession, Money};
    use uuid::Uuid;

    use super::*;

    #[test]
    fn checkout_response_requires_payment() {
        let response = deposit_response(DepositOutcome::Checkout {
            booking_id: Uuid::nil(),
            deposit: Money::new(2_550),
            payment_id: Uuid::nil(),
            session: CheckoutSession {
                id: "cs_1".to_string(),
                url: "https://checkout.stripe.com/cs_1".to_string(),
                payment_intent_id: None,
            },
        });
        assert!(response.payment_required);
        assert_eq!(response.booking.status, "PAYMENT_PENDING");
        assert_eq!(response.deposit_amount, Some(25.5));
        assert_eq!(response.session_id.as_deref(), Some("cs_1"));
        assert_eq!(response.payment_method, None);
    }

    #[test]
    fn cash_response_echoes_method() {
        let response = deposit_response(DepositOutcome::CashOnService {
            booking_id: Uuid::nil(),
            deposit: Money::new(2_500),
            payment_id: Uuid::nil(),
        });
        assert!(!response.payment_required);
        assert_eq!(response.booking.status, "CONFIRMED");
        assert_eq!(response.payment_method, Some(PaymentMethod::CashOnService));
        assert!(response.message.contains("$25.00"));
    }
}
