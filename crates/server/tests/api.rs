use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header::CONTENT_TYPE},
};
use http_body_util::BodyExt;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::{
    CheckoutRequest, CheckoutSession, Engine, GatewayError, Money, NewPromoCodeCmd, NewServiceCmd,
    PaymentGateway,
};
use migration::MigratorTrait;
use server::{ServerState, router};
use uuid::Uuid;

const WEBHOOK_SECRET: &str = "whsec_test_secret";

#[derive(Debug)]
struct FakeGateway;

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, GatewayError> {
        let id = format!("cs_test_{}", request.booking_id.simple());
        Ok(CheckoutSession {
            url: format!("https://checkout.stripe.com/c/pay/{id}"),
            id,
            payment_intent_id: Some("pi_test".to_string()),
        })
    }
}

struct TestApp {
    router: Router,
    engine: Arc<Engine>,
}

async fn app(gateway: bool) -> TestApp {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let mut builder = Engine::builder()
        .database(db)
        .base_url("https://book.example.com");
    if gateway {
        builder = builder.gateway(Arc::new(FakeGateway));
    }
    let engine = builder.build().await.unwrap();
    let state = ServerState::new(engine, Some(WEBHOOK_SECRET.to_string()));
    TestApp {
        engine: state.engine.clone(),
        router: router(state),
    }
}

impl TestApp {
    async fn booking(&self, deposit: Option<i64>) -> Uuid {
        let mut cmd = NewServiceCmd::new("Mobile notary", Money::new(10_000));
        if let Some(deposit) = deposit {
            cmd = cmd.deposit(Money::new(deposit));
        }
        let service_id = self.engine.new_service(cmd).await.unwrap();
        self.engine
            .new_booking(service_id, "jane@example.com")
            .await
            .unwrap()
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn create_deposit(&self, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::post("/api/payments/create-deposit")
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    async fn webhook(&self, payload: &str, signature: Option<String>) -> (StatusCode, Value) {
        let mut request = Request::post("/api/webhooks/stripe");
        if let Some(signature) = signature {
            request = request.header("stripe-signature", signature);
        }
        self.send(request.body(Body::from(payload.to_string())).unwrap())
            .await
    }
}

fn signed(payload: &str) -> String {
    gateway::sign_payload(payload.as_bytes(), WEBHOOK_SECRET, chrono::Utc::now().timestamp())
        .unwrap()
}

#[tokio::test]
async fn no_deposit_service_confirms() {
    let app = app(false).await;
    let booking_id = app.booking(None).await;

    let (status, body) = app
        .create_deposit(json!({"bookingId": booking_id, "paymentMethod": "STRIPE_ONLINE"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["paymentRequired"], false);
    assert_eq!(body["booking"]["id"], booking_id.to_string());
    assert_eq!(body["booking"]["status"], "CONFIRMED");
    assert!(body.get("checkoutUrl").is_none());
}

#[tokio::test]
async fn cash_deposit_reports_amount() {
    let app = app(false).await;
    let booking_id = app.booking(Some(2_500)).await;

    let (status, body) = app
        .create_deposit(json!({"bookingId": booking_id, "paymentMethod": "CASH_ON_SERVICE"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["paymentRequired"], false);
    assert_eq!(body["depositAmount"], 25.0);
    assert_eq!(body["paymentMethod"], "CASH_ON_SERVICE");
    assert_eq!(body["booking"]["status"], "CONFIRMED");
}

#[tokio::test]
async fn promo_waiver_echoes_code() {
    let app = app(false).await;
    app.engine
        .new_promo_code(NewPromoCodeCmd::new("NODEPOSIT").skip_deposit(true))
        .await
        .unwrap();
    let booking_id = app.booking(Some(2_500)).await;

    let (status, body) = app
        .create_deposit(json!({
            "bookingId": booking_id,
            "paymentMethod": "CASH_ON_SERVICE",
            "promoCode": "nodeposit",
        }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["promoCode"], "NODEPOSIT");
    assert_eq!(body["paymentRequired"], false);
    assert!(body.get("depositAmount").is_none());
}

#[tokio::test]
async fn online_deposit_returns_checkout() {
    let app = app(true).await;
    let booking_id = app.booking(Some(2_500)).await;

    let (status, body) = app
        .create_deposit(json!({
            "bookingId": booking_id,
            "paymentMethod": "STRIPE_ONLINE",
            "returnUrl": "https://partner.test/back",
        }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["paymentRequired"], true);
    assert_eq!(body["booking"]["status"], "PAYMENT_PENDING");
    assert_eq!(body["depositAmount"], 25.0);
    assert!(body["checkoutUrl"].as_str().unwrap().starts_with("https://checkout.stripe.com/"));
    assert!(body["sessionId"].as_str().unwrap().starts_with("cs_test_"));
}

#[tokio::test]
async fn online_deposit_without_gateway_is_503() {
    let app = app(false).await;
    let booking_id = app.booking(Some(2_500)).await;

    let (status, body) = app
        .create_deposit(json!({"bookingId": booking_id, "paymentMethod": "STRIPE_ONLINE"}))
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn online_deposit_without_amount_is_400() {
    let app = app(true).await;
    let service_id = app
        .engine
        .new_service(NewServiceCmd::new("Field visit", Money::new(10_000)).requires_deposit(true))
        .await
        .unwrap();
    let booking_id = app
        .engine
        .new_booking(service_id, "jane@example.com")
        .await
        .unwrap();

    let (status, body) = app
        .create_deposit(json!({"bookingId": booking_id, "paymentMethod": "STRIPE_ONLINE"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("no deposit amount to charge online"));

    let (status, body) = app
        .create_deposit(json!({"bookingId": booking_id, "paymentMethod": "CASH_ON_SERVICE"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["depositAmount"], 0.0);
}

#[tokio::test]
async fn invalid_fields_are_named() {
    let app = app(false).await;

    let (status, body) = app
        .create_deposit(json!({"bookingId": "123", "paymentMethod": "BITCOIN"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|detail| detail["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["bookingId", "paymentMethod"]);
}

#[tokio::test]
async fn malformed_json_is_400() {
    let app = app(false).await;
    let (status, body) = app
        .send(
            Request::post("/api/payments/create-deposit")
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn unknown_booking_is_404() {
    let app = app(false).await;
    let (status, _) = app
        .create_deposit(json!({"bookingId": Uuid::new_v4(), "paymentMethod": "CASH_ON_SERVICE"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn second_deposit_is_rejected() {
    let app = app(false).await;
    let booking_id = app.booking(Some(2_500)).await;
    let body = json!({"bookingId": booking_id, "paymentMethod": "CASH_ON_SERVICE"});

    let (status, _) = app.create_deposit(body.clone()).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app.create_deposit(body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(
        app.engine.payments_for_booking(booking_id).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn promo_lookup_reports_reason() {
    let app = app(false).await;
    app.engine
        .new_promo_code(NewPromoCodeCmd::new("WELCOME").skip_deposit(true).max_uses(10))
        .await
        .unwrap();

    let (status, body) = app
        .send(Request::get("/api/promo-codes/welcome").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], "WELCOME");
    assert_eq!(body["valid"], true);
    assert_eq!(body["skipDeposit"], true);
    assert!(body.get("reason").is_none());

    let (status, body) = app
        .send(Request::get("/api/promo-codes/UNKNOWN").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], false);
    assert_eq!(body["reason"], "not_found");
}

#[tokio::test]
async fn checkout_webhook_confirms_booking() {
    let app = app(true).await;
    let booking_id = app.booking(Some(2_500)).await;
    let (_, body) = app
        .create_deposit(json!({"bookingId": booking_id, "paymentMethod": "STRIPE_ONLINE"}))
        .await;
    let session_id = body["sessionId"].as_str().unwrap().to_string();

    let payload = json!({
        "id": "evt_1",
        "type": "checkout.session.completed",
        "data": {"object": {"id": session_id, "payment_intent": "pi_paid"}},
    })
    .to_string();
    let (status, body) = app.webhook(&payload, Some(signed(&payload))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["received"], true);
    assert_eq!(body["eventId"], "evt_1");

    let booking = app.engine.booking(booking_id).await.unwrap();
    assert_eq!(booking.status, engine::BookingStatus::Confirmed);
    assert_eq!(booking.deposit_status, engine::DepositStatus::Paid);
}

#[tokio::test]
async fn webhook_requires_valid_signature() {
    let app = app(true).await;
    let payload = json!({"id": "evt_2", "type": "ping", "data": {"object": {}}}).to_string();

    let (status, _) = app.webhook(&payload, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .webhook(&payload, Some("t=1,v1=deadbeef".to_string()))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.webhook(&payload, Some(signed(&payload))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["eventId"], "evt_2");
}

#[tokio::test]
async fn health_reports_database() {
    let app = app(false).await;
    let (status, body) = app
        .send(Request::get("/api/health").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], true);
    assert_eq!(body["onlinePayments"], false);
}
