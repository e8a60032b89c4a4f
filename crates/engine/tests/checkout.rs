use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::Database;

use engine::{
    BookingStatus, CheckoutRequest, CheckoutSession, CheckoutSettlement, DepositCmd,
    DepositOutcome, DepositStatus, Engine, EngineError, GatewayError, Money, NewPromoCodeCmd,
    NewServiceCmd, PaymentGateway, PaymentMethod, PaymentStatus, PromoRejection,
};
use migration::MigratorTrait;
use uuid::Uuid;

#[derive(Debug)]
struct EchoGateway;

#[async_trait]
impl PaymentGateway for EchoGateway {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, GatewayError> {
        let id = format!("cs_{}", request.booking_id.simple());
        Ok(CheckoutSession {
            url: format!("https://checkout.stripe.test/{id}"),
            id,
            payment_intent_id: None,
        })
    }
}

async fn engine() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder()
        .database(db)
        .gateway(Arc::new(EchoGateway))
        .build()
        .await
        .unwrap()
}

/// Opens a checkout for a fresh booking and returns `(booking_id, session_id)`.
async fn pending_checkout(engine: &Engine) -> (Uuid, String) {
    let service_id = engine
        .new_service(NewServiceCmd::new("Apostille", Money::new(8_000)).deposit(Money::new(2_000)))
        .await
        .unwrap();
    let booking_id = engine
        .new_booking(service_id, "client@example.org")
        .await
        .unwrap();
    let outcome = engine
        .create_deposit(DepositCmd::new(booking_id, PaymentMethod::StripeOnline))
        .await
        .unwrap();
    let DepositOutcome::Checkout { session, .. } = outcome else {
        panic!("expected checkout, got {outcome:?}");
    };
    (booking_id, session.id)
}

#[tokio::test]
async fn completed_checkout_confirms_booking() {
    let engine = engine().await;
    let (booking_id, session_id) = pending_checkout(&engine).await;

    let settlement = engine
        .complete_checkout(&session_id, Some("pi_123"))
        .await
        .unwrap();
    assert!(matches!(settlement, CheckoutSettlement::Settled { booking_id: id, .. } if id == booking_id));

    let booking = engine.booking(booking_id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert_eq!(booking.deposit_status, DepositStatus::Paid);
    assert_eq!(booking.payment_method, Some(PaymentMethod::StripeOnline));

    let payments = engine.payments_for_booking(booking_id).await.unwrap();
    assert_eq!(payments[0].status, PaymentStatus::Completed);
    assert_eq!(payments[0].payment_intent_id.as_deref(), Some("pi_123"));
}

#[tokio::test]
async fn redelivered_completion_is_idempotent() {
    let engine = engine().await;
    let (booking_id, session_id) = pending_checkout(&engine).await;

    engine.complete_checkout(&session_id, None).await.unwrap();
    let booking = engine.booking(booking_id).await.unwrap();

    let again = engine.complete_checkout(&session_id, None).await.unwrap();
    assert!(matches!(again, CheckoutSettlement::AlreadySettled { .. }));
    assert_eq!(engine.booking(booking_id).await.unwrap(), booking);
}

#[tokio::test]
async fn expired_checkout_cancels_payment_only() {
    let engine = engine().await;
    let (booking_id, session_id) = pending_checkout(&engine).await;

    let settlement = engine.expire_checkout(&session_id).await.unwrap();
    assert!(matches!(settlement, CheckoutSettlement::Settled { .. }));

    let booking = engine.booking(booking_id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::PaymentPending);
    let payments = engine.payments_for_booking(booking_id).await.unwrap();
    assert_eq!(payments[0].status, PaymentStatus::Cancelled);

    // A late completion for a cancelled session changes nothing.
    let late = engine.complete_checkout(&session_id, None).await.unwrap();
    assert!(matches!(late, CheckoutSettlement::AlreadySettled { .. }));
    assert_eq!(
        engine.booking(booking_id).await.unwrap().status,
        BookingStatus::PaymentPending
    );
}

#[tokio::test]
async fn unknown_session_is_reported() {
    let engine = engine().await;
    assert_eq!(
        engine.complete_checkout("cs_missing", None).await.unwrap(),
        CheckoutSettlement::UnknownSession
    );
    assert_eq!(
        engine.expire_checkout("cs_missing").await.unwrap(),
        CheckoutSettlement::UnknownSession
    );
}

#[tokio::test]
async fn promo_lookup_does_not_redeem() {
    let engine = engine().await;
    engine
        .new_promo_code(NewPromoCodeCmd::new("Welcome").skip_deposit(true))
        .await
        .unwrap();

    let check = engine.promo_code_status(" welcome ").await.unwrap();
    assert_eq!(check.code, "WELCOME");
    assert!(check.is_valid());
    assert!(check.skip_deposit);
    assert_eq!(engine.promo_code("WELCOME").await.unwrap().usage_count, 0);

    let missing = engine.promo_code_status("nope").await.unwrap();
    assert_eq!(missing.rejection, Some(PromoRejection::NotFound));

    engine.deactivate_promo_code("welcome").await.unwrap();
    let inactive = engine.promo_code_status("WELCOME").await.unwrap();
    assert_eq!(inactive.rejection, Some(PromoRejection::Inactive));
}

#[tokio::test]
async fn promo_codes_are_unique_after_normalization() {
    let engine = engine().await;
    engine
        .new_promo_code(NewPromoCodeCmd::new("SPRING"))
        .await
        .unwrap();
    let err = engine
        .new_promo_code(NewPromoCodeCmd::new(" spring "))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("SPRING".to_string()));

    engine
        .new_promo_code(NewPromoCodeCmd::new("SUMMER").skip_deposit(true))
        .await
        .unwrap();
    engine.deactivate_promo_code("spring").await.unwrap();
    let active = engine.list_promo_codes(true).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].code, "SUMMER");
    assert_eq!(engine.list_promo_codes(false).await.unwrap().len(), 2);
}

#[tokio::test]
async fn booking_requires_existing_service() {
    let engine = engine().await;
    let err = engine
        .new_booking(Uuid::new_v4(), "client@example.org")
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("service not exists".to_string()));

    let err = engine
        .new_service(NewServiceCmd::new("Cheap", Money::new(1_000)).deposit(Money::new(2_000)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}
