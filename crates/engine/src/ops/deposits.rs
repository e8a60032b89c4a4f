//! Deposit settlement for bookings awaiting payment.
//!
//! The policy is applied in a fixed order: booking state, deposit
//! requirement, promo waiver, then the chosen payment method. Every path
//! that confirms the booking runs inside one database transaction; the
//! online checkout path only reads before talking to the gateway.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait,
    QueryFilter, TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    Booking, BookingStatus, CheckoutRequest, CheckoutSession, Currency, DepositCmd,
    DepositStatus, EngineError, Money, Payment, PaymentChannel, PaymentMethod, PromoCode,
    ResultEngine, Service, bookings, normalize_code, payments, promo_codes,
};

use super::{Engine, with_tx};

/// Lifetime of a hosted checkout session.
pub const CHECKOUT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Redirect targets handed to the checkout provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckoutUrls {
    pub success: String,
    pub cancel: String,
}

impl CheckoutUrls {
    /// Builds the redirect URLs for `booking_id`.
    ///
    /// `return_url` replaces both default pages when given. The success URL
    /// keeps the provider's `{CHECKOUT_SESSION_ID}` placeholder verbatim, so
    /// the query is appended as text rather than url-encoded.
    pub fn for_booking(base_url: &str, return_url: Option<&str>, booking_id: Uuid) -> Self {
        let base_url = base_url.trim_end_matches('/');
        let success = return_url.map_or_else(
            || format!("{base_url}/booking/success"),
            ToString::to_string,
        );
        let cancel = return_url.map_or_else(
            || format!("{base_url}/booking/cancel"),
            ToString::to_string,
        );
        Self {
            success: format!(
                "{success}{}session_id={{CHECKOUT_SESSION_ID}}&booking_id={booking_id}",
                query_separator(&success)
            ),
            cancel: format!(
                "{cancel}{}booking_id={booking_id}&cancelled=true",
                query_separator(&cancel)
            ),
        }
    }
}

fn query_separator(url: &str) -> &'static str {
    if url.ends_with('?') || url.ends_with('&') {
        ""
    } else if url.contains('?') {
        "&"
    } else {
        "?"
    }
}

/// What happened to the booking deposit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DepositOutcome {
    /// The service needs no deposit; the booking is confirmed.
    NotRequired { booking_id: Uuid },
    /// A deposit-skip promo code was redeemed; the booking is confirmed.
    PromoWaived { booking_id: Uuid, code: String },
    /// The deposit is collected in person; the booking is confirmed and a
    /// pending payment records the amount due.
    CashOnService {
        booking_id: Uuid,
        deposit: Money,
        payment_id: Uuid,
    },
    /// The customer must finish a hosted checkout; the booking still awaits
    /// payment.
    Checkout {
        booking_id: Uuid,
        deposit: Money,
        payment_id: Uuid,
        session: CheckoutSession,
    },
}

impl DepositOutcome {
    pub fn booking_id(&self) -> Uuid {
        match self {
            Self::NotRequired { booking_id }
            | Self::PromoWaived { booking_id, .. }
            | Self::CashOnService { booking_id, .. }
            | Self::Checkout { booking_id, .. } => *booking_id,
        }
    }

    /// Booking status after the outcome was persisted.
    pub fn booking_status(&self) -> BookingStatus {
        match self {
            Self::Checkout { .. } => BookingStatus::PaymentPending,
            _ => BookingStatus::Confirmed,
        }
    }

    pub fn deposit_status(&self) -> DepositStatus {
        match self {
            Self::NotRequired { .. } => DepositStatus::NotRequired,
            Self::PromoWaived { .. } => DepositStatus::WaivedPromo,
            Self::CashOnService { .. } => DepositStatus::CashOnService,
            Self::Checkout { .. } => DepositStatus::Pending,
        }
    }

    /// Whether the customer still has to pay online.
    pub fn payment_required(&self) -> bool {
        matches!(self, Self::Checkout { .. })
    }

    pub fn deposit(&self) -> Option<Money> {
        match self {
            Self::CashOnService { deposit, .. } | Self::Checkout { deposit, .. } => {
                Some(*deposit)
            }
            _ => None,
        }
    }
}

/// Result of the transactional part of the flow.
enum Settlement {
    Done(DepositOutcome),
    NeedsCheckout { booking: Booking, service: Service },
}

impl Engine {
    /// Settle the deposit of a booking that is awaiting payment.
    ///
    /// A promo code that is unknown, inactive, outside its validity window,
    /// exhausted or not deposit-skipping is ignored and the regular deposit
    /// path applies.
    pub async fn create_deposit(&self, cmd: DepositCmd) -> ResultEngine<DepositOutcome> {
        let now = Utc::now();
        let promo_code = cmd.promo_code.as_deref().and_then(|raw| {
            normalize_code(raw)
                .inspect_err(|err| tracing::debug!("ignoring promo code {raw:?}: {err}"))
                .ok()
        });

        let settlement = with_tx!(self, |db_tx| {
            self.settle_deposit(&db_tx, &cmd, promo_code.as_deref(), now)
                .await
        })?;

        let outcome = match settlement {
            Settlement::Done(outcome) => outcome,
            Settlement::NeedsCheckout { booking, service } => {
                self.open_checkout(&cmd, &booking, &service, now).await?
            }
        };
        tracing::info!(
            "deposit for booking {} settled: booking {}, deposit {}",
            outcome.booking_id(),
            outcome.booking_status(),
            outcome.deposit_status().as_str()
        );
        Ok(outcome)
    }

    async fn settle_deposit(
        &self,
        db_tx: &DatabaseTransaction,
        cmd: &DepositCmd,
        promo_code: Option<&str>,
        now: DateTime<Utc>,
    ) -> ResultEngine<Settlement> {
        let (booking, service) = self
            .require_booking_with_service(db_tx, cmd.booking_id)
            .await?;
        if booking.status != BookingStatus::PaymentPending {
            return Err(EngineError::InvalidState(format!(
                "booking is {}, expected {}",
                booking.status,
                BookingStatus::PaymentPending
            )));
        }

        if !service.requires_deposit {
            confirm_booking(db_tx, booking.id, DepositStatus::NotRequired, None, None, now)
                .await?;
            return Ok(Settlement::Done(DepositOutcome::NotRequired {
                booking_id: booking.id,
            }));
        }

        if let Some(code) = promo_code
            && try_redeem_deposit_waiver(db_tx, code, now).await
        {
            confirm_booking(
                db_tx,
                booking.id,
                DepositStatus::WaivedPromo,
                None,
                Some(code),
                now,
            )
            .await?;
            return Ok(Settlement::Done(DepositOutcome::PromoWaived {
                booking_id: booking.id,
                code: code.to_string(),
            }));
        }

        match cmd.payment_method {
            PaymentMethod::CashOnService => {
                let deposit = service.deposit();
                confirm_booking(
                    db_tx,
                    booking.id,
                    DepositStatus::CashOnService,
                    Some(PaymentMethod::CashOnService),
                    None,
                    now,
                )
                .await?;
                let payment = Payment::pending(
                    booking.id,
                    deposit,
                    PaymentChannel::CashOnService,
                    format!("Deposit of {deposit} to be collected in cash at the appointment"),
                    now,
                );
                payments::ActiveModel::from(&payment).insert(db_tx).await?;
                Ok(Settlement::Done(DepositOutcome::CashOnService {
                    booking_id: booking.id,
                    deposit,
                    payment_id: payment.id,
                }))
            }
            PaymentMethod::StripeOnline => Ok(Settlement::NeedsCheckout { booking, service }),
        }
    }

    async fn open_checkout(
        &self,
        cmd: &DepositCmd,
        booking: &Booking,
        service: &Service,
        now: DateTime<Utc>,
    ) -> ResultEngine<DepositOutcome> {
        let gateway = self.gateway.as_ref().ok_or_else(|| {
            EngineError::GatewayUnavailable("online payments are not configured".to_string())
        })?;
        let deposit = service.deposit();
        if deposit.is_zero() {
            return Err(EngineError::InvalidAmount(format!(
                "service \"{}\" has no deposit amount to charge online, use CASH_ON_SERVICE",
                service.name
            )));
        }
        let ttl = TimeDelta::from_std(CHECKOUT_SESSION_TTL)
            .map_err(|_| EngineError::InvalidState("checkout ttl out of range".to_string()))?;

        let urls = CheckoutUrls::for_booking(&self.base_url, cmd.return_url.as_deref(), booking.id);
        let currency = Currency::default();
        let request = CheckoutRequest {
            booking_id: booking.id,
            amount: deposit,
            currency,
            product_name: format!("Deposit - {}", service.name),
            customer_email: booking.customer_email.clone(),
            success_url: urls.success,
            cancel_url: urls.cancel,
            expires_at: now + ttl,
            metadata: vec![
                ("bookingId".to_string(), booking.id.to_string()),
                ("paymentType".to_string(), "deposit".to_string()),
                ("depositAmount".to_string(), deposit.decimal()),
            ],
        };
        let session = gateway
            .create_checkout_session(&request)
            .await
            .inspect_err(|err| {
                tracing::error!("checkout session for booking {} failed: {err}", booking.id);
            })?;

        let mut payment = Payment::pending(
            booking.id,
            deposit,
            PaymentChannel::StripeCheckout,
            format!("Awaiting Stripe checkout session {}", session.id),
            now,
        );
        payment.currency = currency;
        payment.payment_intent_id = session.payment_intent_id.clone();
        payment.checkout_session_id = Some(session.id.clone());

        with_tx!(self, |db_tx| {
            record_checkout_payment(&db_tx, &payment).await
        })?;

        Ok(DepositOutcome::Checkout {
            booking_id: booking.id,
            deposit,
            payment_id: payment.id,
            session,
        })
    }
}

/// Stores the pending checkout payment, provided nobody confirmed the
/// booking while the session was being opened.
async fn record_checkout_payment(
    db_tx: &DatabaseTransaction,
    payment: &Payment,
) -> ResultEngine<()> {
    let still_pending = bookings::Entity::find_by_id(payment.booking_id.to_string())
        .filter(bookings::Column::Status.eq(BookingStatus::PaymentPending.as_str()))
        .one(db_tx)
        .await?
        .is_some();
    if !still_pending {
        return Err(EngineError::InvalidState(
            "booking was settled while opening the checkout session".to_string(),
        ));
    }
    payments::ActiveModel::from(payment).insert(db_tx).await?;
    Ok(())
}

/// Moves a booking from `PAYMENT_PENDING` to `CONFIRMED`.
///
/// The update is conditional on the current status so that two concurrent
/// settlements cannot both confirm the same booking.
pub(super) async fn confirm_booking<C: ConnectionTrait>(
    db: &C,
    booking_id: Uuid,
    deposit_status: DepositStatus,
    payment_method: Option<PaymentMethod>,
    promo_code: Option<&str>,
    now: DateTime<Utc>,
) -> ResultEngine<()> {
    let mut update = bookings::Entity::update_many()
        .col_expr(
            bookings::Column::Status,
            Expr::value(BookingStatus::Confirmed.as_str()),
        )
        .col_expr(
            bookings::Column::DepositStatus,
            Expr::value(deposit_status.as_str()),
        )
        .col_expr(bookings::Column::UpdatedAt, Expr::value(now));
    if let Some(method) = payment_method {
        update = update.col_expr(bookings::Column::PaymentMethod, Expr::value(method.as_str()));
    }
    if let Some(code) = promo_code {
        update = update.col_expr(bookings::Column::PromoCode, Expr::value(code));
    }

    let result = update
        .filter(bookings::Column::Id.eq(booking_id.to_string()))
        .filter(bookings::Column::Status.eq(BookingStatus::PaymentPending.as_str()))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(EngineError::InvalidState(format!(
            "booking {booking_id} is no longer awaiting payment"
        )));
    }
    Ok(())
}

/// Redeems a deposit-skip promo code inside a savepoint.
///
/// Returns `false` when the code does not apply, including lookup errors
/// and lost races on the usage counter; the outer transaction is untouched
/// in that case.
async fn try_redeem_deposit_waiver(
    db_tx: &DatabaseTransaction,
    code: &str,
    now: DateTime<Utc>,
) -> bool {
    let savepoint = match db_tx.begin().await {
        Ok(savepoint) => savepoint,
        Err(err) => {
            tracing::warn!("promo code {code} not applied: {err}");
            return false;
        }
    };
    match redeem_deposit_waiver(&savepoint, code, now).await {
        Ok(true) => match savepoint.commit().await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!("promo code {code} not applied: {err}");
                false
            }
        },
        Ok(false) => {
            if let Err(err) = savepoint.rollback().await {
                tracing::warn!("failed to roll back promo savepoint: {err}");
            }
            false
        }
        Err(err) => {
            tracing::warn!("promo code {code} not applied: {err}");
            if let Err(err) = savepoint.rollback().await {
                tracing::warn!("failed to roll back promo savepoint: {err}");
            }
            false
        }
    }
}

async fn redeem_deposit_waiver(
    db: &DatabaseTransaction,
    code: &str,
    now: DateTime<Utc>,
) -> ResultEngine<bool> {
    let Some(model) = promo_codes::Entity::find()
        .filter(promo_codes::Column::Code.eq(code))
        .one(db)
        .await?
    else {
        tracing::debug!("promo code {code} not found");
        return Ok(false);
    };
    let promo = PromoCode::try_from(model)?;
    if let Err(reason) = promo.waives_deposit(now) {
        tracing::debug!("promo code {code} not applicable: {reason}");
        return Ok(false);
    }

    let result = promo_codes::Entity::update_many()
        .col_expr(
            promo_codes::Column::UsageCount,
            Expr::col(promo_codes::Column::UsageCount).add(1),
        )
        .col_expr(promo_codes::Column::LastUsedAt, Expr::value(now))
        .filter(promo_codes::Column::Id.eq(promo.id.to_string()))
        .filter(promo_codes::Column::UsageCount.eq(promo.usage_count))
        .exec(db)
        .await?;
    if result.rows_affected != 1 {
        tracing::warn!("promo code {code} was redeemed concurrently");
        return Ok(false);
    }
    Ok(true)
}
