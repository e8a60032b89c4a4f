use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    DepositStatus, EngineError, PaymentMethod, PaymentStatus, ResultEngine, payments,
    util::parse_uuid,
};

use super::{Engine, deposits::confirm_booking, with_tx};

/// Effect of a checkout event on the stored payment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckoutSettlement {
    /// The pending payment was updated.
    Settled { booking_id: Uuid, payment_id: Uuid },
    /// The payment had already left `PENDING`; nothing changed.
    AlreadySettled { booking_id: Uuid, payment_id: Uuid },
    /// No payment references this session.
    UnknownSession,
}

impl Engine {
    /// Record a completed checkout: the payment is completed and its booking
    /// confirmed with the deposit paid.
    ///
    /// Redelivered events are acknowledged without further changes.
    pub async fn complete_checkout(
        &self,
        session_id: &str,
        payment_intent_id: Option<&str>,
    ) -> ResultEngine<CheckoutSettlement> {
        let now = Utc::now();
        let settlement = with_tx!(self, |db_tx| {
            settle_session(
                &db_tx,
                session_id,
                PaymentStatus::Completed,
                payment_intent_id,
                now,
            )
            .await
        })?;
        match settlement {
            CheckoutSettlement::Settled { booking_id, .. } => {
                tracing::info!("checkout session {session_id} paid booking {booking_id}");
            }
            CheckoutSettlement::AlreadySettled { payment_id, .. } => {
                tracing::info!("checkout session {session_id} already settled payment {payment_id}");
            }
            CheckoutSettlement::UnknownSession => {
                tracing::warn!("checkout session {session_id} has no payment");
            }
        }
        Ok(settlement)
    }

    /// Record an expired checkout: the pending payment is cancelled and the
    /// booking keeps awaiting its deposit.
    pub async fn expire_checkout(&self, session_id: &str) -> ResultEngine<CheckoutSettlement> {
        let now = Utc::now();
        let settlement = with_tx!(self, |db_tx| {
            settle_session(&db_tx, session_id, PaymentStatus::Cancelled, None, now).await
        })?;
        if settlement == CheckoutSettlement::UnknownSession {
            tracing::warn!("checkout session {session_id} has no payment");
        }
        Ok(settlement)
    }
}

async fn settle_session(
    db_tx: &DatabaseTransaction,
    session_id: &str,
    status: PaymentStatus,
    payment_intent_id: Option<&str>,
    now: DateTime<Utc>,
) -> ResultEngine<CheckoutSettlement> {
    let Some(model) = payments::Entity::find()
        .filter(payments::Column::CheckoutSessionId.eq(session_id))
        .one(db_tx)
        .await?
    else {
        return Ok(CheckoutSettlement::UnknownSession);
    };
    let payment_id = parse_uuid(&model.id, "payment")?;
    let booking_id = parse_uuid(&model.booking_id, "booking")?;

    let mut update = payments::Entity::update_many()
        .col_expr(payments::Column::Status, Expr::value(status.as_str()))
        .col_expr(payments::Column::UpdatedAt, Expr::value(now));
    if let Some(intent) = payment_intent_id {
        update = update.col_expr(payments::Column::PaymentIntentId, Expr::value(intent));
    }
    let result = update
        .filter(payments::Column::Id.eq(model.id.clone()))
        .filter(payments::Column::Status.eq(PaymentStatus::Pending.as_str()))
        .exec(db_tx)
        .await?;
    if result.rows_affected == 0 {
        return Ok(CheckoutSettlement::AlreadySettled {
            booking_id,
            payment_id,
        });
    }

    if status == PaymentStatus::Completed {
        match confirm_booking(
            db_tx,
            booking_id,
            DepositStatus::Paid,
            Some(PaymentMethod::StripeOnline),
            None,
            now,
        )
        .await
        {
            Ok(()) => {}
            // Paid after the booking was settled some other way; the payment
            // is still recorded.
            Err(EngineError::InvalidState(reason)) => {
                tracing::warn!("checkout session {session_id} paid: {reason}");
            }
            Err(err) => return Err(err),
        }
    }
    Ok(CheckoutSettlement::Settled {
        booking_id,
        payment_id,
    })
}
