//! Payment records.
//!
//! A `Payment` is written once per deposit attempt in `PENDING`. Cash
//! payments stay pending until collected; checkout payments are settled by
//! the gateway webhook.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{Currency, EngineError, Money, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl TryFrom<&str> for PaymentStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "PENDING" => Ok(Self::Pending),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(EngineError::CorruptRecord(format!(
                "invalid payment status: {other}"
            ))),
        }
    }
}

/// Channel the money moves through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaymentChannel {
    CashOnService,
    StripeCheckout,
}

impl PaymentChannel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CashOnService => "CASH_ON_SERVICE",
            Self::StripeCheckout => "STRIPE_CHECKOUT",
        }
    }
}

impl TryFrom<&str> for PaymentChannel {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "CASH_ON_SERVICE" => Ok(Self::CashOnService),
            "STRIPE_CHECKOUT" => Ok(Self::StripeCheckout),
            other => Err(EngineError::CorruptRecord(format!(
                "invalid payment channel: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub amount: Money,
    pub currency: Currency,
    pub status: PaymentStatus,
    pub channel: PaymentChannel,
    pub payment_intent_id: Option<String>,
    pub checkout_session_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// A new `PENDING` payment.
    pub fn pending(
        booking_id: Uuid,
        amount: Money,
        channel: PaymentChannel,
        notes: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            booking_id,
            amount,
            currency: Currency::default(),
            status: PaymentStatus::Pending,
            channel,
            payment_intent_id: None,
            checkout_session_id: None,
            notes: Some(notes),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub booking_id: String,
    pub amount_minor: i64,
    pub currency: String,
    pub status: String,
    pub payment_method: String,
    pub payment_intent_id: Option<String>,
    pub checkout_session_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bookings::Entity",
        from = "Column::BookingId",
        to = "super::bookings::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Bookings,
}

impl Related<super::bookings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Payment> for ActiveModel {
    fn from(value: &Payment) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            booking_id: ActiveValue::Set(value.booking_id.to_string()),
            amount_minor: ActiveValue::Set(value.amount.minor()),
            currency: ActiveValue::Set(value.currency.code().to_string()),
            status: ActiveValue::Set(value.status.as_str().to_string()),
            payment_method: ActiveValue::Set(value.channel.as_str().to_string()),
            payment_intent_id: ActiveValue::Set(value.payment_intent_id.clone()),
            checkout_session_id: ActiveValue::Set(value.checkout_session_id.clone()),
            notes: ActiveValue::Set(value.notes.clone()),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

impl TryFrom<Model> for Payment {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "payment")?,
            booking_id: parse_uuid(&model.booking_id, "booking")?,
            amount: Money::new(model.amount_minor),
            currency: Currency::try_from(model.currency.as_str())?,
            status: PaymentStatus::try_from(model.status.as_str())?,
            channel: PaymentChannel::try_from(model.payment_method.as_str())?,
            payment_intent_id: model.payment_intent_id,
            checkout_session_id: model.checkout_session_id,
            notes: model.notes,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
