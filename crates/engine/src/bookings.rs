//! Booking primitives.
//!
//! A `Booking` is created upstream in `PAYMENT_PENDING` and advanced by the
//! deposit flow (or by the checkout webhook) to `CONFIRMED`.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BookingStatus {
    PaymentPending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PaymentPending => "PAYMENT_PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Cancelled => "CANCELLED",
            Self::Completed => "COMPLETED",
        }
    }
}

impl core::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for BookingStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "PAYMENT_PENDING" => Ok(Self::PaymentPending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "CANCELLED" => Ok(Self::Cancelled),
            "COMPLETED" => Ok(Self::Completed),
            other => Err(EngineError::CorruptRecord(format!(
                "invalid booking status: {other}"
            ))),
        }
    }
}

/// Outcome of the deposit for a booking.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DepositStatus {
    /// Still waiting for the customer to pay.
    Pending,
    NotRequired,
    WaivedPromo,
    /// Collected in person when the service is delivered.
    CashOnService,
    Paid,
}

impl DepositStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::NotRequired => "NOT_REQUIRED",
            Self::WaivedPromo => "WAIVED_PROMO",
            Self::CashOnService => "CASH_ON_SERVICE",
            Self::Paid => "PAID",
        }
    }
}

impl TryFrom<&str> for DepositStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "PENDING" => Ok(Self::Pending),
            "NOT_REQUIRED" => Ok(Self::NotRequired),
            "WAIVED_PROMO" => Ok(Self::WaivedPromo),
            "CASH_ON_SERVICE" => Ok(Self::CashOnService),
            "PAID" => Ok(Self::Paid),
            other => Err(EngineError::CorruptRecord(format!(
                "invalid deposit status: {other}"
            ))),
        }
    }
}

/// How the customer chose to pay the deposit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaymentMethod {
    StripeOnline,
    CashOnService,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StripeOnline => "STRIPE_ONLINE",
            Self::CashOnService => "CASH_ON_SERVICE",
        }
    }
}

impl TryFrom<&str> for PaymentMethod {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "STRIPE_ONLINE" => Ok(Self::StripeOnline),
            "CASH_ON_SERVICE" => Ok(Self::CashOnService),
            other => Err(EngineError::CorruptRecord(format!(
                "invalid payment method: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Booking {
    pub id: Uuid,
    pub service_id: Uuid,
    pub customer_email: String,
    pub status: BookingStatus,
    pub deposit_status: DepositStatus,
    pub payment_method: Option<PaymentMethod>,
    /// Promo code applied to the deposit, stored normalized.
    pub promo_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(service_id: Uuid, customer_email: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            service_id,
            customer_email,
            status: BookingStatus::PaymentPending,
            deposit_status: DepositStatus::Pending,
            payment_method: None,
            promo_code: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub service_id: String,
    pub customer_email: String,
    pub status: String,
    pub deposit_status: String,
    pub payment_method: Option<String>,
    pub promo_code: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::services::Entity",
        from = "Column::ServiceId",
        to = "super::services::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Services,
    #[sea_orm(has_many = "super::payments::Entity")]
    Payments,
}

impl Related<super::services::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Services.def()
    }
}

impl Related<super::payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Booking> for ActiveModel {
    fn from(value: &Booking) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            service_id: ActiveValue::Set(value.service_id.to_string()),
            customer_email: ActiveValue::Set(value.customer_email.clone()),
            status: ActiveValue::Set(value.status.as_str().to_string()),
            deposit_status: ActiveValue::Set(value.deposit_status.as_str().to_string()),
            payment_method: ActiveValue::Set(
                value.payment_method.map(|m| m.as_str().to_string()),
            ),
            promo_code: ActiveValue::Set(value.promo_code.clone()),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

impl TryFrom<Model> for Booking {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "booking")?,
            service_id: parse_uuid(&model.service_id, "service")?,
            customer_email: model.customer_email,
            status: BookingStatus::try_from(model.status.as_str())?,
            deposit_status: DepositStatus::try_from(model.deposit_status.as_str())?,
            payment_method: model
                .payment_method
                .as_deref()
                .map(PaymentMethod::try_from)
                .transpose()?,
            promo_code: model.promo_code,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
