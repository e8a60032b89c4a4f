use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    Booking, EngineError, NewServiceCmd, Payment, ResultEngine, Service, bookings, payments,
    services,
    util::{normalize_email, normalize_required},
};

use super::{Engine, with_tx};

impl Engine {
    /// Register a bookable service and return its id.
    pub async fn new_service(&self, cmd: NewServiceCmd) -> ResultEngine<Uuid> {
        let name = normalize_required(&cmd.name, "service name")?;
        let base_price = cmd.base_price.ensure_non_negative("base price")?;
        let deposit_amount = cmd
            .deposit_amount
            .map(|amount| amount.ensure_non_negative("deposit"))
            .transpose()?;
        if let Some(deposit) = deposit_amount
            && deposit > base_price
        {
            return Err(EngineError::InvalidAmount(format!(
                "deposit {deposit} exceeds base price {base_price}"
            )));
        }

        let service = Service {
            id: Uuid::new_v4(),
            name,
            base_price,
            deposit_amount,
            requires_deposit: cmd.requires_deposit,
        };
        with_tx!(self, |db_tx| {
            services::ActiveModel::from(&service).insert(&db_tx).await?;
            Ok(service.id)
        })
    }

    /// Return a service snapshot from DB.
    pub async fn service(&self, service_id: Uuid) -> ResultEngine<Service> {
        let model = services::Entity::find_by_id(service_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("service not exists".to_string()))?;
        Service::try_from(model)
    }

    /// Create a booking awaiting its deposit.
    pub async fn new_booking(&self, service_id: Uuid, customer_email: &str) -> ResultEngine<Uuid> {
        let customer_email = normalize_email(customer_email)?;
        with_tx!(self, |db_tx| {
            let exists = services::Entity::find_by_id(service_id.to_string())
                .one(&db_tx)
                .await?
                .is_some();
            if !exists {
                return Err(EngineError::KeyNotFound("service not exists".to_string()));
            }
            let booking = Booking::new(service_id, customer_email, Utc::now());
            bookings::ActiveModel::from(&booking).insert(&db_tx).await?;
            Ok(booking.id)
        })
    }

    /// Return a booking snapshot from DB.
    pub async fn booking(&self, booking_id: Uuid) -> ResultEngine<Booking> {
        let model = bookings::Entity::find_by_id(booking_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("booking not exists".to_string()))?;
        Booking::try_from(model)
    }

    /// Payments recorded for a booking, oldest first.
    pub async fn payments_for_booking(&self, booking_id: Uuid) -> ResultEngine<Vec<Payment>> {
        payments::Entity::find()
            .filter(payments::Column::BookingId.eq(booking_id.to_string()))
            .order_by_asc(payments::Column::CreatedAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Payment::try_from)
            .collect()
    }

    pub(super) async fn require_booking_with_service<C: ConnectionTrait>(
        &self,
        db: &C,
        booking_id: Uuid,
    ) -> ResultEngine<(Booking, Service)> {
        let (booking, service) = bookings::Entity::find_by_id(booking_id.to_string())
            .find_also_related(services::Entity)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("booking not exists".to_string()))?;
        let service =
            service.ok_or_else(|| EngineError::KeyNotFound("service not exists".to_string()))?;
        Ok((Booking::try_from(booking)?, Service::try_from(service)?))
    }
}
