//! The module contains the bookable `Service` and its pricing.

use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{EngineError, Money, util::parse_uuid};

/// A bookable service.
///
/// The deposit policy lives here: `requires_deposit` decides whether the
/// booking flow asks for money up front, `deposit_amount` how much.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    pub base_price: Money,
    pub deposit_amount: Option<Money>,
    pub requires_deposit: bool,
}

impl Service {
    /// Deposit to collect, treating a missing amount as zero.
    #[must_use]
    pub fn deposit(&self) -> Money {
        self.deposit_amount.unwrap_or(Money::ZERO)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "services")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub base_price_minor: i64,
    pub deposit_amount_minor: Option<i64>,
    pub requires_deposit: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bookings::Entity")]
    Bookings,
}

impl Related<super::bookings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Service> for ActiveModel {
    fn from(value: &Service) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            name: ActiveValue::Set(value.name.clone()),
            base_price_minor: ActiveValue::Set(value.base_price.minor()),
            deposit_amount_minor: ActiveValue::Set(value.deposit_amount.map(Money::minor)),
            requires_deposit: ActiveValue::Set(value.requires_deposit),
        }
    }
}

impl TryFrom<Model> for Service {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "service")?,
            name: model.name,
            base_price: Money::new(model.base_price_minor),
            deposit_amount: model.deposit_amount_minor.map(Money::new),
            requires_deposit: model.requires_deposit,
        })
    }
}
