//! Promo codes.
//!
//! Codes are case-insensitive: they are normalized (NFKC, trimmed,
//! uppercased) before being stored or looked up.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::parse_uuid};

/// Why a promo code cannot be applied right now.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromoRejection {
    NotFound,
    Inactive,
    NotYetValid,
    Expired,
    UsageLimitReached,
}

impl PromoRejection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Inactive => "inactive",
            Self::NotYetValid => "not_yet_valid",
            Self::Expired => "expired",
            Self::UsageLimitReached => "usage_limit_reached",
        }
    }
}

/// Normalize user input into the stored form of a code.
pub fn normalize_code(raw: &str) -> ResultEngine<String> {
    let code: String = raw.nfkc().collect::<String>().trim().to_uppercase();
    if code.is_empty() {
        return Err(EngineError::InvalidCode(
            "promo code must not be empty".to_string(),
        ));
    }
    if code.chars().any(char::is_whitespace) {
        return Err(EngineError::InvalidCode(format!(
            "promo code must not contain spaces: {code}"
        )));
    }
    Ok(code)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromoCode {
    pub id: Uuid,
    pub code: String,
    pub description: Option<String>,
    pub active: bool,
    /// Whether the code waives the booking deposit entirely.
    pub skip_deposit: bool,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub usage_count: i32,
    pub max_uses: Option<i32>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PromoCode {
    /// Checks activity, validity window and usage limit at `now`.
    ///
    /// Both window bounds are inclusive and each is optional.
    pub fn availability(&self, now: DateTime<Utc>) -> Result<(), PromoRejection> {
        if !self.active {
            return Err(PromoRejection::Inactive);
        }
        if let Some(from) = self.valid_from
            && now < from
        {
            return Err(PromoRejection::NotYetValid);
        }
        if let Some(until) = self.valid_until
            && now > until
        {
            return Err(PromoRejection::Expired);
        }
        if let Some(max_uses) = self.max_uses
            && self.usage_count >= max_uses
        {
            return Err(PromoRejection::UsageLimitReached);
        }
        Ok(())
    }

    /// Checks whether the code can waive a deposit at `now`.
    ///
    /// On refusal the error names the reason, for logging.
    pub fn waives_deposit(&self, now: DateTime<Utc>) -> Result<(), &'static str> {
        if !self.skip_deposit {
            return Err("does not waive deposits");
        }
        self.availability(now).map_err(PromoRejection::as_str)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "promo_codes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub code: String,
    pub description: Option<String>,
    pub active: bool,
    pub skip_deposit: bool,
    pub valid_from: Option<DateTimeUtc>,
    pub valid_until: Option<DateTimeUtc>,
    pub usage_count: i32,
    pub max_uses: Option<i32>,
    pub last_used_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&PromoCode> for ActiveModel {
    fn from(value: &PromoCode) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            code: ActiveValue::Set(value.code.clone()),
            description: ActiveValue::Set(value.description.clone()),
            active: ActiveValue::Set(value.active),
            skip_deposit: ActiveValue::Set(value.skip_deposit),
            valid_from: ActiveValue::Set(value.valid_from),
            valid_until: ActiveValue::Set(value.valid_until),
            usage_count: ActiveValue::Set(value.usage_count),
            max_uses: ActiveValue::Set(value.max_uses),
            last_used_at: ActiveValue::Set(value.last_used_at),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<Model> for PromoCode {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "promo code")?,
            code: model.code,
            description: model.description,
            active: model.active,
            skip_deposit: model.skip_deposit,
            valid_from: model.valid_from,
            valid_until: model.valid_until,
            usage_count: model.usage_count,
            max_uses: model.max_uses,
            last_used_at: model.last_used_at,
            created_at: model.created_at,
        })
    }
}
