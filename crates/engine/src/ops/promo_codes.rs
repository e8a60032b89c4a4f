use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    EngineError, NewPromoCodeCmd, PromoCode, PromoRejection, ResultEngine, normalize_code,
    promo_codes, util::normalize_optional_text,
};

use super::{Engine, with_tx};

/// Read-only evaluation of a promo code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromoCodeCheck {
    /// Normalized code that was looked up.
    pub code: String,
    pub skip_deposit: bool,
    pub valid_until: Option<DateTime<Utc>>,
    /// `None` when the code can be applied right now.
    pub rejection: Option<PromoRejection>,
}

impl PromoCodeCheck {
    pub fn is_valid(&self) -> bool {
        self.rejection.is_none()
    }
}

impl Engine {
    /// Evaluate a code without redeeming it.
    pub async fn promo_code_status(&self, raw: &str) -> ResultEngine<PromoCodeCheck> {
        let code = normalize_code(raw)?;
        let now = Utc::now();
        let check = match self.find_promo_code(&code).await? {
            Some(promo) => PromoCodeCheck {
                skip_deposit: promo.skip_deposit,
                valid_until: promo.valid_until,
                rejection: promo.availability(now).err(),
                code,
            },
            None => PromoCodeCheck {
                code,
                skip_deposit: false,
                valid_until: None,
                rejection: Some(PromoRejection::NotFound),
            },
        };
        Ok(check)
    }

    /// Return a promo code by its (raw) code.
    pub async fn promo_code(&self, raw: &str) -> ResultEngine<PromoCode> {
        let code = normalize_code(raw)?;
        self.find_promo_code(&code)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("promo code {code}")))
    }

    /// Create a promo code. Codes are unique once normalized.
    pub async fn new_promo_code(&self, cmd: NewPromoCodeCmd) -> ResultEngine<Uuid> {
        let code = normalize_code(&cmd.code)?;
        if let Some(max_uses) = cmd.max_uses
            && max_uses <= 0
        {
            return Err(EngineError::InvalidCode(format!(
                "max uses must be positive, got {max_uses}"
            )));
        }
        if let (Some(from), Some(until)) = (cmd.valid_from, cmd.valid_until)
            && from > until
        {
            return Err(EngineError::InvalidCode(
                "valid_from must not be after valid_until".to_string(),
            ));
        }

        let promo = PromoCode {
            id: Uuid::new_v4(),
            code,
            description: normalize_optional_text(cmd.description.as_deref()),
            active: true,
            skip_deposit: cmd.skip_deposit,
            valid_from: cmd.valid_from,
            valid_until: cmd.valid_until,
            usage_count: 0,
            max_uses: cmd.max_uses,
            last_used_at: None,
            created_at: Utc::now(),
        };
        with_tx!(self, |db_tx| {
            let exists = promo_codes::Entity::find()
                .filter(promo_codes::Column::Code.eq(promo.code.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(promo.code.clone()));
            }
            promo_codes::ActiveModel::from(&promo).insert(&db_tx).await?;
            Ok(promo.id)
        })
    }

    /// Deactivate a promo code. Deactivating twice is a no-op.
    pub async fn deactivate_promo_code(&self, raw: &str) -> ResultEngine<()> {
        let code = normalize_code(raw)?;
        with_tx!(self, |db_tx| {
            let result = promo_codes::Entity::update_many()
                .col_expr(promo_codes::Column::Active, Expr::value(false))
                .filter(promo_codes::Column::Code.eq(code.clone()))
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::KeyNotFound(format!("promo code {code}")));
            }
            Ok(())
        })
    }

    /// List promo codes, newest first.
    pub async fn list_promo_codes(&self, active_only: bool) -> ResultEngine<Vec<PromoCode>> {
        let mut query = promo_codes::Entity::find();
        if active_only {
            query = query.filter(promo_codes::Column::Active.eq(true));
        }
        query
            .order_by_desc(promo_codes::Column::CreatedAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(PromoCode::try_from)
            .collect()
    }

    async fn find_promo_code(&self, code: &str) -> ResultEngine<Option<PromoCode>> {
        promo_codes::Entity::find()
            .filter(promo_codes::Column::Code.eq(code))
            .one(&self.database)
            .await?
            .map(PromoCode::try_from)
            .transpose()
    }
}
