//! Command structs for engine operations.
//!
//! These types group parameters for write operations (deposit creation,
//! catalog bootstrap, promo management), keeping call sites readable and
//! avoiding long argument lists.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Money, PaymentMethod};

/// Settle the deposit of a booking.
#[derive(Clone, Debug)]
pub struct DepositCmd {
    pub booking_id: Uuid,
    pub payment_method: PaymentMethod,
    pub promo_code: Option<String>,
    /// Absolute URL the hosted checkout returns to, overriding the defaults.
    pub return_url: Option<String>,
}

impl DepositCmd {
    #[must_use]
    pub fn new(booking_id: Uuid, payment_method: PaymentMethod) -> Self {
        Self {
            booking_id,
            payment_method,
            promo_code: None,
            return_url: None,
        }
    }

    #[must_use]
    pub fn promo_code(mut self, code: impl Into<String>) -> Self {
        self.promo_code = Some(code.into());
        self
    }

    #[must_use]
    pub fn return_url(mut self, url: impl Into<String>) -> Self {
        self.return_url = Some(url.into());
        self
    }
}

/// Register a bookable service.
#[derive(Clone, Debug)]
pub struct NewServiceCmd {
    pub name: String,
    pub base_price: Money,
    pub deposit_amount: Option<Money>,
    pub requires_deposit: bool,
}

impl NewServiceCmd {
    #[must_use]
    pub fn new(name: impl Into<String>, base_price: Money) -> Self {
        Self {
            name: name.into(),
            base_price,
            deposit_amount: None,
            requires_deposit: false,
        }
    }

    /// Require a deposit of `amount` up front.
    #[must_use]
    pub fn deposit(mut self, amount: Money) -> Self {
        self.deposit_amount = Some(amount);
        self.requires_deposit = true;
        self
    }

    #[must_use]
    pub fn requires_deposit(mut self, requires_deposit: bool) -> Self {
        self.requires_deposit = requires_deposit;
        self
    }
}

/// Create a promo code.
#[derive(Clone, Debug)]
pub struct NewPromoCodeCmd {
    pub code: String,
    pub description: Option<String>,
    pub skip_deposit: bool,
    pub max_uses: Option<i32>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
}

impl NewPromoCodeCmd {
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: None,
            skip_deposit: false,
            max_uses: None,
            valid_from: None,
            valid_until: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn skip_deposit(mut self, skip_deposit: bool) -> Self {
        self.skip_deposit = skip_deposit;
        self
    }

    #[must_use]
    pub fn max_uses(mut self, max_uses: i32) -> Self {
        self.max_uses = Some(max_uses);
        self
    }

    #[must_use]
    pub fn valid_from(mut self, at: DateTime<Utc>) -> Self {
        self.valid_from = Some(at);
        self
    }

    #[must_use]
    pub fn valid_until(mut self, at: DateTime<Utc>) -> Self {
        self.valid_until = Some(at);
        self
    }
}
