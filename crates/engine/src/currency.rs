use crate::EngineError;

/// Currency used for service prices, deposits and payments.
///
/// The business bills in US dollars only, but the currency is stored next to
/// every payment so the gateway and the ledger always agree on it.
///
/// ## Minor units
///
/// Amounts are stored as an `i64` number of **minor units** (see `Money`).
/// Example: USD has 2 minor units, so `25.00 USD` ⇄ `2500`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Currency {
    #[default]
    Usd,
}

impl Currency {
    /// Canonical currency code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Currency::Usd => "USD",
        }
    }

    /// Lowercase code, as the payment gateway expects it.
    #[must_use]
    pub const fn gateway_code(self) -> &'static str {
        match self {
            Currency::Usd => "usd",
        }
    }

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Currency::Usd => "$",
        }
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for Currency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            other => Err(EngineError::CorruptRecord(format!(
                "unsupported currency: {other}"
            ))),
        }
    }
}
