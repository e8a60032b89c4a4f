use std::{fmt, str::FromStr};

use crate::{Currency, EngineError};

/// Non-negative money amount represented as **integer minor units** (cents).
///
/// Use this type for prices, deposits and payment amounts to avoid
/// floating-point drift. Conversion to major units only happens at the edges
/// (JSON responses, gateway metadata).
///
/// # Examples
///
/// ```rust
/// use engine::Money;
///
/// let deposit = Money::new(25_00);
/// assert_eq!(deposit.minor(), 2500);
/// assert_eq!(deposit.to_string(), "$25.00");
/// ```
///
/// Parsing from operator input (accepts `.` or `,` as decimal separator;
/// rejects more than 2 decimals and negative values):
///
/// ```rust
/// use engine::Money;
///
/// assert_eq!("25".parse::<Money>().unwrap().minor(), 2500);
/// assert_eq!("12,5".parse::<Money>().unwrap().minor(), 1250);
/// assert!("-1".parse::<Money>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Creates a new amount from minor units.
    #[must_use]
    pub const fn new(minor: i64) -> Self {
        Self(minor)
    }

    /// Returns the raw value in minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Amount in major units, for JSON consumers that expect `25.0`.
    #[must_use]
    pub fn to_major(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Plain decimal representation without currency symbol (`"25.00"`).
    #[must_use]
    pub fn decimal(self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        format!("{sign}{}.{:02}", abs / 100, abs % 100)
    }

    pub(crate) fn ensure_non_negative(self, label: &str) -> Result<Self, EngineError> {
        if self.0 < 0 {
            return Err(EngineError::InvalidAmount(format!(
                "{label} must not be negative"
            )));
        }
        Ok(self)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let decimal = self.decimal();
        match decimal.strip_prefix('-') {
            Some(abs) => write!(f, "-{}{abs}", Currency::Usd.symbol()),
            None => write!(f, "{}{decimal}", Currency::Usd.symbol()),
        }
    }
}

impl FromStr for Money {
    type Err = EngineError;

    /// Parses a decimal string into minor units.
    ///
    /// Accepts `.` or `,` as decimal separator, an optional leading `$` and
    /// an optional leading `+`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidAmount(format!("invalid amount: {}", s.trim()));
        let overflow = || EngineError::InvalidAmount("amount too large".to_string());

        let trimmed = s.trim();
        if trimmed.starts_with('-') {
            return Err(EngineError::InvalidAmount(
                "amount must not be negative".to_string(),
            ));
        }
        let rest = trimmed.strip_prefix('+').unwrap_or(trimmed);
        let rest = rest.strip_prefix(Currency::Usd.symbol()).unwrap_or(rest).trim();
        if rest.is_empty() {
            return Err(EngineError::InvalidAmount("empty amount".to_string()));
        }

        let rest = rest.replace(',', ".");
        let (major_str, minor_str) = match rest.split_once('.') {
            Some((major, minor)) => (major, Some(minor)),
            None => (rest.as_str(), None),
        };

        if major_str.is_empty() || !major_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let major: i64 = major_str.parse().map_err(|_| overflow())?;

        let minor: i64 = match minor_str {
            None | Some("") => 0,
            Some(frac) if !frac.chars().all(|c| c.is_ascii_digit()) => return Err(invalid()),
            Some(frac) if frac.len() == 1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
            Some(frac) if frac.len() == 2 => frac.parse::<i64>().map_err(|_| invalid())?,
            Some(_) => {
                return Err(EngineError::InvalidAmount("too many decimals".to_string()));
            }
        };

        major
            .checked_mul(100)
            .and_then(|v| v.checked_add(minor))
            .map(Money)
            .ok_or_else(overflow)
    }
}
