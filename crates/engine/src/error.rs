//! The module contains the errors the engine can throw.
//!
//! The errors the HTTP layer cares about most are:
//!
//! - [`KeyNotFound`] thrown when a booking, service or promo code is missing.
//! - [`InvalidState`] thrown when a booking is not awaiting its deposit.
//! - [`GatewayUnavailable`] thrown when online payments are not configured.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`InvalidState`]: EngineError::InvalidState
//!  [`GatewayUnavailable`]: EngineError::GatewayUnavailable
use sea_orm::DbErr;
use thiserror::Error;

use crate::gateway::GatewayError;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid code: {0}")]
    InvalidCode(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// A stored row could not be decoded.
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),
    #[error("Payment gateway unavailable: {0}")]
    GatewayUnavailable(String),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidState(a), Self::InvalidState(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidCode(a), Self::InvalidCode(b)) => a == b,
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::CorruptRecord(a), Self::CorruptRecord(b)) => a == b,
            (Self::GatewayUnavailable(a), Self::GatewayUnavailable(b)) => a == b,
            (Self::Gateway(a), Self::Gateway(b)) => a.to_string() == b.to_string(),
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
