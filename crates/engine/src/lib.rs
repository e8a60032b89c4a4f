//! Booking deposit engine.
//!
//! The engine owns the database access for bookings, services, promo codes
//! and payments, and implements the deposit policy: whether a booking needs
//! a deposit, whether a promo code waives it, and how the deposit is paid.

pub use bookings::{Booking, BookingStatus, DepositStatus, PaymentMethod};
pub use commands::{DepositCmd, NewPromoCodeCmd, NewServiceCmd};
pub use currency::Currency;
pub use error::EngineError;
pub use gateway::{CheckoutRequest, CheckoutSession, GatewayError, PaymentGateway};
pub use money::Money;
pub use ops::{
    CHECKOUT_SESSION_TTL, CheckoutSettlement, CheckoutUrls, DepositOutcome, Engine,
    EngineBuilder, PromoCodeCheck,
};
pub use payments::{Payment, PaymentChannel, PaymentStatus};
pub use promo_codes::{PromoCode, PromoRejection, normalize_code};
pub use services::Service;

mod bookings;
mod commands;
mod currency;
mod error;
mod gateway;
mod money;
mod ops;
mod payments;
mod promo_codes;
mod services;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
