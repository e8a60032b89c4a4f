use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{PaymentGateway, ResultEngine};

mod catalog;
mod checkout;
mod deposits;
mod promo_codes;

pub use checkout::CheckoutSettlement;
pub use deposits::{CHECKOUT_SESSION_TTL, CheckoutUrls, DepositOutcome};
pub use promo_codes::PromoCodeCheck;

const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    gateway: Option<Arc<dyn PaymentGateway>>,
    base_url: String,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Whether online checkout is configured.
    pub fn has_gateway(&self) -> bool {
        self.gateway.is_some()
    }

    /// Cheap round trip to the database, used by health checks.
    pub async fn ping(&self) -> ResultEngine<()> {
        self.database.ping().await?;
        Ok(())
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    gateway: Option<Arc<dyn PaymentGateway>>,
    base_url: Option<String>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Pass the hosted checkout provider. Without one, online deposits are
    /// refused as unavailable.
    pub fn gateway(mut self, gateway: Arc<dyn PaymentGateway>) -> EngineBuilder {
        self.gateway = Some(gateway);
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> EngineBuilder {
        self.base_url = Some(base_url.into());
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let base_url = self
            .base_url
            .as_deref()
            .map(|url| url.trim().trim_end_matches('/'))
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_BASE_URL)
            .to_string();
        Ok(Engine {
            database: self.database,
            gateway: self.gateway,
            base_url,
        })
    }
}
