use std::sync::Arc;

use gateway::StripeClient;
use migration::{Migrator, MigratorTrait};
use settings::{Database, Payments};

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "bookpay={level},server={level},engine={level},gateway={level}",
            level = settings.app.level
        ))
        .init();

    let Some(server) = settings.server else {
        tracing::warn!("No server settings found, nothing to run");
        return Ok(());
    };
    tracing::info!("Found server settings...");

    let db = parse_database(&server.database).await?;
    let engine = build_engine(db, &settings.payments).await?;

    let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    server::run_with_listener(engine, settings.payments.stripe_webhook_secret, listener).await?;

    Ok(())
}

async fn build_engine(
    db: sea_orm::DatabaseConnection,
    payments: &Payments,
) -> Result<engine::Engine, Box<dyn std::error::Error + Send + Sync>> {
    let mut builder = engine::Engine::builder().database(db);
    if let Some(base_url) = &payments.base_url {
        builder = builder.base_url(base_url);
    }

    match payments
        .stripe_secret_key
        .as_deref()
        .filter(|key| !key.trim().is_empty())
    {
        Some(secret_key) => {
            let mut client = StripeClient::new(secret_key);
            if let Some(api_base) = &payments.stripe_api_base {
                client = client.with_api_base(api_base);
            }
            tracing::info!("Stripe checkout enabled");
            builder = builder.gateway(Arc::new(client));
        }
        None => tracing::warn!("No Stripe secret key, online deposits are disabled"),
    }

    Ok(builder.build().await?)
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
