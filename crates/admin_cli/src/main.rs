use std::error::Error;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use engine::{Engine, EngineError, Money, NewPromoCodeCmd, NewServiceCmd, PromoCode};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "bookpay_admin")]
#[command(about = "Admin utilities for Bookpay (bootstrap services/bookings/promo codes)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./bookpay.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Service(Service),
    Booking(Booking),
    Promo(Promo),
}

#[derive(Args, Debug)]
struct Service {
    #[command(subcommand)]
    command: ServiceCommand,
}

#[derive(Subcommand, Debug)]
enum ServiceCommand {
    Create(ServiceCreateArgs),
}

#[derive(Args, Debug)]
struct ServiceCreateArgs {
    #[arg(long)]
    name: String,
    /// Base price, e.g. `150` or `149,90`.
    #[arg(long)]
    price: Money,
    /// Deposit collected up front.
    #[arg(long)]
    deposit: Option<Money>,
    /// Whether bookings must settle a deposit (implied by `--deposit`).
    #[arg(long)]
    requires_deposit: bool,
}

#[derive(Args, Debug)]
struct Booking {
    #[command(subcommand)]
    command: BookingCommand,
}

#[derive(Subcommand, Debug)]
enum BookingCommand {
    Create(BookingCreateArgs),
    Show(BookingShowArgs),
}

#[derive(Args, Debug)]
struct BookingCreateArgs {
    #[arg(long)]
    service_id: Uuid,
    #[arg(long)]
    email: String,
}

#[derive(Args, Debug)]
struct BookingShowArgs {
    #[arg(long)]
    id: Uuid,
}

#[derive(Args, Debug)]
struct Promo {
    #[command(subcommand)]
    command: PromoCommand,
}

#[derive(Subcommand, Debug)]
enum PromoCommand {
    Create(PromoCreateArgs),
    Deactivate(PromoDeactivateArgs),
    List(PromoListArgs),
}

#[derive(Args, Debug)]
struct PromoCreateArgs {
    #[arg(long)]
    code: String,
    #[arg(long)]
    description: Option<String>,
    /// Waive the booking deposit entirely.
    #[arg(long)]
    skip_deposit: bool,
    #[arg(long)]
    max_uses: Option<i32>,
    /// RFC 3339 timestamp, e.g. `2026-01-01T00:00:00Z`.
    #[arg(long)]
    valid_from: Option<DateTime<Utc>>,
    /// RFC 3339 timestamp, inclusive.
    #[arg(long)]
    valid_until: Option<DateTime<Utc>>,
}

#[derive(Args, Debug)]
struct PromoDeactivateArgs {
    #[arg(long)]
    code: String,
}

#[derive(Args, Debug)]
struct PromoListArgs {
    /// Only list active codes.
    #[arg(long)]
    active: bool,
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

fn print_promo(promo: &PromoCode) {
    let uses = match promo.max_uses {
        Some(max) => format!("{}/{max}", promo.usage_count),
        None => promo.usage_count.to_string(),
    };
    let window = match (promo.valid_from, promo.valid_until) {
        (None, None) => "always".to_string(),
        (from, until) => format!(
            "{} .. {}",
            from.map_or_else(|| "-".to_string(), |at| at.to_rfc3339()),
            until.map_or_else(|| "-".to_string(), |at| at.to_rfc3339())
        ),
    };
    println!(
        "{:<16} {:<8} skip_deposit={:<5} uses={:<8} {window}",
        promo.code,
        if promo.active { "active" } else { "inactive" },
        promo.skip_deposit,
        uses
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::Service(Service {
            command: ServiceCommand::Create(args),
        }) => {
            let mut cmd = NewServiceCmd::new(&args.name, args.price);
            if let Some(deposit) = args.deposit {
                cmd = cmd.deposit(deposit);
            }
            if args.requires_deposit {
                cmd = cmd.requires_deposit(true);
            }
            let service_id = engine.new_service(cmd).await?;
            println!("created service: {} ({service_id})", args.name);
        }
        Command::Booking(Booking {
            command: BookingCommand::Create(args),
        }) => match engine.new_booking(args.service_id, &args.email).await {
            Ok(booking_id) => println!("created booking: {booking_id}"),
            Err(EngineError::KeyNotFound(_)) => {
                eprintln!("service not found: {}", args.service_id);
                std::process::exit(1);
            }
            Err(err) => return Err(err.into()),
        },
        Command::Booking(Booking {
            command: BookingCommand::Show(args),
        }) => {
            let booking = engine.booking(args.id).await?;
            println!(
                "booking {}: {} deposit={} method={} promo={}",
                booking.id,
                booking.status,
                booking.deposit_status.as_str(),
                booking.payment_method.map_or("-", |method| method.as_str()),
                booking.promo_code.as_deref().unwrap_or("-")
            );
            for payment in engine.payments_for_booking(args.id).await? {
                println!(
                    "  payment {} {} {} {}",
                    payment.id,
                    payment.channel.as_str(),
                    payment.status.as_str(),
                    payment.amount
                );
            }
        }
        Command::Promo(Promo {
            command: PromoCommand::Create(args),
        }) => {
            let mut cmd = NewPromoCodeCmd::new(&args.code).skip_deposit(args.skip_deposit);
            if let Some(description) = args.description {
                cmd = cmd.description(description);
            }
            if let Some(max_uses) = args.max_uses {
                cmd = cmd.max_uses(max_uses);
            }
            if let Some(at) = args.valid_from {
                cmd = cmd.valid_from(at);
            }
            if let Some(at) = args.valid_until {
                cmd = cmd.valid_until(at);
            }
            match engine.new_promo_code(cmd).await {
                Ok(promo_id) => println!("created promo code: {} ({promo_id})", args.code),
                Err(EngineError::ExistingKey(code)) => {
                    eprintln!("promo code already exists: {code}");
                    std::process::exit(1);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Command::Promo(Promo {
            command: PromoCommand::Deactivate(args),
        }) => {
            engine.deactivate_promo_code(&args.code).await?;
            println!("deactivated promo code: {}", args.code);
        }
        Command::Promo(Promo {
            command: PromoCommand::List(args),
        }) => {
            for promo in engine.list_promo_codes(args.active).await? {
                print_promo(&promo);
            }
        }
    }

    Ok(())
}
