//! Supermarket CLI - drive the shopping cart from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Show the signed-in user's cart
//! supermarket cart show
//!
//! # Remove lines from the cart
//! supermarket cart remove <ID>...
//!
//! # Send the checkout email
//! supermarket cart checkout --name "Ada Lovelace" --email ada@example.com
//! ```
//!
//! # Architecture
//!
//! - `supermarket-cart` session for loading, totals, deletion and checkout
//! - reqwest client for the cart data service
//! - lettre SMTP transport with Askama templates for checkout emails
//!
//! See [`config`] for the environment variables.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod error;
mod services;

use config::CliConfig;
use error::CliError;

#[derive(Parser)]
#[command(name = "supermarket")]
#[command(author, version, about = "Supermarket cart tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Work with the shopping cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart and its total
    Show,
    /// Remove items from the cart
    Remove {
        /// Cart item ids
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Email a checkout summary
    Checkout {
        /// Recipient name (default: `SUPERMARKET_USER_NAME`)
        #[arg(short, long)]
        name: Option<String>,

        /// Recipient email (default: `SUPERMARKET_USER_EMAIL`)
        #[arg(short, long)]
        email: Option<String>,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &CliConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match CliConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            // No subscriber yet; use the default fmt one so the error is visible.
            tracing_subscriber::fmt::init();
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(2);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "supermarket_cli=info,supermarket_cart=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli, &config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &CliConfig) -> Result<(), CliError> {
    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(config).await?,
            CartAction::Remove { ids } => commands::cart::remove(config, &ids).await?,
            CartAction::Checkout { name, email } => {
                commands::cart::checkout(config, name, email).await?;
            }
        },
    }
    Ok(())
}
