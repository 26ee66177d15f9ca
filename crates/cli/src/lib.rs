pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use promo_core::config::{AppConfig, LoadOptions};
use promo_core::errors::ApplicationError;

use crate::commands::CommandResult;

#[derive(Debug, Parser)]
#[command(
    name = "promo",
    about = "Promotion engine operator CLI",
    long_about = "Reproduce pricing previews and automatic memberships offline from JSON fixtures.",
    after_help = "Examples:\n  promo evaluate --cart cart.json --discounts discounts.json\n  \
                  promo membership --groups groups.json --products products.json\n  promo config"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a promo.toml configuration file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Price a cart against stored discounts and print the pricing result")]
    Evaluate {
        #[arg(long, help = "Cart JSON (line items, customer, coupon code, now)")]
        cart: PathBuf,
        #[arg(long, help = "JSON array of discount records")]
        discounts: PathBuf,
        #[arg(long, help = "Usage counter snapshot JSON")]
        usage: Option<PathBuf>,
    },
    #[command(about = "Recompute automatic category and collection members")]
    Membership {
        #[arg(long, help = "JSON array of automatic groups")]
        groups: PathBuf,
        #[arg(long, help = "JSON array of products")]
        products: PathBuf,
        #[arg(long, help = "Stored members per group id, to report added/removed ids")]
        current: Option<PathBuf>,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Evaluate { .. } => "evaluate",
            Self::Membership { .. } => "membership",
            Self::Config => "config",
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let result = execute(cli);

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

pub fn execute(cli: Cli) -> CommandResult {
    let options = LoadOptions {
        config_path: cli.config.clone(),
        require_file: cli.config.is_some(),
        ..LoadOptions::default()
    };
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::from_error(cli.command.name(), &ApplicationError::from(error))
        }
    };
    init_logging(&config);

    match cli.command {
        Command::Evaluate { cart, discounts, usage } => {
            commands::evaluate::run(&config, &cart, &discounts, usage.as_deref())
        }
        Command::Membership { groups, products, current } => {
            commands::membership::run(&config, &groups, &products, current.as_deref())
        }
        Command::Config => commands::config::run(&config, cli.config.as_deref()),
    }
}

/// Diagnostics go to stderr so stdout stays a clean JSON document. Returns
/// false when a global subscriber was already installed.
fn init_logging(config: &AppConfig) -> bool {
    use promo_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let initialized = match config.logging.format {
        Compact => builder.compact().try_init(),
        Pretty => builder.pretty().try_init(),
        Json => builder.json().try_init(),
    };
    match initialized {
        Ok(()) => true,
        Err(error) => {
            tracing::debug!(
                event_name = "cli.logging.reused",
                error = %error,
                "keeping the already installed subscriber"
            );
            false
        }
    }
}
