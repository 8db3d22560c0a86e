//! Stride CLI - Database migrations, catalog seeding and development tokens.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! stride-cli migrate
//!
//! # Load products from a YAML file
//! stride-cli seed products crates/cli/seed/products.yaml
//!
//! # Mint a bearer token for local testing
//! stride-cli token --user 1 --role admin
//! ```
//!
//! Connection and signing settings come from the same environment as the
//! API (`STRIDE_DATABASE_URL`, `STRIDE_TOKEN_SECRET`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use stride_core::Role;

mod commands;

#[derive(Parser)]
#[command(name = "stride-cli")]
#[command(author, version, about = "Stride CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Mint a development bearer token
    Token {
        /// User ID the token is issued for
        #[arg(short, long)]
        user: i32,

        /// Role (`customer`, `admin`)
        #[arg(short, long, default_value = "customer")]
        role: Role,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Insert catalog products from a YAML list
    Products {
        /// Path to the YAML file
        file: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Products { file } => commands::seed::products(&file).await?,
        },
        Commands::Token { user, role } => commands::token::mint(user, role)?,
    }
    Ok(())
}
