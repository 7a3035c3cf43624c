//! Clementine CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run API database migrations
//! clementine-cli migrate
//!
//! # Seed the catalog from a YAML fixture
//! clementine-cli seed -f fixtures/products.yaml
//!
//! # Grant the admin role to an existing account
//! clementine-cli grant-admin -e shopkeeper@example.com
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Seed the product catalog from a YAML fixture
//! - `grant-admin` - Add the `admin` role to an account

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "clementine-cli")]
#[command(author, version, about = "Clementine CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the product catalog from a YAML fixture
    Seed {
        /// Path to the YAML fixture file
        #[arg(short, long)]
        file: String,
    },
    /// Grant the `admin` role to an existing account
    GrantAdmin {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file } => commands::seed::products(&file).await?,
        Commands::GrantAdmin { email } => {
            commands::admin::grant_admin(&email).await?;
        }
    }
    Ok(())
}
