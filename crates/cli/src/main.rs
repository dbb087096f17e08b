//! Gamevault CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! gv-cli migrate
//!
//! # Load products from a YAML catalog
//! gv-cli seed products data/catalog.yaml
//!
//! # Create an admin account
//! gv-cli admin create -e admin@example.com -u admin
//!
//! # Grant admin rights to an existing account
//! gv-cli admin promote -e player@example.com
//! ```
//!
//! # Environment Variables
//!
//! - `GAMEVAULT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `GAMEVAULT_ADMIN_PASSWORD` - Password for `admin create` when `--password` is omitted

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "gv-cli")]
#[command(author, version, about = "Gamevault CLI tools")]
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
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Load products from a YAML file; titles already in the catalog are skipped
    Products {
        /// Path to the YAML catalog
        file: String,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin account
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin username
        #[arg(short, long)]
        username: String,

        /// Password (falls back to `GAMEVAULT_ADMIN_PASSWORD`)
        #[arg(short, long, env = "GAMEVAULT_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Grant admin rights to an existing account
    Promote {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
    /// Revoke admin rights from an account
    Demote {
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
        Commands::Seed { target } => match target {
            SeedTarget::Products { file } => commands::seed::products(&file).await?,
        },
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                username,
                password,
            } => {
                commands::admin::create_user(&email, &username, &password).await?;
            }
            AdminAction::Promote { email } => commands::admin::set_admin(&email, true).await?,
            AdminAction::Demote { email } => commands::admin::set_admin(&email, false).await?,
        },
    }
    Ok(())
}
