//! Madrona CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run store database migrations
//! madrona-cli migrate
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "madrona-cli")]
#[command(author, version, about = "Madrona Market CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run store database migrations
    Migrate,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Migrate => commands::migrate::run().await,
    };

    if let Err(e) = result {
        tracing::error!("command failed: {e}");
        std::process::exit(1);
    }
}
