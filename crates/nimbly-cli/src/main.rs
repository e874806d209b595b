//! Nimbly CLI - Receipt tracking and purchase insights
//!
//! Usage:
//!   nimbly init                               Initialize database
//!   nimbly parse --file receipt.txt           Show what the parser extracts
//!   nimbly ingest --file receipt.txt --user 1 Store a parsed receipt
//!   nimbly receipts --user 1                  List stored receipts
//!   nimbly insights --user 1                  Describe purchase history

mod cli;
mod commands;


use anyhow::{Context, Result};
use clap::Parser;
use nimbly_core::NimblyConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = NimblyConfig::load(cli.config.as_deref()).context("Failed to load config")?;

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt),
        Commands::Parse { file, json } => commands::cmd_parse(&config, &file, json),
        Commands::Ingest { file, user, force } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_ingest(&db, &config, &file, user, force)?;
            Ok(())
        }
        Commands::Receipts {
            user,
            limit,
            offset,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_receipts_list(&db, user, limit, offset)
        }
        Commands::Insights { user, json } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_insights(&db, user, json)?;
            Ok(())
        }
    }
}
