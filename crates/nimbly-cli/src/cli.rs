//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Nimbly - Receipt tracking and purchase insights
#[derive(Parser)]
#[command(name = "nimbly")]
#[command(about = "Parse grocery receipts and see what your purchase history says", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "nimbly.db", global = true)]
    pub db: PathBuf,

    /// Parser/assessor config file (defaults to ~/.config/nimbly/config.toml,
    /// then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set NIMBLY_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Parse a receipt text file and show what was extracted (nothing is stored)
    Parse {
        /// Receipt text file
        #[arg(short, long)]
        file: PathBuf,

        /// Print the full parse result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse a receipt text file and store it for a user
    Ingest {
        /// Receipt text file
        #[arg(short, long)]
        file: PathBuf,

        /// Owning user ID
        #[arg(short, long)]
        user: i64,

        /// Store the receipt even if identical text was already uploaded
        #[arg(long)]
        force: bool,
    },

    /// List a user's receipts
    Receipts {
        /// Owning user ID
        #[arg(short, long)]
        user: i64,

        /// Maximum number of receipts to show
        #[arg(short, long, default_value = "20")]
        limit: i64,

        /// Number of receipts to skip
        #[arg(long, default_value = "0")]
        offset: i64,
    },

    /// Show insights about a user's purchase history
    Insights {
        /// Owning user ID
        #[arg(short, long)]
        user: i64,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}
