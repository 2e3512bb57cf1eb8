//! CLI module - Command-line interface for the recipe API
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// Recipe API - recipes, tags and ingredients over HTTP
#[derive(Parser)]
#[command(name = "recipe-api")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Apply migrations and run the HTTP server (default)
    Serve,

    /// Block until the database answers
    WaitForDb {
        /// Give up after this many seconds
        #[arg(long, default_value = "60")]
        timeout_secs: u64,
    },

    /// Apply pending migrations and exit
    Migrate,

    /// Create a staff account with superuser rights
    CreateSuperuser {
        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,
    },

    /// Create default config file
    #[command(alias = "init")]
    InitConfig,
}

pub use commands::*;
