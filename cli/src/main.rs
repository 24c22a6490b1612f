// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # VESTA Family Assistant CLI
//!
//! The `vesta` binary drives the assistant's isolation core from the
//! command line. All commands run against the offline in-memory capability
//! adapters; production portal/chat/model adapters are wired in by the
//! hosting service, not by this CLI.
//!
//! ## Commands
//!
//! - `vesta config validate` - Load and validate the configuration file
//! - `vesta health` - Run the startup health check
//! - `vesta digest` - Produce an offline letter digest for every profile

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::{ConfigCommand, run_config, run_digest, run_health};

/// VESTA family assistant host.
#[derive(Parser)]
#[command(name = "vesta")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "VESTA_CONFIG_PATH",
        value_name = "FILE",
        default_value = "vesta-config.yaml"
    )]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "VESTA_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Run the startup health check against the offline adapters
    Health,

    /// Produce an offline letter digest for every configured profile
    Digest {
        /// Digest date (defaults to today)
        #[arg(long)]
        date: Option<chrono::NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Commands::Config { command } => run_config(&cli.config, command),
        Commands::Health => run_health(&cli.config).await,
        Commands::Digest { date } => run_digest(&cli.config, date).await,
    }
}

fn init_tracing(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
