// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # fundbot
//!
//! One binary for both ends of the robot control service.
//!
//! ## Commands
//!
//! - `fundbot serve` - Run the gRPC server in front of supervisord
//! - `fundbot robot create|status|start|stop|restart|migrate` - Call a running server
//! - `fundbot config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use fundbot::commands::{self, ConfigCommand, RobotCommand};
use fundbot_core::domain::service_config::ServiceConfigManifest;

/// Funding robot control service
#[derive(Parser)]
#[command(name = "fundbot")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "FUNDBOT_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); defaults to the configured level
    #[arg(long, global = true, env = "FUNDBOT_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the gRPC server
    #[command(name = "serve")]
    Serve,

    /// Robot operations against a running server
    #[command(name = "robot")]
    Robot {
        #[command(flatten)]
        connection: commands::robot::ConnectionArgs,

        #[command(subcommand)]
        command: RobotCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve => {
            let config = ServiceConfigManifest::load_or_default(cli.config)
                .context("Failed to load configuration")?;
            let level = cli
                .log_level
                .unwrap_or_else(|| config.spec.logging.level.clone());
            init_logging(&level, &config.spec.logging.format)?;
            commands::serve::run(config).await
        }
        Commands::Robot {
            connection,
            command,
        } => {
            init_logging(cli.log_level.as_deref().unwrap_or("warn"), "text")?;
            commands::robot::handle_command(command, connection).await
        }
        Commands::Config { command } => {
            init_logging(cli.log_level.as_deref().unwrap_or("warn"), "text")?;
            commands::config::handle_command(command, cli.config).await
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str, format: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if format == "json" {
        builder.json().init();
    } else {
        builder.compact().init();
    }

    Ok(())
}
