// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use fundbot_core::domain::robot::RobotIdentity;
use fundbot_core::domain::service_config::ServiceConfigManifest;
use fundbot_core::infrastructure::ProgramTemplate;

const SAMPLE_CONFIG: &str = include_str!("../../templates/fundbot-config.yaml");

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./fundbot-config.yaml)
        #[arg(short, long, default_value = "./fundbot-config.yaml")]
        output: PathBuf,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output } => generate(output).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = ServiceConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        match &config_override {
            Some(path) => println!("  --config: {}", path.display()),
            None => println!("  --config: {}", "(not set)".dimmed()),
        }
        for (i, path) in ServiceConfigManifest::search_paths().iter().enumerate() {
            let marker = if path.exists() { "found".green() } else { "missing".dimmed() };
            println!("  {}. {} ({})", i + 1, path.display(), marker);
        }
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!("  Node: {}", config.metadata.name);
    println!();

    let server = &config.spec.server;
    println!("{}", "Server:".bold());
    println!("  Listen: {}:{}", server.bind_address, server.port);
    println!();

    let supervisor = &config.spec.supervisor;
    println!("{}", "Supervisor:".bold());
    println!("  supervisorctl: {}", supervisor.ctl_path.display());
    println!("  Config dir: {}", supervisor.config_dir.display());
    println!("  Command timeout: {}s", supervisor.command_timeout_secs);
    println!();

    let robot = &config.spec.robot;
    println!("{}", "Robot program:".bold());
    println!("  Command: {} {} <name> -s <currency>", robot.python, robot.script);
    println!("  Log dir: {}", robot.log_dir);
    println!("  User: {}", robot.user);
    println!(
        "  Template: {}",
        robot
            .template_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(built-in)".to_string())
    );
    println!();

    println!("{}", "Logging:".bold());
    println!("  Level: {} ({})", config.spec.logging.level, config.spec.logging.format);

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = ServiceConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    check(&config)?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

/// Manifest validation plus a trial render of the program template.
pub fn check(config: &ServiceConfigManifest) -> Result<()> {
    config
        .validate()
        .context("Configuration validation failed")?;

    let template = ProgramTemplate::from_config(config.spec.robot.clone())
        .context("Program template failed to compile")?;
    let sample = RobotIdentity::new("example", "fUSD")?;
    template
        .render(&sample)
        .context("Program template failed to render")?;

    Ok(())
}

async fn generate(output: PathBuf) -> Result<()> {
    std::fs::write(&output, SAMPLE_CONFIG)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}
