// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Robot operations against a running server
//!
//! Commands: create, status, start, stop, restart, migrate

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use std::time::Duration;

use crate::client::{RobotCall, RobotClient, DEFAULT_SERVER};

const DEFAULT_NAME: &str = "DEAN.LIN";
const DEFAULT_CURRENCY: &str = "fUSD";

#[derive(Args, Debug)]
pub struct ConnectionArgs {
    /// Server address (host:port or URL)
    #[arg(long, global = true, env = "IFUND_SERVER", default_value = DEFAULT_SERVER)]
    pub server: String,

    /// Per-request timeout in seconds
    #[arg(long, global = true, default_value = "10")]
    pub timeout_secs: u64,
}

#[derive(Args, Debug)]
pub struct RobotArgs {
    /// Robot (user) name
    #[arg(default_value = DEFAULT_NAME)]
    pub name: String,

    /// Funding currency
    #[arg(long, default_value = DEFAULT_CURRENCY)]
    pub currency: String,
}

#[derive(Subcommand, Debug)]
pub enum RobotCommand {
    /// Write the robot's supervisor config and reload supervisord
    Create(RobotArgs),

    /// Show the robot's supervisor state
    Status(RobotArgs),

    /// Start the robot
    Start(RobotArgs),

    /// Stop the robot
    Stop(RobotArgs),

    /// Restart the robot
    Restart(RobotArgs),

    /// Move the robot to another currency and restart it
    Migrate {
        /// Robot (user) name
        #[arg(default_value = DEFAULT_NAME)]
        name: String,

        /// Current currency
        #[arg(long)]
        from: String,

        /// New currency
        #[arg(long)]
        to: String,
    },
}

pub async fn handle_command(command: RobotCommand, connection: ConnectionArgs) -> Result<()> {
    let timeout = Duration::from_secs(connection.timeout_secs.max(1));
    let mut client = RobotClient::connect(&connection.server, timeout).await?;

    match command {
        RobotCommand::Create(robot) => {
            let reply = client.create(&robot.name, &robot.currency).await?;
            report(reply.code, &format!("{}/{}", robot.name, robot.currency), &reply.message)
        }
        RobotCommand::Status(robot) => {
            let reply = client
                .call(RobotCall::Status, &robot.name, &robot.currency)
                .await?;
            if reply.code == 0 {
                println!("{}/{}: {}", robot.name, robot.currency, colored_state(&reply.state));
                Ok(())
            } else {
                println!("{}/{}: {}", robot.name, robot.currency, "UNKNOWN".yellow());
                bail!("Robot state could not be determined")
            }
        }
        RobotCommand::Start(robot) => action(&mut client, RobotCall::Start, robot).await,
        RobotCommand::Stop(robot) => action(&mut client, RobotCall::Stop, robot).await,
        RobotCommand::Restart(robot) => action(&mut client, RobotCall::Restart, robot).await,
        RobotCommand::Migrate { name, from, to } => {
            let reply = client.migrate(&name, &from, &to).await?;
            report(reply.code, &format!("{} {} -> {}", name, from, to), &reply.message)
        }
    }
}

async fn action(client: &mut RobotClient, call: RobotCall, robot: RobotArgs) -> Result<()> {
    let reply = client.call(call, &robot.name, &robot.currency).await?;
    report(reply.code, &format!("{}/{}", robot.name, robot.currency), &reply.message)
}

fn report(code: i32, subject: &str, message: &str) -> Result<()> {
    let message = message.trim();
    if code == 0 {
        println!("{} {}", format!("✓ {}", subject).green(), message);
        Ok(())
    } else {
        eprintln!("{} {}", format!("✗ {}", subject).red(), message);
        bail!("Server reported failure (code {})", code)
    }
}

fn colored_state(state: &str) -> colored::ColoredString {
    match state {
        "RUNNING" => state.green(),
        "STARTING" => state.cyan(),
        _ => state.yellow(),
    }
}
