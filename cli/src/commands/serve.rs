// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `fundbot serve`: wire the supervisord adapter behind the gRPC service
//! and run until Ctrl+C or SIGTERM.

use anyhow::{Context, Result};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};

use fundbot_core::application::{RobotControlService, StandardRobotControlService};
use fundbot_core::domain::service_config::ServiceConfigManifest;
use fundbot_core::infrastructure::{ProgramTemplate, SupervisorCtl, TokioCommandRunner};
use fundbot_core::presentation::grpc::start_grpc_server;

pub async fn run(config: ServiceConfigManifest) -> Result<()> {
    config
        .validate()
        .context("Configuration validation failed")?;

    let (addr, robots) = build_service(&config)?;

    let supervisor = &config.spec.supervisor;
    if !supervisor.config_dir.is_dir() {
        warn!(
            "Supervisor config directory {} does not exist; CreateRobot will fail",
            supervisor.config_dir.display()
        );
    }
    info!(
        node = %config.metadata.name,
        supervisorctl = %supervisor.ctl_path.display(),
        config_dir = %supervisor.config_dir.display(),
        "Robot control service configured"
    );

    start_grpc_server(addr, robots, shutdown_signal())
        .await
        .context("gRPC server failed")?;

    Ok(())
}

/// Resolve the listen address and assemble the robot control service.
pub fn build_service(
    config: &ServiceConfigManifest,
) -> Result<(SocketAddr, Arc<dyn RobotControlService>)> {
    let server = &config.spec.server;
    let ip: IpAddr = server
        .bind_address
        .parse()
        .with_context(|| format!("Invalid bind address '{}'", server.bind_address))?;

    let template = ProgramTemplate::from_config(config.spec.robot.clone())
        .context("Failed to load program template")?;

    let supervisor = &config.spec.supervisor;
    let runner = TokioCommandRunner::new(Duration::from_secs(supervisor.command_timeout_secs));
    let adapter = SupervisorCtl::new(
        supervisor.ctl_path.clone(),
        supervisor.config_dir.clone(),
        template,
        Arc::new(runner),
    );

    let robots: Arc<dyn RobotControlService> =
        Arc::new(StandardRobotControlService::new(Arc::new(adapter)));
    Ok((SocketAddr::new(ip, server.port), robots))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
