// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Robot Control Use Cases
//!
//! Create, query, start/stop/restart and migrate funding robots. Each use
//! case is a short sequence of [`ProcessSupervisor`] calls run under the
//! per-service lock of every robot it touches.
//!
//! ## Migration Policy
//! | Target config | Source config | File step |
//! |---------------|---------------|-----------|
//! | present | present | delete source |
//! | any | absent | ensure target config |
//! | absent | present | rewrite currency, rename source to target |
//!
//! Every branch then reloads the supervisor and restarts the target robot.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

use crate::application::service_locks::ServiceLocks;
use crate::domain::robot::{IdentityError, RobotIdentity};
use crate::domain::state::RobotState;
use crate::domain::supervisor::{
    ConfigOutcome, MigrationOutcome, ProcessSupervisor, RobotAction, SupervisorError,
};

#[derive(Debug, Error)]
pub enum RobotError {
    #[error(transparent)]
    InvalidIdentity(#[from] IdentityError),

    #[error("Robot already uses currency {0}")]
    SameCurrency(String),

    #[error("create failed: {0}")]
    CreateFailed(#[source] SupervisorError),

    #[error("update failed: {0}")]
    UpdateFailed(#[source] SupervisorError),

    #[error("migrate failed: {0}")]
    MigrateFailed(#[source] SupervisorError),

    #[error(transparent)]
    Supervisor(#[from] SupervisorError),
}

#[async_trait]
pub trait RobotControlService: Send + Sync {
    /// Write the robot's program config (if absent) and reload the supervisor.
    async fn create_robot(&self, robot: &RobotIdentity) -> Result<ConfigOutcome, RobotError>;

    async fn robot_status(&self, robot: &RobotIdentity) -> Result<RobotState, RobotError>;

    /// Start, stop or restart. Returns the supervisor's output.
    async fn change_state(
        &self,
        robot: &RobotIdentity,
        action: RobotAction,
    ) -> Result<String, RobotError>;

    /// Move `robot` to `to_currency` and restart it there.
    async fn migrate_robot(
        &self,
        robot: &RobotIdentity,
        to_currency: &str,
    ) -> Result<String, RobotError>;
}

pub struct StandardRobotControlService {
    supervisor: Arc<dyn ProcessSupervisor>,
    locks: ServiceLocks,
}

impl StandardRobotControlService {
    pub fn new(supervisor: Arc<dyn ProcessSupervisor>) -> Self {
        Self {
            supervisor,
            locks: ServiceLocks::new(),
        }
    }
}

#[async_trait]
impl RobotControlService for StandardRobotControlService {
    async fn create_robot(&self, robot: &RobotIdentity) -> Result<ConfigOutcome, RobotError> {
        info!(robot = %robot, "CreateRobot");
        let _guard = self.locks.lock(&robot.service_name()).await;

        let outcome = self.supervisor.ensure_config(robot).await.map_err(|e| {
            error!(robot = %robot, "Failed to write program config: {}", e);
            RobotError::CreateFailed(e)
        })?;

        self.supervisor.reload().await.map_err(|e| {
            error!(robot = %robot, "Supervisor update failed: {}", e);
            RobotError::UpdateFailed(e)
        })?;

        Ok(outcome)
    }

    async fn robot_status(&self, robot: &RobotIdentity) -> Result<RobotState, RobotError> {
        let state = self.supervisor.query_state(robot).await.map_err(|e| {
            error!(robot = %robot, "Status query failed: {}", e);
            RobotError::Supervisor(e)
        })?;
        info!(robot = %robot, "Robot state {}", state);
        Ok(state)
    }

    async fn change_state(
        &self,
        robot: &RobotIdentity,
        action: RobotAction,
    ) -> Result<String, RobotError> {
        info!(robot = %robot, action = %action, "Robot action requested");
        let _guard = self.locks.lock(&robot.service_name()).await;

        self.supervisor.set_state(robot, action).await.map_err(|e| {
            error!(robot = %robot, action = %action, "Robot action failed: {}", e);
            RobotError::Supervisor(e)
        })
    }

    async fn migrate_robot(
        &self,
        robot: &RobotIdentity,
        to_currency: &str,
    ) -> Result<String, RobotError> {
        let target = robot.with_currency(to_currency)?;
        if &target == robot {
            return Err(RobotError::SameCurrency(to_currency.to_string()));
        }
        info!(from = %robot, to = %target, "MigrateRobot");

        let source_service = robot.service_name();
        let target_service = target.service_name();
        let _guard = self
            .locks
            .lock_all(&[&source_service, &target_service])
            .await;

        let outcome = self
            .supervisor
            .migrate_config(robot, &target)
            .await
            .map_err(|e| {
                error!(from = %robot, to = %target, "Config migration failed: {}", e);
                RobotError::MigrateFailed(e)
            })?;
        match &outcome {
            MigrationOutcome::SourceRemoved => {
                info!(to = %target, "Target config already present, source removed")
            }
            MigrationOutcome::TargetCreated(_) => {
                info!(to = %target, "Source config missing, target config ensured")
            }
            MigrationOutcome::Renamed { from, to } => {
                info!("Renamed {} to {}", from.display(), to.display())
            }
        }

        self.supervisor.reload().await.map_err(|e| {
            error!(to = %target, "Supervisor update failed: {}", e);
            RobotError::UpdateFailed(e)
        })?;

        self.supervisor
            .set_state(&target, RobotAction::Restart)
            .await
            .map_err(|e| {
                error!(to = %target, "Restart after migration failed: {}", e);
                RobotError::Supervisor(e)
            })
    }
}
