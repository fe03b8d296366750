// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Process Supervisor Port
//!
//! Robots are not run by this service. They are programs registered with an
//! external process manager (supervisord in production). This module defines
//! the port the application layer talks to; `infrastructure::supervisorctl`
//! is the supervisord adapter.
//!
//! | Operation | supervisord mapping |
//! |-----------|---------------------|
//! | `ensure_config` | write `<config_dir>/<service>.conf` if absent |
//! | `reload` | `supervisorctl update` |
//! | `set_state` | `supervisorctl start\|stop\|restart <service>` |
//! | `query_state` | `supervisorctl status <service>` |
//! | `migrate_config` | rewrite + rename a program config between currencies |
//!
//! The port owns no locking. Callers serialize per service name.

use crate::domain::robot::RobotIdentity;
use crate::domain::state::RobotState;
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Lifecycle action requested from the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RobotAction {
    Start,
    Stop,
    Restart,
}

impl RobotAction {
    /// `supervisorctl` subcommand.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
        }
    }
}

impl fmt::Display for RobotAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of `ensure_config`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOutcome {
    Created(PathBuf),
    AlreadyPresent(PathBuf),
}

impl ConfigOutcome {
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Created(p) | Self::AlreadyPresent(p) => p,
        }
    }
}

/// Which reconciliation branch `migrate_config` took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Target config already existed; the source config was deleted.
    SourceRemoved,
    /// No source config; a fresh target config was ensured.
    TargetCreated(ConfigOutcome),
    /// Source config rewritten for the new currency and renamed.
    Renamed { from: PathBuf, to: PathBuf },
}

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("Config I/O failed for {}: {source}", path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to render program config: {0}")]
    Template(String),

    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} timed out after {seconds}s")]
    Timeout { command: String, seconds: u64 },

    #[error("{command} exited with status {status}: {output}")]
    CommandFailed {
        command: String,
        status: i32,
        output: String,
    },

    /// The control command ran but the supervisor reported an error.
    #[error("{0}")]
    Rejected(String),
}

impl SupervisorError {
    pub fn config_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ConfigIo {
            path: path.into(),
            source,
        }
    }
}

#[async_trait]
pub trait ProcessSupervisor: Send + Sync {
    /// Write the robot's program config unless it already exists.
    async fn ensure_config(&self, robot: &RobotIdentity) -> Result<ConfigOutcome, SupervisorError>;

    /// Make the supervisor pick up added, changed and removed configs.
    async fn reload(&self) -> Result<String, SupervisorError>;

    /// Request a lifecycle transition. Returns the supervisor's output.
    async fn set_state(
        &self,
        robot: &RobotIdentity,
        action: RobotAction,
    ) -> Result<String, SupervisorError>;

    /// Current run state. Unparseable output is `RobotState::Unknown`.
    async fn query_state(&self, robot: &RobotIdentity) -> Result<RobotState, SupervisorError>;

    /// Move a robot's program config from `from` to `to` (same name).
    async fn migrate_config(
        &self,
        from: &RobotIdentity,
        to: &RobotIdentity,
    ) -> Result<MigrationOutcome, SupervisorError>;
}
