// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! supervisord Adapter
//!
//! Implements [`ProcessSupervisor`] by writing program configs into
//! supervisord's include directory and shelling out to `supervisorctl`.
//!
//! # Output Handling
//!
//! `supervisorctl` reports many failures on stdout with exit code 0
//! (`bob_fUSD: ERROR (no such process)`), so control commands fail when the
//! exit code is non-zero *or* the output contains `ERROR`. `status` is the
//! exception: it exits non-zero for any robot that is not running, so its
//! exit code is ignored and only the text is parsed.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** supervisord implementation of the process supervisor port

use async_trait::async_trait;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::domain::robot::RobotIdentity;
use crate::domain::state::RobotState;
use crate::domain::supervisor::{
    ConfigOutcome, MigrationOutcome, ProcessSupervisor, RobotAction, SupervisorError,
};
use crate::infrastructure::command::{CommandOutput, CommandRunner};
use crate::infrastructure::program_template::ProgramTemplate;

pub struct SupervisorCtl {
    ctl_path: PathBuf,
    config_dir: PathBuf,
    template: ProgramTemplate,
    runner: Arc<dyn CommandRunner>,
}

impl SupervisorCtl {
    pub fn new(
        ctl_path: impl Into<PathBuf>,
        config_dir: impl Into<PathBuf>,
        template: ProgramTemplate,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            ctl_path: ctl_path.into(),
            config_dir: config_dir.into(),
            template,
            runner,
        }
    }

    /// Run a control command and apply the exit-code / `ERROR` rule.
    async fn control(&self, args: &[&str]) -> Result<String, SupervisorError> {
        let output = self.runner.run(&self.ctl_path, args).await?;
        check_output(&args.join(" "), output)
    }

    async fn write_new_config(&self, robot: &RobotIdentity) -> Result<ConfigOutcome, SupervisorError> {
        let path = robot.config_path(&self.config_dir);
        let content = self.template.render(robot)?;
        debug!(path = %path.display(), "Rendered program config:\n{}", content);

        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Ok(ConfigOutcome::AlreadyPresent(path));
            }
            Err(e) => return Err(SupervisorError::config_io(&path, e)),
        };

        file.write_all(content.as_bytes())
            .await
            .map_err(|e| SupervisorError::config_io(&path, e))?;
        file.flush()
            .await
            .map_err(|e| SupervisorError::config_io(&path, e))?;
        file.sync_all()
            .await
            .map_err(|e| SupervisorError::config_io(&path, e))?;

        info!(path = %path.display(), bytes = content.len(), "Wrote program config");
        Ok(ConfigOutcome::Created(path))
    }
}

fn check_output(command: &str, output: CommandOutput) -> Result<String, SupervisorError> {
    let text = output.combined();
    if !output.success() {
        return Err(SupervisorError::CommandFailed {
            command: command.to_string(),
            status: output.status.unwrap_or(-1),
            output: text,
        });
    }
    if text.contains("ERROR") {
        return Err(SupervisorError::Rejected(text));
    }
    Ok(text)
}

/// Replace currency references in a program config written for `from`.
///
/// Only whole tokens are rewritten: an occurrence must not touch an ASCII
/// alphanumeric on either side. The robot name is never rewritten, even
/// when it contains the currency (`usdking_usd` becomes `usdking_btc`).
fn rewrite_currency(content: &str, from: &RobotIdentity, to: &RobotIdentity) -> String {
    let name = from.name();
    let currency = from.currency();

    // Name half of every `<name>_<currency>` service name.
    let mut protected: Vec<Range<usize>> = content
        .match_indices(from.service_name().as_str())
        .map(|(i, _)| i..i + name.len())
        .collect();
    // A bare name token equal to the currency is ambiguous; treat it as currency.
    if name != currency {
        protected.extend(
            content
                .match_indices(name)
                .filter(|(i, _)| is_standalone(content, *i, name.len()))
                .map(|(i, _)| i..i + name.len()),
        );
    }

    let mut rewritten = String::with_capacity(content.len());
    let mut copied = 0;
    for (start, _) in content.match_indices(currency) {
        let end = start + currency.len();
        if !is_standalone(content, start, currency.len())
            || protected.iter().any(|r| r.start < end && start < r.end)
        {
            continue;
        }
        rewritten.push_str(&content[copied..start]);
        rewritten.push_str(to.currency());
        copied = end;
    }
    rewritten.push_str(&content[copied..]);
    rewritten
}

fn is_standalone(text: &str, start: usize, len: usize) -> bool {
    let bytes = text.as_bytes();
    let before = start.checked_sub(1).map(|i| bytes[i]);
    let after = bytes.get(start + len).copied();
    !before.is_some_and(|b| b.is_ascii_alphanumeric())
        && !after.is_some_and(|b| b.is_ascii_alphanumeric())
}

/// `true` for an existing regular file, `false` when nothing is there.
async fn config_exists(path: &Path) -> Result<bool, SupervisorError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(meta.is_file()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(SupervisorError::config_io(path, e)),
    }
}

#[async_trait]
impl ProcessSupervisor for SupervisorCtl {
    async fn ensure_config(&self, robot: &RobotIdentity) -> Result<ConfigOutcome, SupervisorError> {
        let path = robot.config_path(&self.config_dir);
        if config_exists(&path).await? {
            debug!(path = %path.display(), "Program config already present");
            return Ok(ConfigOutcome::AlreadyPresent(path));
        }
        self.write_new_config(robot).await
    }

    async fn reload(&self) -> Result<String, SupervisorError> {
        let result = self.control(&["update"]).await?;
        info!("Supervisor update: {}", result);
        Ok(result)
    }

    async fn set_state(
        &self,
        robot: &RobotIdentity,
        action: RobotAction,
    ) -> Result<String, SupervisorError> {
        let service = robot.service_name();
        let result = self.control(&[action.as_str(), service.as_str()]).await?;
        info!(service = %service, action = %action, "Robot action result: {}", result);
        Ok(result)
    }

    async fn query_state(&self, robot: &RobotIdentity) -> Result<RobotState, SupervisorError> {
        let service = robot.service_name();
        let output = self
            .runner
            .run(&self.ctl_path, &["status", service.as_str()])
            .await?;

        let state = RobotState::from_status_output(&output.stdout);
        debug!(service = %service, exit = ?output.status, "Status output: {}", output.stdout.trim());
        Ok(state)
    }

    async fn migrate_config(
        &self,
        from: &RobotIdentity,
        to: &RobotIdentity,
    ) -> Result<MigrationOutcome, SupervisorError> {
        let source = from.config_path(&self.config_dir);
        let target = to.config_path(&self.config_dir);

        if source == target {
            return Ok(MigrationOutcome::TargetCreated(self.ensure_config(to).await?));
        }

        let source_exists = config_exists(&source).await?;

        if config_exists(&target).await? && source_exists {
            info!(target = %target.display(), "Target config exists, removing {}", source.display());
            tokio::fs::remove_file(&source)
                .await
                .map_err(|e| SupervisorError::config_io(&source, e))?;
            return Ok(MigrationOutcome::SourceRemoved);
        }

        if !source_exists {
            warn!(source = %source.display(), "Source config missing, creating target config");
            return Ok(MigrationOutcome::TargetCreated(self.ensure_config(to).await?));
        }

        let content = tokio::fs::read_to_string(&source)
            .await
            .map_err(|e| SupervisorError::config_io(&source, e))?;
        let rewritten = match self.template.render(from) {
            // Untouched since creation: render the target directly.
            Ok(rendered) if rendered == content => self.template.render(to)?,
            _ => rewrite_currency(&content, from, to),
        };

        // Rename first so a failed rename leaves the source as it was. Writing
        // through the same inode afterwards keeps its permissions.
        tokio::fs::rename(&source, &target)
            .await
            .map_err(|e| SupervisorError::config_io(&target, e))?;
        tokio::fs::write(&target, rewritten)
            .await
            .map_err(|e| SupervisorError::config_io(&target, e))?;

        info!(from = %source.display(), to = %target.display(), "Migrated program config");
        Ok(MigrationOutcome::Renamed {
            from: source,
            to: target,
        })
    }
}
