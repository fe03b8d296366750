// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! External Command Execution
//!
//! Thin seam over `tokio::process::Command` so the supervisord adapter can
//! be exercised without a real `supervisorctl`.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Run a control executable to completion and capture output

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use crate::domain::supervisor::SupervisorError;

/// Captured result of a finished command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    /// Exit code, `None` if terminated by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(status: i32, stdout: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// stdout followed by stderr, trimmed.
    pub fn combined(&self) -> String {
        let stdout = self.stdout.trim();
        let stderr = self.stderr.trim();
        match (stdout.is_empty(), stderr.is_empty()) {
            (_, true) => stdout.to_string(),
            (true, false) => stderr.to_string(),
            (false, false) => format!("{}\n{}", stdout, stderr),
        }
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &Path, args: &[&str]) -> Result<CommandOutput, SupervisorError>;
}

/// Runs commands on the host with a hard timeout.
pub struct TokioCommandRunner {
    timeout: Duration,
}

impl TokioCommandRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &Path, args: &[&str]) -> Result<CommandOutput, SupervisorError> {
        let command_line = format!("{} {}", program.display(), args.join(" "));
        tracing::debug!(command = %command_line, "Running command");

        let mut cmd = tokio::process::Command::new(program);
        cmd.args(args).kill_on_drop(true);

        match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => Ok(CommandOutput {
                status: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            }),
            Ok(Err(e)) => Err(SupervisorError::Spawn {
                program: program.display().to_string(),
                source: e,
            }),
            Err(_) => Err(SupervisorError::Timeout {
                command: command_line,
                seconds: self.timeout.as_secs(),
            }),
        }
    }
}

// Re-export ScriptedCommandRunner for testing
pub use mock::ScriptedCommandRunner;

mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// In-memory stand-in for `supervisorctl`.
    ///
    /// Records every invocation's arguments and answers from a table keyed by
    /// the space-joined arguments. Unscripted commands succeed with empty
    /// output.
    #[derive(Clone, Default)]
    pub struct ScriptedCommandRunner {
        responses: Arc<Mutex<HashMap<String, CommandOutput>>>,
        spawn_failures: Arc<Mutex<Vec<String>>>,
        calls: Arc<Mutex<Vec<Vec<String>>>>,
    }

    impl ScriptedCommandRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Answer `args` with `output`.
        pub fn respond(&self, args: &[&str], output: CommandOutput) {
            self.responses
                .lock()
                .unwrap()
                .insert(args.join(" "), output);
        }

        /// Make `args` fail as if the executable could not be started.
        pub fn fail_spawn(&self, args: &[&str]) {
            self.spawn_failures.lock().unwrap().push(args.join(" "));
        }

        /// Every invocation so far, in order.
        pub fn calls(&self) -> Vec<Vec<String>> {
            self.calls.lock().unwrap().clone()
        }

        pub fn was_called_with(&self, args: &[&str]) -> bool {
            self.calls()
                .iter()
                .any(|call| call.iter().map(String::as_str).eq(args.iter().copied()))
        }
    }

    #[async_trait]
    impl CommandRunner for ScriptedCommandRunner {
        async fn run(&self, program: &Path, args: &[&str]) -> Result<CommandOutput, SupervisorError> {
            self.calls
                .lock()
                .unwrap()
                .push(args.iter().map(|a| a.to_string()).collect());

            let key = args.join(" ");
            if self.spawn_failures.lock().unwrap().contains(&key) {
                return Err(SupervisorError::Spawn {
                    program: program.display().to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "scripted spawn failure"),
                });
            }

            Ok(self
                .responses
                .lock()
                .unwrap()
                .get(&key)
                .cloned()
                .unwrap_or_else(|| CommandOutput::ok("")))
        }
    }
}
