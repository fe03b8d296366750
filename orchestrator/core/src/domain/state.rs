// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Robot run state as reported by `supervisorctl status`.
//!
//! Only three supervisor states are meaningful to clients. Everything else
//! (`FATAL`, `BACKOFF`, `EXITED`, "no such process", garbage) collapses to
//! [`RobotState::Unknown`], which is not an error.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static STATUS_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?P<name>[a-zA-Z]+).*?\b(?P<state>STARTING|STOPPED|RUNNING)\b")
        .expect("status pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RobotState {
    Starting,
    Stopped,
    Running,
    Unknown,
}

impl RobotState {
    /// Scrape the first recognised state that follows a program name.
    pub fn from_status_output(output: &str) -> Self {
        STATUS_LINE
            .captures(output)
            .and_then(|caps| caps.name("state"))
            .map(|m| Self::from_token(m.as_str()))
            .unwrap_or(Self::Unknown)
    }

    fn from_token(token: &str) -> Self {
        match token {
            "STARTING" => Self::Starting,
            "STOPPED" => Self::Stopped,
            "RUNNING" => Self::Running,
            _ => Self::Unknown,
        }
    }

    /// Wire token. `Unknown` is the empty string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starting => "STARTING",
            Self::Stopped => "STOPPED",
            Self::Running => "RUNNING",
            Self::Unknown => "",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for RobotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("UNKNOWN"),
            other => f.write_str(other.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_supervisorctl_lines() {
        let running = "dean.lin_fUSD                    RUNNING   pid 4242, uptime 1:02:03\n";
        assert_eq!(RobotState::from_status_output(running), RobotState::Running);

        let stopped = "dean.lin_fUSD                    STOPPED   Oct 16 09:12 AM\n";
        assert_eq!(RobotState::from_status_output(stopped), RobotState::Stopped);

        let starting = "alice_fBTC                       STARTING  \n";
        assert_eq!(RobotState::from_status_output(starting), RobotState::Starting);
    }

    #[test]
    fn test_unrecognised_states_are_unknown() {
        for output in [
            "dean.lin_fUSD: ERROR (no such process)\n",
            "dean.lin_fUSD                    FATAL     Exited too quickly\n",
            "dean.lin_fUSD                    BACKOFF   Exited too quickly\n",
            "",
            "RUNNING",
        ] {
            assert_eq!(RobotState::from_status_output(output), RobotState::Unknown, "{output:?}");
        }
    }

    #[test]
    fn test_only_whole_tokens_match() {
        let output = "bob_fUSD  NOTRUNNINGYET\n";
        assert_eq!(RobotState::from_status_output(output), RobotState::Unknown);
    }

    #[test]
    fn test_wire_tokens() {
        assert_eq!(RobotState::Running.as_str(), "RUNNING");
        assert_eq!(RobotState::Unknown.as_str(), "");
        assert!(!RobotState::Unknown.is_known());
        assert_eq!(RobotState::Unknown.to_string(), "UNKNOWN");
    }
}
