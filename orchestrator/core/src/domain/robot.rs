// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Robot Identity
//!
//! A funding robot is keyed by the owning user's name and the currency it
//! lends. Everything the supervisor sees (program name, config filename,
//! template values) is derived from that pair, so normalization happens
//! exactly once, here.
//!
//! # Normalization
//!
//! The name is lowercased, the currency is kept verbatim:
//! `RobotIdentity::new("DEAN.LIN", "fUSD")` becomes service `dean.lin_fUSD`
//! with config file `dean.lin_fUSD.conf`.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Identity value object and derived supervisor names

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

const MAX_COMPONENT_LEN: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Robot name cannot be empty")]
    EmptyName,

    #[error("Currency cannot be empty")]
    EmptyCurrency,

    #[error("Invalid robot name '{0}': only ASCII letters, digits, '.', '-' and '_' are allowed")]
    InvalidName(String),

    #[error("Invalid currency '{0}': only ASCII letters and digits are allowed")]
    InvalidCurrency(String),

    #[error("'{0}' exceeds 64 characters")]
    TooLong(String),
}

/// Normalized `(name, currency)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RobotIdentity {
    name: String,
    currency: String,
}

impl RobotIdentity {
    /// Validate and normalize a robot identity.
    pub fn new(name: &str, currency: &str) -> Result<Self, IdentityError> {
        let name = name.trim();
        let currency = currency.trim();

        if name.is_empty() {
            return Err(IdentityError::EmptyName);
        }
        if currency.is_empty() {
            return Err(IdentityError::EmptyCurrency);
        }
        if name.len() > MAX_COMPONENT_LEN {
            return Err(IdentityError::TooLong(name.to_string()));
        }
        if currency.len() > MAX_COMPONENT_LEN {
            return Err(IdentityError::TooLong(currency.to_string()));
        }

        // "." and ".." would escape the config directory once joined.
        let name_ok = name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
            && name.chars().any(|c| c.is_ascii_alphanumeric());
        if !name_ok {
            return Err(IdentityError::InvalidName(name.to_string()));
        }
        if !currency.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(IdentityError::InvalidCurrency(currency.to_string()));
        }

        Ok(Self {
            name: name.to_ascii_lowercase(),
            currency: currency.to_string(),
        })
    }

    /// Lowercased robot name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Same robot, different currency.
    pub fn with_currency(&self, currency: &str) -> Result<Self, IdentityError> {
        Self::new(&self.name, currency)
    }

    /// Supervisor program name: `<name>_<currency>`.
    pub fn service_name(&self) -> ServiceName {
        ServiceName(format!("{}_{}", self.name, self.currency))
    }

    /// `<config_dir>/<service_name>.conf`
    pub fn config_path(&self, config_dir: &Path) -> PathBuf {
        config_dir.join(format!("{}.conf", self.service_name()))
    }
}

impl fmt::Display for RobotIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.currency)
    }
}

/// Program name as registered with the supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceName(String);

impl ServiceName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ServiceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
