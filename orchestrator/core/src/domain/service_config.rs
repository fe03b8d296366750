// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Service Configuration Types
//
// Defines the configuration schema for a fundbot control node:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - gRPC listener settings
// - supervisord paths and command timeout
// - Values substituted into each robot's program config
// - Logging settings

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const API_VERSION: &str = "fundbot/v1";
pub const KIND: &str = "ServiceConfig";

/// Top-level configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfigManifest {
    /// API version (must be "fundbot/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "ServiceConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    #[serde(default)]
    pub spec: ServiceConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Human-readable node name
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfigSpec {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub supervisor: SupervisorConfig,

    #[serde(default)]
    pub robot: RobotTemplateConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Network bind address (e.g. "0.0.0.0" or "127.0.0.1")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// gRPC port
    #[serde(default = "default_grpc_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// Path to the supervisor control executable
    #[serde(default = "default_ctl_path")]
    pub ctl_path: PathBuf,

    /// Directory supervisord includes program configs from
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,

    /// Upper bound on a single supervisorctl invocation
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,
}

/// Values rendered into every robot's program config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotTemplateConfig {
    /// Interpreter that runs the robot script
    #[serde(default = "default_python")]
    pub python: String,

    /// Robot entry point, invoked as `<script> <name> -s <currency>`
    #[serde(default = "default_script")]
    pub script: String,

    /// Directory for `<service>.out.log` / `<service>.err.log`
    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    /// OS user the supervisor runs the robot as
    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default = "default_true")]
    pub autostart: bool,

    #[serde(default = "default_true")]
    pub autorestart: bool,

    /// Handlebars template replacing the built-in program template
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "trace")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format ("json" or "text")
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_grpc_port() -> u16 {
    50051
}

fn default_ctl_path() -> PathBuf {
    PathBuf::from("/usr/bin/supervisorctl")
}

fn default_config_dir() -> PathBuf {
    PathBuf::from("/etc/supervisor/conf.d")
}

fn default_command_timeout() -> u64 {
    30
}

fn default_python() -> String {
    "/home/john/SuperFundingBot/.venv/bin/python".to_string()
}

fn default_script() -> String {
    "/home/john/bitfinex-funding-robot/create_funding_offers3.py".to_string()
}

fn default_log_dir() -> String {
    "/var/log/ifund".to_string()
}

fn default_user() -> String {
    "john".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_grpc_port(),
        }
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            ctl_path: default_ctl_path(),
            config_dir: default_config_dir(),
            command_timeout_secs: default_command_timeout(),
        }
    }
}

impl Default for RobotTemplateConfig {
    fn default() -> Self {
        Self {
            python: default_python(),
            script: default_script(),
            log_dir: default_log_dir(),
            user: default_user(),
            autostart: true,
            autorestart: true,
            template_path: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for ServiceConfigManifest {
    fn default() -> Self {
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "fundbot-node".to_string());

        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: hostname,
                version: Some("1.0.0".to_string()),
            },
            spec: ServiceConfigSpec::default(),
        }
    }
}

impl ServiceConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Candidate locations in discovery order.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Ok(path) = std::env::var("FUNDBOT_CONFIG_PATH") {
            paths.push(PathBuf::from(path));
        }
        paths.push(PathBuf::from("./fundbot-config.yaml"));
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".fundbot").join("config.yaml"));
        }
        paths.push(PathBuf::from("/etc/fundbot/config.yaml"));
        paths
    }

    /// Discover configuration file using precedence order
    /// 1. FUNDBOT_CONFIG_PATH environment variable
    /// 2. ./fundbot-config.yaml (working directory)
    /// 3. ~/.fundbot/config.yaml (user home)
    /// 4. /etc/fundbot/config.yaml (system)
    pub fn discover_config() -> Option<PathBuf> {
        Self::search_paths().into_iter().find(|p| p.exists())
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path must exist and parse
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        let mut config = match Self::discover_config() {
            Some(path) => {
                tracing::info!("Loading configuration from discovered path: {:?}", path);
                Self::from_yaml_file(&path)
                    .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?
            }
            None => {
                tracing::warn!("No configuration file found in standard locations. Using defaults.");
                Self::default()
            }
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("FUNDBOT_SUPERVISORCTL") {
            tracing::info!("Environment override: FUNDBOT_SUPERVISORCTL={}", val);
            self.spec.supervisor.ctl_path = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("FUNDBOT_CONFIG_DIR") {
            tracing::info!("Environment override: FUNDBOT_CONFIG_DIR={}", val);
            self.spec.supervisor.config_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("FUNDBOT_GRPC_PORT") {
            match val.parse::<u16>() {
                Ok(port) => {
                    tracing::info!("Environment override: FUNDBOT_GRPC_PORT={}", port);
                    self.spec.server.port = port;
                }
                Err(_) => {
                    tracing::warn!(
                        "Invalid value for FUNDBOT_GRPC_PORT: '{}'. Expected a port number. Ignoring.",
                        val
                    );
                }
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        if self.spec.server.port == 0 {
            anyhow::bail!("spec.server.port cannot be 0");
        }

        let supervisor = &self.spec.supervisor;
        if supervisor.ctl_path.as_os_str().is_empty() {
            anyhow::bail!("spec.supervisor.ctl_path cannot be empty");
        }
        if supervisor.config_dir.as_os_str().is_empty() {
            anyhow::bail!("spec.supervisor.config_dir cannot be empty");
        }
        if supervisor.command_timeout_secs == 0 {
            anyhow::bail!("spec.supervisor.command_timeout_secs must be at least 1");
        }

        let robot = &self.spec.robot;
        if robot.python.is_empty() || robot.script.is_empty() {
            anyhow::bail!("spec.robot.python and spec.robot.script cannot be empty");
        }
        if robot.log_dir.is_empty() {
            anyhow::bail!("spec.robot.log_dir cannot be empty");
        }
        if robot.user.is_empty() {
            anyhow::bail!("spec.robot.user cannot be empty");
        }

        match self.spec.logging.format.as_str() {
            "text" | "json" => {}
            other => anyhow::bail!("Invalid spec.logging.format '{}'. Expected text or json", other),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_manifest() {
        let manifest = ServiceConfigManifest::default();
        assert_eq!(manifest.api_version, "fundbot/v1");
        assert_eq!(manifest.kind, "ServiceConfig");
        assert!(!manifest.metadata.name.is_empty());
        assert_eq!(manifest.spec.server.port, 50051);
        assert_eq!(
            manifest.spec.supervisor.config_dir,
            PathBuf::from("/etc/supervisor/conf.d")
        );
        assert_eq!(
            manifest.spec.supervisor.ctl_path,
            PathBuf::from("/usr/bin/supervisorctl")
        );
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = r#"
apiVersion: fundbot/v1
kind: ServiceConfig
metadata:
  name: lender-01
spec:
  supervisor:
    config_dir: /tmp/conf.d
  robot:
    user: robots
"#;
        let manifest = ServiceConfigManifest::from_yaml_str(yaml).unwrap();
        assert_eq!(manifest.metadata.name, "lender-01");
        assert_eq!(manifest.spec.supervisor.config_dir, PathBuf::from("/tmp/conf.d"));
        assert_eq!(manifest.spec.supervisor.command_timeout_secs, 30);
        assert_eq!(manifest.spec.robot.user, "robots");
        assert_eq!(manifest.spec.robot.log_dir, "/var/log/ifund");
        assert!(manifest.spec.robot.autorestart);
        assert_eq!(manifest.spec.logging.format, "text");
    }

    #[test]
    fn test_validation() {
        let mut manifest = ServiceConfigManifest::default();
        assert!(manifest.validate().is_ok());

        manifest.api_version = "wrong/v1".to_string();
        assert!(manifest.validate().is_err());
        manifest.api_version = API_VERSION.to_string();

        manifest.kind = "NodeConfig".to_string();
        assert!(manifest.validate().is_err());
        manifest.kind = KIND.to_string();

        manifest.spec.supervisor.command_timeout_secs = 0;
        assert!(manifest.validate().is_err());
        manifest.spec.supervisor.command_timeout_secs = 5;

        manifest.spec.logging.format = "xml".to_string();
        assert!(manifest.validate().is_err());
        manifest.spec.logging.format = "json".to_string();

        manifest.spec.robot.user = String::new();
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_explicit_missing_path_fails() {
        let result = ServiceConfigManifest::load_or_default(Some(PathBuf::from(
            "/nonexistent/fundbot-config.yaml",
        )));
        assert!(result.is_err());
    }
}
