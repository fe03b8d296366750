// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Program Config Template
//!
//! Renders a supervisord `[program:x]` block for one robot using Handlebars.
//!
//! # Supported Placeholders
//!
//! - `{{program}}` - supervisor program name (`<name>_<currency>`)
//! - `{{name}}` - lowercased robot name
//! - `{{currency}}` - currency, verbatim
//! - `{{python}}`, `{{script}}` - robot command line
//! - `{{log_dir}}`, `{{user}}`, `{{autostart}}`, `{{autorestart}}`
//!
//! Strict mode is on: a template referencing an unknown placeholder fails to
//! render instead of silently producing a broken config.

use handlebars::Handlebars;
use serde::Serialize;

use crate::domain::robot::RobotIdentity;
use crate::domain::service_config::RobotTemplateConfig;
use crate::domain::supervisor::SupervisorError;

const BUILTIN_TEMPLATE: &str = include_str!("../../templates/robot-program.conf.hbs");
const TEMPLATE_NAME: &str = "program";

#[derive(Debug, Serialize)]
struct ProgramContext<'a> {
    program: String,
    name: &'a str,
    currency: &'a str,
    python: &'a str,
    script: &'a str,
    log_dir: &'a str,
    user: &'a str,
    autostart: bool,
    autorestart: bool,
}

pub struct ProgramTemplate {
    handlebars: Handlebars<'static>,
    settings: RobotTemplateConfig,
}

impl ProgramTemplate {
    /// Compile the configured template, or the built-in one when
    /// `template_path` is unset.
    pub fn from_config(settings: RobotTemplateConfig) -> Result<Self, SupervisorError> {
        let source = match &settings.template_path {
            Some(path) => std::fs::read_to_string(path)
                .map_err(|e| SupervisorError::config_io(path, e))?,
            None => BUILTIN_TEMPLATE.to_string(),
        };
        Self::with_source(&source, settings)
    }

    pub fn with_source(source: &str, settings: RobotTemplateConfig) -> Result<Self, SupervisorError> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        // Output is an INI file, not HTML.
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars
            .register_template_string(TEMPLATE_NAME, source)
            .map_err(|e| SupervisorError::Template(e.to_string()))?;

        Ok(Self { handlebars, settings })
    }

    pub fn render(&self, robot: &RobotIdentity) -> Result<String, SupervisorError> {
        let context = ProgramContext {
            program: robot.service_name().to_string(),
            name: robot.name(),
            currency: robot.currency(),
            python: &self.settings.python,
            script: &self.settings.script,
            log_dir: self.settings.log_dir.trim_end_matches('/'),
            user: &self.settings.user,
            autostart: self.settings.autostart,
            autorestart: self.settings.autorestart,
        };

        self.handlebars
            .render(TEMPLATE_NAME, &context)
            .map_err(|e| SupervisorError::Template(e.to_string()))
    }
}
