// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod command;
pub mod program_template;
pub mod supervisorctl;

pub use command::{CommandOutput, CommandRunner, ScriptedCommandRunner, TokioCommandRunner};
pub use program_template::ProgramTemplate;
pub use supervisorctl::SupervisorCtl;
