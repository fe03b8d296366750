// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod robot_control;
pub mod service_locks;

// Re-export use cases for convenience
pub use robot_control::{RobotControlService, RobotError, StandardRobotControlService};
pub use service_locks::ServiceLocks;
