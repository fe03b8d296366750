// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Mod
//!
//! Robot identity, run state, the process supervisor port and service
//! configuration.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Implements mod

pub mod robot;
pub mod state;
pub mod supervisor;
pub mod service_config;
