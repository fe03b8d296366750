// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`fundbot-core`)
//!
//! gRPC surface that translates `ifundrobot.Ifundrobot` requests into
//! [`crate::application::RobotControlService`] calls. Reply codes and
//! transport statuses are decided here; nothing below this layer knows
//! about protobuf.

pub mod grpc;
