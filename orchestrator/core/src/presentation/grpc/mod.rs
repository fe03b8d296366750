// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod server;

pub use server::ifundrobot;
pub use server::{start_grpc_server, RobotControlGrpcService};
