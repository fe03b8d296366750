// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! gRPC client for a running `fundbot serve`.
//!
//! Every call carries a deadline; a server that does not answer in time
//! surfaces as an error instead of hanging the command.

use anyhow::{Context, Result};
use std::time::Duration;
use tonic::transport::{Channel, Endpoint};

use fundbot_core::presentation::grpc::ifundrobot::ifundrobot_client::IfundrobotClient;
use fundbot_core::presentation::grpc::ifundrobot::{
    CreateReply, RobotMigrateRequest, RobotRequest, StatusReply,
};

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:50051";

/// Robot state-change RPCs sharing the `RobotRequest -> StatusReply` shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RobotCall {
    Status,
    Start,
    Stop,
    Restart,
}

pub struct RobotClient {
    inner: IfundrobotClient<Channel>,
    timeout: Duration,
}

impl RobotClient {
    pub async fn connect(server: &str, timeout: Duration) -> Result<Self> {
        let endpoint = Endpoint::from_shared(normalize_server(server))
            .with_context(|| format!("Invalid server address '{}'", server))?
            .connect_timeout(timeout)
            .timeout(timeout);

        let channel = endpoint
            .connect()
            .await
            .with_context(|| format!("Failed to connect to {}", server))?;

        Ok(Self {
            inner: IfundrobotClient::new(channel),
            timeout,
        })
    }

    fn request<T>(&self, message: T) -> tonic::Request<T> {
        let mut request = tonic::Request::new(message);
        request.set_timeout(self.timeout);
        request
    }

    pub async fn create(&mut self, name: &str, currency: &str) -> Result<CreateReply> {
        let request = self.request(robot_request(name, currency));
        let reply = self
            .inner
            .create_robot(request)
            .await
            .context("CreateRobot failed")?;
        Ok(reply.into_inner())
    }

    pub async fn call(&mut self, call: RobotCall, name: &str, currency: &str) -> Result<StatusReply> {
        let request = self.request(robot_request(name, currency));
        let reply = match call {
            RobotCall::Status => self.inner.robot_status(request).await,
            RobotCall::Start => self.inner.start_robot(request).await,
            RobotCall::Stop => self.inner.stop_robot(request).await,
            RobotCall::Restart => self.inner.restart_robot(request).await,
        }
        .with_context(|| format!("{:?} request failed", call))?;
        Ok(reply.into_inner())
    }

    pub async fn migrate(&mut self, name: &str, from: &str, to: &str) -> Result<StatusReply> {
        let request = self.request(RobotMigrateRequest {
            name: name.to_string(),
            from_currency: from.to_string(),
            to_currency: to.to_string(),
        });
        let reply = self
            .inner
            .migrate_robot(request)
            .await
            .context("MigrateRobot failed")?;
        Ok(reply.into_inner())
    }
}

fn robot_request(name: &str, currency: &str) -> RobotRequest {
    RobotRequest {
        name: name.to_string(),
        currency: currency.to_string(),
    }
}

/// Accept bare `host:port` the way `IFUND_SERVER` is usually set.
pub fn normalize_server(server: &str) -> String {
    if server.contains("://") {
        server.to_string()
    } else {
        format!("http://{}", server)
    }
}
