// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! gRPC Server Implementation for the funding robot control service
//! Exposes CreateRobot, RobotStatus, StartRobot, StopRobot, RestartRobot, MigrateRobot

use std::future::Future;
use std::sync::Arc;
use tonic::{Request, Response, Status};

use crate::application::robot_control::{RobotControlService, RobotError};
use crate::domain::robot::RobotIdentity;
use crate::domain::supervisor::RobotAction;

// Generated protobuf code
pub mod ifundrobot {
    tonic::include_proto!("ifundrobot");
}

use ifundrobot::ifundrobot_server::{Ifundrobot, IfundrobotServer};
use ifundrobot::*;

const CODE_OK: i32 = 0;
const CODE_FAILED: i32 = 1;

/// Implementation of the Ifundrobot gRPC service
pub struct RobotControlGrpcService {
    robot_service: Arc<dyn RobotControlService>,
}

impl RobotControlGrpcService {
    pub fn new(robot_service: Arc<dyn RobotControlService>) -> Self {
        Self { robot_service }
    }

    /// Create a gRPC server instance
    pub fn into_server(self) -> IfundrobotServer<Self> {
        IfundrobotServer::new(self)
    }

    async fn action_reply(
        &self,
        request: RobotRequest,
        action: RobotAction,
    ) -> Result<Response<StatusReply>, Status> {
        let robot = parse_identity(&request.name, &request.currency)?;
        let reply = match self.robot_service.change_state(&robot, action).await {
            Ok(output) => StatusReply {
                code: CODE_OK,
                state: String::new(),
                message: output,
            },
            Err(e) => status_failure(e)?,
        };
        Ok(Response::new(reply))
    }
}

fn parse_identity(name: &str, currency: &str) -> Result<RobotIdentity, Status> {
    RobotIdentity::new(name, currency)
        .map_err(|e| Status::invalid_argument(format!("Invalid robot identity: {}", e)))
}

/// Malformed requests become transport errors; everything else is a
/// `code = 1` reply carrying the error text.
fn status_failure(err: RobotError) -> Result<StatusReply, Status> {
    match err {
        RobotError::InvalidIdentity(_) | RobotError::SameCurrency(_) => {
            Err(Status::invalid_argument(err.to_string()))
        }
        other => Ok(StatusReply {
            code: CODE_FAILED,
            state: String::new(),
            message: other.to_string(),
        }),
    }
}

#[tonic::async_trait]
impl Ifundrobot for RobotControlGrpcService {
    async fn create_robot(
        &self,
        request: Request<RobotRequest>,
    ) -> Result<Response<CreateReply>, Status> {
        let req = request.into_inner();
        let robot = parse_identity(&req.name, &req.currency)?;

        let reply = match self.robot_service.create_robot(&robot).await {
            Ok(_) => CreateReply {
                code: CODE_OK,
                message: "create success".to_string(),
            },
            Err(RobotError::InvalidIdentity(e)) => {
                return Err(Status::invalid_argument(e.to_string()))
            }
            Err(e) => CreateReply {
                code: CODE_FAILED,
                message: e.to_string(),
            },
        };
        Ok(Response::new(reply))
    }

    async fn robot_status(
        &self,
        request: Request<RobotRequest>,
    ) -> Result<Response<StatusReply>, Status> {
        let req = request.into_inner();
        let robot = parse_identity(&req.name, &req.currency)?;

        let reply = match self.robot_service.robot_status(&robot).await {
            Ok(state) if state.is_known() => StatusReply {
                code: CODE_OK,
                state: state.as_str().to_string(),
                message: String::new(),
            },
            Ok(_) => StatusReply {
                code: CODE_FAILED,
                state: String::new(),
                message: String::new(),
            },
            Err(e) => status_failure(e)?,
        };
        Ok(Response::new(reply))
    }

    async fn stop_robot(
        &self,
        request: Request<RobotRequest>,
    ) -> Result<Response<StatusReply>, Status> {
        self.action_reply(request.into_inner(), RobotAction::Stop).await
    }

    async fn start_robot(
        &self,
        request: Request<RobotRequest>,
    ) -> Result<Response<StatusReply>, Status> {
        self.action_reply(request.into_inner(), RobotAction::Start).await
    }

    async fn restart_robot(
        &self,
        request: Request<RobotRequest>,
    ) -> Result<Response<StatusReply>, Status> {
        self.action_reply(request.into_inner(), RobotAction::Restart).await
    }

    async fn migrate_robot(
        &self,
        request: Request<RobotMigrateRequest>,
    ) -> Result<Response<StatusReply>, Status> {
        let req = request.into_inner();
        let robot = parse_identity(&req.name, &req.from_currency)?;

        let reply = match self.robot_service.migrate_robot(&robot, &req.to_currency).await {
            Ok(output) => StatusReply {
                code: CODE_OK,
                state: String::new(),
                message: output,
            },
            Err(e) => status_failure(e)?,
        };
        Ok(Response::new(reply))
    }
}

/// Start the gRPC server and run until `shutdown` resolves.
pub async fn start_grpc_server<F>(
    addr: std::net::SocketAddr,
    robot_service: Arc<dyn RobotControlService>,
    shutdown: F,
) -> Result<(), tonic::transport::Error>
where
    F: Future<Output = ()> + Send,
{
    let service = RobotControlGrpcService::new(robot_service);
    let server = service.into_server();

    tracing::info!("Starting robot control gRPC server on {}", addr);

    tonic::transport::Server::builder()
        .add_service(server)
        .serve_with_shutdown(addr, shutdown)
        .await?;

    tracing::info!("gRPC server stopped");
    Ok(())
}
