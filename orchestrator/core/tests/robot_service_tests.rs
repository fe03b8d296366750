// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! End-to-end tests for the robot control use cases.
//!
//! Each test runs the real supervisord adapter against a temporary config
//! directory, with `supervisorctl` replaced by a scripted runner that
//! records every invocation.

use std::sync::Arc;

use fundbot_core::application::{RobotControlService, RobotError, StandardRobotControlService};
use fundbot_core::domain::robot::RobotIdentity;
use fundbot_core::domain::service_config::RobotTemplateConfig;
use fundbot_core::domain::state::RobotState;
use fundbot_core::domain::supervisor::{ConfigOutcome, RobotAction};
use fundbot_core::infrastructure::{
    CommandOutput, ProgramTemplate, ScriptedCommandRunner, SupervisorCtl,
};
use tempfile::TempDir;

struct Harness {
    dir: TempDir,
    runner: ScriptedCommandRunner,
    service: Arc<StandardRobotControlService>,
}

impl Harness {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let runner = ScriptedCommandRunner::new();
        let template = ProgramTemplate::from_config(RobotTemplateConfig::default()).unwrap();
        let supervisor = SupervisorCtl::new(
            "/usr/bin/supervisorctl",
            dir.path(),
            template,
            Arc::new(runner.clone()),
        );
        let service = Arc::new(StandardRobotControlService::new(Arc::new(supervisor)));
        Self {
            dir,
            runner,
            service,
        }
    }

    fn conf(&self, file: &str) -> std::path::PathBuf {
        self.dir.path().join(file)
    }

    fn write_conf(&self, file: &str, content: &str) {
        std::fs::write(self.conf(file), content).unwrap();
    }

    fn read_conf(&self, file: &str) -> String {
        std::fs::read_to_string(self.conf(file)).unwrap()
    }
}

fn robot(name: &str, currency: &str) -> RobotIdentity {
    RobotIdentity::new(name, currency).unwrap()
}

#[tokio::test]
async fn test_create_robot_writes_substituted_config() {
    let h = Harness::new();

    let outcome = h.service.create_robot(&robot("DEAN.LIN", "fUSD")).await.unwrap();

    assert!(matches!(outcome, ConfigOutcome::Created(_)));
    let content = h.read_conf("dean.lin_fUSD.conf");
    assert!(content.starts_with("[program:dean.lin_fUSD]\n"));
    assert!(content.contains(
        "command=/home/john/SuperFundingBot/.venv/bin/python \
         /home/john/bitfinex-funding-robot/create_funding_offers3.py dean.lin -s fUSD"
    ));
    assert!(content.contains("stderr_logfile=/var/log/ifund/dean.lin_fUSD.err.log"));
    assert_eq!(h.runner.calls(), vec![vec!["update".to_string()]]);
}

#[tokio::test]
async fn test_create_robot_is_idempotent() {
    let h = Harness::new();
    let dean = robot("DEAN.LIN", "fUSD");

    h.service.create_robot(&dean).await.unwrap();
    let first = h.read_conf("dean.lin_fUSD.conf");

    let outcome = h.service.create_robot(&dean).await.unwrap();
    assert!(matches!(outcome, ConfigOutcome::AlreadyPresent(_)));
    assert_eq!(h.read_conf("dean.lin_fUSD.conf"), first);

    let entries = std::fs::read_dir(h.dir.path()).unwrap().count();
    assert_eq!(entries, 1);
}

#[tokio::test]
async fn test_concurrent_creates_leave_one_config() {
    let h = Harness::new();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = h.service.clone();
        handles.push(tokio::spawn(async move {
            service.create_robot(&robot("alice", "fBTC")).await
        }));
    }

    let mut created = 0;
    for handle in handles {
        if let ConfigOutcome::Created(_) = handle.await.unwrap().unwrap() {
            created += 1;
        }
    }

    assert_eq!(created, 1);
    assert!(h.conf("alice_fBTC.conf").is_file());
    assert_eq!(std::fs::read_dir(h.dir.path()).unwrap().count(), 1);
}

#[tokio::test]
async fn test_create_into_missing_directory_fails() {
    let h = Harness::new();
    let missing = h.dir.path().join("nope");
    let supervisor = SupervisorCtl::new(
        "/usr/bin/supervisorctl",
        &missing,
        ProgramTemplate::from_config(RobotTemplateConfig::default()).unwrap(),
        Arc::new(h.runner.clone()),
    );
    let service = StandardRobotControlService::new(Arc::new(supervisor));

    let err = service.create_robot(&robot("bob", "fUSD")).await.unwrap_err();
    assert!(matches!(err, RobotError::CreateFailed(_)));
    assert!(err.to_string().starts_with("create failed: "));
    assert!(h.runner.calls().is_empty());
}

#[tokio::test]
async fn test_status_yields_single_token_or_unknown() {
    let h = Harness::new();
    h.runner.respond(
        &["status", "bob_fUSD"],
        CommandOutput::ok("bob_fUSD                         STARTING  \n"),
    );
    h.runner.respond(
        &["status", "bob_fEUR"],
        CommandOutput::failed(3, "bob_fEUR   STOPPED   Oct 16 09:12 AM\n"),
    );
    h.runner.respond(
        &["status", "bob_fBTC"],
        CommandOutput::failed(4, "bob_fBTC: ERROR (no such process)\n"),
    );

    assert_eq!(
        h.service.robot_status(&robot("bob", "fUSD")).await.unwrap(),
        RobotState::Starting
    );
    assert_eq!(
        h.service.robot_status(&robot("bob", "fEUR")).await.unwrap(),
        RobotState::Stopped
    );
    let unknown = h.service.robot_status(&robot("bob", "fBTC")).await.unwrap();
    assert_eq!(unknown, RobotState::Unknown);
    assert_eq!(unknown.as_str(), "");
}

#[tokio::test]
async fn test_start_issues_start() {
    let h = Harness::new();
    h.runner
        .respond(&["start", "bob_fUSD"], CommandOutput::ok("bob_fUSD: started\n"));

    let output = h
        .service
        .change_state(&robot("BOB", "fUSD"), RobotAction::Start)
        .await
        .unwrap();

    assert!(output.contains("started"));
    assert!(h.runner.was_called_with(&["start", "bob_fUSD"]));
    assert!(!h.runner.was_called_with(&["stop", "bob_fUSD"]));
}

#[tokio::test]
async fn test_error_output_fails_action() {
    let h = Harness::new();
    h.runner.respond(
        &["restart", "bob_fUSD"],
        CommandOutput::ok("bob_fUSD: ERROR (no such process)\n"),
    );

    let err = h
        .service
        .change_state(&robot("bob", "fUSD"), RobotAction::Restart)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("ERROR (no such process)"));
}

#[tokio::test]
async fn test_migrate_renames_source_and_restarts_target() {
    let h = Harness::new();
    let bob = robot("bob", "fUSD");
    h.service.create_robot(&bob).await.unwrap();

    h.service.migrate_robot(&bob, "fBTC").await.unwrap();

    assert!(!h.conf("bob_fUSD.conf").exists());
    let migrated = h.read_conf("bob_fBTC.conf");
    assert!(migrated.starts_with("[program:bob_fBTC]\n"));
    assert!(migrated.contains("bob -s fBTC"));
    assert!(!migrated.contains("fUSD"));

    let calls = h.runner.calls();
    assert_eq!(
        calls.last().unwrap(),
        &vec!["restart".to_string(), "bob_fBTC".to_string()]
    );
    assert!(h.runner.was_called_with(&["update"]));
}

#[tokio::test]
async fn test_migrate_with_existing_target_deletes_source() {
    let h = Harness::new();
    h.write_conf("bob_fUSD.conf", "[program:bob_fUSD]\n");
    h.write_conf("bob_fBTC.conf", "[program:bob_fBTC]\ncommand=keep me\n");

    h.service
        .migrate_robot(&robot("bob", "fUSD"), "fBTC")
        .await
        .unwrap();

    assert!(!h.conf("bob_fUSD.conf").exists());
    assert_eq!(
        h.read_conf("bob_fBTC.conf"),
        "[program:bob_fBTC]\ncommand=keep me\n"
    );
    assert!(h.runner.was_called_with(&["restart", "bob_fBTC"]));
}

#[tokio::test]
async fn test_migrate_without_source_creates_target() {
    let h = Harness::new();

    h.service
        .migrate_robot(&robot("carol", "fUSD"), "fETH")
        .await
        .unwrap();

    assert!(!h.conf("carol_fUSD.conf").exists());
    assert!(h.read_conf("carol_fETH.conf").contains("carol -s fETH"));
    assert!(h.runner.was_called_with(&["restart", "carol_fETH"]));
}

#[tokio::test]
async fn test_migrate_restart_failure_is_reported() {
    let h = Harness::new();
    h.runner.respond(
        &["restart", "bob_fBTC"],
        CommandOutput::failed(7, "bob_fBTC: ERROR (spawn error)\n"),
    );

    let err = h
        .service
        .migrate_robot(&robot("bob", "fUSD"), "fBTC")
        .await
        .unwrap_err();
    assert!(matches!(err, RobotError::Supervisor(_)));
    assert!(h.conf("bob_fBTC.conf").is_file());
}

#[tokio::test]
async fn test_migrate_keeps_name_that_contains_currency() {
    let h = Harness::new();
    let king = robot("usdking", "usd");
    h.service.create_robot(&king).await.unwrap();

    h.service.migrate_robot(&king, "btc").await.unwrap();

    assert!(!h.conf("usdking_usd.conf").exists());
    let migrated = h.read_conf("usdking_btc.conf");
    assert!(migrated.starts_with("[program:usdking_btc]\n"));
    assert!(migrated.contains("create_funding_offers3.py usdking -s btc"));
    assert!(migrated.contains("stderr_logfile=/var/log/ifund/usdking_btc.err.log"));
    assert!(h.runner.was_called_with(&["restart", "usdking_btc"]));
}

#[tokio::test]
async fn test_migrate_io_failure_is_reported_without_restart() {
    let h = Harness::new();
    let bob = robot("bob", "fUSD");
    h.service.create_robot(&bob).await.unwrap();
    std::fs::create_dir(h.conf("bob_fBTC.conf")).unwrap();

    let err = h.service.migrate_robot(&bob, "fBTC").await.unwrap_err();

    assert!(matches!(err, RobotError::MigrateFailed(_)));
    assert!(err.to_string().starts_with("migrate failed: "));
    assert!(h.conf("bob_fUSD.conf").is_file());
    assert!(!h.runner.was_called_with(&["restart", "bob_fBTC"]));
    // Only the `update` from create_robot.
    assert_eq!(h.runner.calls(), vec![vec!["update".to_string()]]);
}
