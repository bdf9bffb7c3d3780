//! End-to-end request handling with shipped templates and fake collaborators

use playforge_core::{PipelineError, PipelineOptions, PipelineReport};
use playforge_generate::{BodySource, RepairOutcome};
use playforge_intent::IntentKind;
use playforge_sync::{CommitOutcome, GitOutput, PushMode, PushReport, SyncError};
use playforge_test_utils::{remote_config, FakeBackend, FakeGit, FakeValidator, Workspace};
use pretty_assertions::assert_eq;

const MYSQL_PLAYBOOK: &str = "---\n- name: Install mysql\n  hosts: all\n  become: true\n  tasks:\n    - name: Install mysql\n      package:\n        name: mysql\n        state: present\n";

const REDIS_PLAYBOOK: &str = "---\n- name: Install redis\n  hosts: all\n  become: true\n  tasks:\n    - name: Install redis\n      package:\n        name: redis\n        state: present\n";

fn generated(report: PipelineReport) -> playforge_core::GenerationReport {
    match report {
        PipelineReport::Generated(report) => report,
        PipelineReport::Reused(report) => {
            panic!("expected generation, reused {}", report.artifact.file_name)
        }
    }
}

#[tokio::test]
async fn nginx_request_is_templated_committed_and_pushed() {
    let ws = Workspace::new().with_git(remote_config(PushMode::Immediate));
    let git = FakeGit::new();
    let validator = FakeValidator::passing();
    let (pipeline, _) = ws.pipeline(&git, validator.clone(), None).await;

    let report = pipeline
        .process("Install nginx on Ubuntu", PipelineOptions::default())
        .await
        .unwrap();
    let report = generated(report);

    let resolution = &report.resolution;
    assert_eq!(resolution.kind(), IntentKind::InstallPackage);
    assert_eq!(resolution.os_type, "ubuntu");
    assert_eq!(resolution.target_hosts, "all");
    assert_eq!(resolution.parameters().get("package_name"), Some("nginx"));

    assert_eq!(report.source, BodySource::Template);
    assert_eq!(report.repair, RepairOutcome::WellFormed);
    assert!(report.validation.valid);
    assert_eq!(validator.checked(), vec![report.path.clone()]);

    let body = std::fs::read_to_string(&report.path).unwrap();
    assert!(body.contains("nginx"));
    assert!(report
        .path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("install_package_ubuntu_"));

    let Ok(CommitOutcome::Committed(record)) = &report.commit else {
        panic!("expected a commit, got {:?}", report.commit);
    };
    assert!(matches!(
        record.immediate_push,
        Some(Ok(PushReport::Pushed { count: 1, .. }))
    ));
    assert_eq!(git.pushes().len(), 1);
}

#[tokio::test]
async fn matching_artifact_is_reused() {
    let ws = Workspace::new();
    let stored = ws.write_artifact("install_package_all_20240101_000000.yml", MYSQL_PLAYBOOK);
    let git = FakeGit::new();
    let validator = FakeValidator::passing();
    let (pipeline, _) = ws.pipeline(&git, validator.clone(), None).await;

    let report = pipeline
        .process("Install mysql", PipelineOptions::default())
        .await
        .unwrap();

    assert!(report.is_reused());
    assert_eq!(report.path(), stored.as_path());
    let PipelineReport::Reused(reused) = report else {
        unreachable!()
    };
    assert!((reused.artifact.score - 1.0).abs() < f64::EPSILON);
    assert!(reused.validation.valid);
    assert_eq!(validator.checked(), vec![stored]);
    assert!(git.commit_messages().is_empty());
}

#[tokio::test]
async fn low_score_is_informational_only() {
    let ws = Workspace::new();
    ws.write_artifact("install_package_all_20240101_000000.yml", REDIS_PLAYBOOK);
    let git = FakeGit::new();
    let (pipeline, _) = ws.pipeline(&git, FakeValidator::passing(), None).await;

    let report = generated(
        pipeline
            .process("Install mysql", PipelineOptions::default())
            .await
            .unwrap(),
    );

    assert_eq!(report.best_score, Some(0.0));
    assert_eq!(git.commit_messages().len(), 1);
}

#[tokio::test]
async fn skip_check_always_generates() {
    let ws = Workspace::new();
    ws.write_artifact("install_package_all_20240101_000000.yml", MYSQL_PLAYBOOK);
    let git = FakeGit::new();
    let (pipeline, _) = ws.pipeline(&git, FakeValidator::passing(), None).await;

    let report = generated(
        pipeline
            .process("Install mysql", PipelineOptions::default().skip_check(true))
            .await
            .unwrap(),
    );

    assert_eq!(report.best_score, None);
    assert_eq!(report.source, BodySource::Template);
}

#[tokio::test]
async fn stale_artifact_is_regenerated() {
    let ws = Workspace::new();
    ws.write_artifact(
        "install_package_all_20240101_000000.yml",
        "---\n- hosts: all\n  tasks:\n    - name: mysql\n",
    );
    let git = FakeGit::new();
    let (pipeline, _) = ws.pipeline(&git, FakeValidator::passing(), None).await;

    let report = generated(
        pipeline
            .process("Install mysql", PipelineOptions::default())
            .await
            .unwrap(),
    );

    assert_eq!(report.best_score, Some(1.0));
    assert_eq!(report.source, BodySource::Template);
}

#[tokio::test]
async fn unknown_request_uses_stand_in_when_backend_offline() {
    let ws = Workspace::new();
    let git = FakeGit::new();
    let backend = FakeBackend::offline();
    let (pipeline, _) = ws
        .pipeline(&git, FakeValidator::passing(), Some(backend.clone()))
        .await;

    let report = generated(
        pipeline
            .process("tune haproxy for more connections", PipelineOptions::default())
            .await
            .unwrap(),
    );

    assert_eq!(report.resolution.kind(), IntentKind::Unknown);
    assert_eq!(report.source, BodySource::StandIn);
    assert_eq!(backend.probes(), 1);
    assert!(backend.prompts().is_empty());
    assert!(report
        .path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("unknown_all_"));
}

#[tokio::test]
async fn unknown_request_uses_reachable_backend() {
    let ws = Workspace::new();
    let git = FakeGit::new();
    let backend = FakeBackend::answering(
        "Here you go:\n```yaml\n- name: Tune haproxy\n  hosts: all\n  become: true\n  tasks:\n    - name: Raise maxconn\n      lineinfile:\n        path: /etc/haproxy/haproxy.cfg\n        line: maxconn 4096\n```\n",
    );
    let (pipeline, _) = ws
        .pipeline(&git, FakeValidator::passing(), Some(backend.clone()))
        .await;

    let report = generated(
        pipeline
            .process("tune haproxy for more connections", PipelineOptions::default())
            .await
            .unwrap(),
    );

    assert_eq!(report.source, BodySource::Backend);
    assert!(backend.prompts()[0].contains("tune haproxy for more connections"));
    let body = std::fs::read_to_string(&report.path).unwrap();
    assert!(body.starts_with("---\n"));
    assert!(!body.contains("```"));
}

#[tokio::test]
async fn failing_backend_falls_back_to_stand_in() {
    let ws = Workspace::new();
    let git = FakeGit::new();
    let (pipeline, _) = ws
        .pipeline(&git, FakeValidator::passing(), Some(FakeBackend::failing_with(503)))
        .await;

    let report = generated(
        pipeline
            .process("tune haproxy", PipelineOptions::default())
            .await
            .unwrap(),
    );
    assert_eq!(report.source, BodySource::StandIn);
}

#[tokio::test]
async fn hybrid_mode_off_rejects_unknown_requests() {
    let mut ws = Workspace::new();
    ws.config.hybrid_mode.enabled = false;
    let git = FakeGit::new();
    let (pipeline, _) = ws
        .pipeline(&git, FakeValidator::passing(), Some(FakeBackend::offline()))
        .await;

    let err = pipeline
        .process("tune haproxy", PipelineOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::NoGenerationRoute));
}

#[tokio::test]
async fn validation_failure_halts_before_commit() {
    let ws = Workspace::new();
    let git = FakeGit::new();
    let (pipeline, _) = ws
        .pipeline(&git, FakeValidator::failing("ERROR! no action detected in task"), None)
        .await;

    let err = pipeline
        .process("Create user deploy", PipelineOptions::default())
        .await
        .unwrap_err();

    assert!(err.is_validation_failure());
    let PipelineError::ValidationFailed { path, report } = err else {
        unreachable!()
    };
    assert!(path.exists());
    assert_eq!(
        report.diagnostic.as_deref(),
        Some("ERROR! no action detected in task")
    );
    assert_eq!(git.count_matching(&["add"]), 0);
}

#[tokio::test]
async fn commit_failure_is_reported_not_raised() {
    let ws = Workspace::new();
    let git = FakeGit::new();
    git.respond(&["commit"], GitOutput::failed("nothing added to commit"));
    let (pipeline, _) = ws.pipeline(&git, FakeValidator::passing(), None).await;

    let report = generated(
        pipeline
            .process("Restart nginx", PipelineOptions::default())
            .await
            .unwrap(),
    );

    assert!(matches!(report.commit, Err(SyncError::CommandFailed { .. })));
    assert!(report.path.exists());
    assert!(!pipeline.sync().has_pending().await);
}

#[tokio::test]
async fn repeated_requests_never_overwrite() {
    let ws = Workspace::new();
    let git = FakeGit::new();
    let (pipeline, _) = ws.pipeline(&git, FakeValidator::passing(), None).await;

    let options = PipelineOptions::default().skip_check(true);
    let first = pipeline.process("Install nginx", options.clone()).await.unwrap();
    let second = pipeline.process("Install nginx", options).await.unwrap();

    assert_ne!(first.path(), second.path());
    assert_eq!(pipeline.sync().pending().await.len(), 2);
}

#[tokio::test]
async fn find_matches_ranks_candidates() {
    let ws = Workspace::new();
    ws.write_artifact("install_package_all_20240101_000000.yml", REDIS_PLAYBOOK);
    ws.write_artifact("install_package_all_20240102_000000.yml", MYSQL_PLAYBOOK);
    ws.write_artifact("create_user_all_20240101_000000.yml", MYSQL_PLAYBOOK);
    let git = FakeGit::new();
    let (pipeline, _) = ws.pipeline(&git, FakeValidator::passing(), None).await;

    let report = pipeline.find_matches("Install mysql").await.unwrap();

    let names: Vec<&str> = report
        .candidates
        .iter()
        .map(|c| c.file_name.as_str())
        .collect();
    assert_eq!(
        names,
        vec![
            "install_package_all_20240102_000000.yml",
            "install_package_all_20240101_000000.yml"
        ]
    );
    assert_eq!(
        report.reusable().map(|c| c.file_name.as_str()),
        Some("install_package_all_20240102_000000.yml")
    );
}
