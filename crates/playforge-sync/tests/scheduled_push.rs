//! Scheduled push mode on a paused clock

use playforge_sync::{PushMode, PushReport, SyncConfig};
use playforge_test_utils::{remote_config, FakeGit, Workspace};
use std::time::Duration;
use tokio::time::sleep;

fn scheduled(interval: u64) -> SyncConfig {
    SyncConfig {
        push_interval: interval,
        ..remote_config(PushMode::Scheduled)
    }
}

#[tokio::test(start_paused = true)]
async fn timer_pushes_pending_commits() {
    let ws = Workspace::new().with_git(scheduled(60));
    let git = FakeGit::new();
    let (manager, scheduler) = ws.sync(&git).await;
    let scheduler = scheduler.expect("scheduled mode starts a scheduler");
    assert_eq!(scheduler.period(), Duration::from_secs(60));
    assert!(scheduler.is_running());

    let path = ws.write_artifact("install_package_all_20240101_000000.yml", "---\n");
    manager.commit(&path, None).await.unwrap();
    assert!(git.pushes().is_empty());

    sleep(Duration::from_secs(61)).await;

    assert_eq!(git.pushes().len(), 1);
    assert!(manager.pending().await.is_empty());
    assert!(manager.last_push().await.is_some());

    scheduler.cancel().await;
}

#[tokio::test(start_paused = true)]
async fn idle_ticks_do_not_push() {
    let ws = Workspace::new().with_git(scheduled(60));
    let git = FakeGit::new();
    let (_manager, scheduler) = ws.sync(&git).await;

    sleep(Duration::from_secs(60 * 5 + 1)).await;

    assert!(git.pushes().is_empty());
    scheduler.unwrap().cancel().await;
}

#[tokio::test(start_paused = true)]
async fn failed_tick_is_retried_on_next_tick() {
    let ws = Workspace::new().with_git(scheduled(60));
    let git = FakeGit::new();
    let (manager, scheduler) = ws.sync(&git).await;

    let path = ws.write_artifact("install_package_all_20240101_000000.yml", "---\n");
    manager.commit(&path, None).await.unwrap();
    git.time_out_once(&["push"]);

    sleep(Duration::from_secs(61)).await;
    assert_eq!(git.pushes().len(), 1);
    assert_eq!(manager.pending().await.len(), 1);

    sleep(Duration::from_secs(60)).await;
    assert_eq!(git.pushes().len(), 2);
    assert!(manager.pending().await.is_empty());

    scheduler.unwrap().cancel().await;
}

#[tokio::test(start_paused = true)]
async fn manual_tick_pushes_on_demand() {
    let ws = Workspace::new().with_git(scheduled(3600));
    let git = FakeGit::new();
    let (manager, scheduler) = ws.sync(&git).await;
    let scheduler = scheduler.unwrap();

    assert!(scheduler.tick().await.is_none());

    let path = ws.write_artifact("install_package_all_20240101_000000.yml", "---\n");
    manager.commit(&path, None).await.unwrap();

    let result = scheduler.tick().await.unwrap();
    assert!(matches!(result, Ok(PushReport::Pushed { count: 1, .. })));
    assert!(scheduler.tick().await.is_none());
    assert_eq!(git.pushes().len(), 1);

    scheduler.cancel().await;
}

#[tokio::test(start_paused = true)]
async fn cancelled_scheduler_stops_pushing() {
    let ws = Workspace::new().with_git(scheduled(60));
    let git = FakeGit::new();
    let (manager, scheduler) = ws.sync(&git).await;
    scheduler.unwrap().cancel().await;

    let path = ws.write_artifact("install_package_all_20240101_000000.yml", "---\n");
    manager.commit(&path, None).await.unwrap();
    sleep(Duration::from_secs(180)).await;

    assert!(git.pushes().is_empty());
    assert!(manager.has_pending().await);
}

#[tokio::test]
async fn other_modes_have_no_scheduler() {
    for mode in [PushMode::Manual, PushMode::Immediate] {
        let ws = Workspace::new().with_git(remote_config(mode));
        let (_, scheduler) = ws.sync(&FakeGit::new()).await;
        assert!(scheduler.is_none(), "{mode}");
    }

    let ws = Workspace::new().with_git(SyncConfig {
        remote_url: String::new(),
        ..scheduled(60)
    });
    let (_, scheduler) = ws.sync(&FakeGit::new()).await;
    assert!(scheduler.is_none());
}
