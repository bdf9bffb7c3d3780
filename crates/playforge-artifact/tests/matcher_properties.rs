//! Matcher behavior against on-disk stores

use playforge_artifact::{score_document, ArtifactStore, ReusePolicy};
use playforge_intent::{IntentKind, ParameterSet};
use proptest::prelude::*;
use serde_yaml::Value;
use tempfile::TempDir;

const MYSQL_PLAYBOOK: &str = r#"---
- name: Install mysql
  hosts: all
  become: true
  tasks:
    - name: Install package
      apt:
        name: "mysql"
        state: present
"#;

async fn mysql_store() -> (TempDir, ArtifactStore) {
    let dir = TempDir::new().unwrap();
    tokio::fs::write(
        dir.path().join("install_package_all_20240101_000000.yml"),
        MYSQL_PLAYBOOK,
    )
    .await
    .unwrap();
    let store = ArtifactStore::new(dir.path());
    (dir, store)
}

#[tokio::test]
async fn existing_mysql_artifact_scores_one_for_mysql() {
    let (_dir, store) = mysql_store().await;
    let params = ParameterSet::default().with("package_name", "mysql");

    let candidates = store
        .find_candidates(IntentKind::InstallPackage, &params)
        .await
        .unwrap();

    assert_eq!(candidates.len(), 1);
    assert!((candidates[0].score - 1.0).abs() < f64::EPSILON);
    assert!(ReusePolicy::default().select(&candidates).is_some());
}

#[tokio::test]
async fn existing_mysql_artifact_scores_zero_for_redis() {
    let (_dir, store) = mysql_store().await;
    let params = ParameterSet::default().with("package_name", "redis");

    let candidates = store
        .find_candidates(IntentKind::InstallPackage, &params)
        .await
        .unwrap();

    assert_eq!(candidates.len(), 1);
    assert!(candidates[0].score.abs() < f64::EPSILON);
    assert!(ReusePolicy::default().select(&candidates).is_none());
}

#[tokio::test]
async fn other_intents_do_not_see_the_artifact() {
    let (_dir, store) = mysql_store().await;
    let params = ParameterSet::default().with("username", "mysql");

    let candidates = store
        .find_candidates(IntentKind::CreateUser, &params)
        .await
        .unwrap();
    assert!(candidates.is_empty());
}

#[test]
fn boundary_score_does_not_reuse() {
    let policy = ReusePolicy::default();
    assert!(!policy.should_reuse(0.79));
    assert!(!policy.should_reuse(0.799_999));
    assert!(policy.should_reuse(0.8));
    // four of five parameters present
    assert!(policy.should_reuse(4.0 / 5.0));
}

fn document() -> Value {
    serde_yaml::from_str(MYSQL_PLAYBOOK).unwrap()
}

proptest! {
    #[test]
    fn scoring_is_idempotent(values in prop::collection::vec("[a-z]{1,8}", 0..6)) {
        let params = values
            .iter()
            .enumerate()
            .fold(ParameterSet::default(), |p, (i, v)| p.with(format!("p{i}"), v.clone()));
        let doc = document();

        let first = score_document(&doc, &params);
        let second = score_document(&doc, &params);
        prop_assert_eq!(first.to_bits(), second.to_bits());
        prop_assert!((0.0..=1.0).contains(&first));
    }

    #[test]
    fn present_value_never_lowers_score(values in prop::collection::vec("[a-z]{1,8}", 1..6)) {
        let params = values
            .iter()
            .enumerate()
            .fold(ParameterSet::default(), |p, (i, v)| p.with(format!("p{i}"), v.clone()));
        let doc = document();

        let before = score_document(&doc, &params);
        let after = score_document(&doc, &params.clone().with("extra", "mysql"));
        prop_assert!(after >= before);
    }

    #[test]
    fn absent_value_never_raises_score(values in prop::collection::vec("[a-z]{1,8}", 1..6)) {
        let params = values
            .iter()
            .enumerate()
            .fold(ParameterSet::default(), |p, (i, v)| p.with(format!("p{i}"), v.clone()));
        let doc = document();

        let before = score_document(&doc, &params);
        let after = score_document(&doc, &params.clone().with("extra", "zzqx9-not-present"));
        prop_assert!(after <= before);
    }
}
