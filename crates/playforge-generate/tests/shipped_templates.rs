//! The templates shipped in the workspace render into schema-valid playbooks

use playforge_generate::{BodySource, RepairOutcome, StrategySelector, TemplateSource};
use playforge_intent::{GenerationRoute, IntentKind, IntentResolver};
use std::path::PathBuf;

fn shipped() -> TemplateSource {
    TemplateSource::new(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../templates"))
}

#[tokio::test]
async fn every_templated_intent_has_a_valid_template() {
    let selector = StrategySelector::new(shipped());
    let requests = [
        "Install nginx on Ubuntu",
        "Open port 8443 on RHEL",
        "Create user deploy",
        "Deploy redis container",
        "Restart sshd",
        "Update config /etc/ssh/sshd_config",
    ];

    for (request, expected) in requests.iter().zip(IntentKind::TEMPLATED) {
        let resolution = IntentResolver::new().resolve(request);
        assert_eq!(resolution.kind(), expected, "{request}");

        let artifact = selector
            .generate(resolution.route, resolution.kind(), request, &resolution.parameters())
            .await
            .unwrap();

        assert_eq!(artifact.source, BodySource::Template);
        assert_eq!(artifact.repair, RepairOutcome::WellFormed, "{request}");
        let playbook = artifact
            .playbook()
            .unwrap_or_else(|| panic!("{request}: {:?}", artifact.schema));
        assert_eq!(playbook.plays()[0].hosts, "all");
        assert!(playbook.requires_privilege());
    }
}

#[tokio::test]
async fn install_nginx_references_package() {
    let selector = StrategySelector::new(shipped());
    let resolution = IntentResolver::new().resolve("Install nginx on Ubuntu");

    let artifact = selector
        .generate(GenerationRoute::Template, resolution.kind(), "Install nginx on Ubuntu", &resolution.parameters())
        .await
        .unwrap();

    assert!(artifact.body.starts_with("---"));
    let playbook = artifact.playbook().unwrap();
    let mentions_nginx = playbook.tasks().any(|task| {
        task.action
            .args
            .get("name")
            .and_then(serde_yaml::Value::as_str)
            == Some("nginx")
    });
    assert!(mentions_nginx);
}

#[tokio::test]
async fn unresolved_placeholders_stay_verbatim() {
    let selector = StrategySelector::new(shipped());
    let resolution = IntentResolver::new().resolve("bounce cron service");
    let mut params = resolution.parameters();
    params.enrich("unused", "x");

    let artifact = selector
        .generate(resolution.route, resolution.kind(), "bounce cron service", &params)
        .await
        .unwrap();
    assert!(artifact.body.contains("cron"));

    // update_config leaves search_pattern empty but the template still parses
    let resolution = IntentResolver::new().resolve("modify nginx config");
    let artifact = selector
        .generate(resolution.route, resolution.kind(), "modify nginx config", &resolution.parameters())
        .await
        .unwrap();
    assert!(artifact.playbook().is_some());
}
