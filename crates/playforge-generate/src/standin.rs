//! Stand-in playbook used when no generation backend is reachable
//!
//! Clearly labelled, but shaped like a real playbook (host target, privilege
//! escalation, named tasks) so it validates and persists like any other.

use playforge_artifact::{Play, Playbook, Task};
use playforge_intent::ParameterSet;

const NOTICE: &str = "Stand-in playbook: no generation backend was reachable";

/// Keyword groups and the placeholder task each one adds
const KEYWORD_TASKS: [(&[&str], &str, &str); 3] = [
    (
        &["install"],
        "Stand-in: would install the requested package",
        "With a generation backend this task would install the package",
    ),
    (
        &["firewall", "port"],
        "Stand-in: would configure the firewall",
        "With a generation backend this task would configure firewall rules",
    ),
    (
        &["disable", "stop"],
        "Stand-in: would stop or disable the service",
        "With a generation backend this task would stop or disable the service",
    ),
];

/// Build the stand-in for `request`
#[must_use]
pub fn stand_in_playbook(request: &str, params: &ParameterSet) -> Playbook {
    let lowered = request.to_lowercase();

    let mut play = Play::new(params.target_hosts())
        .with_name(format!("Stand-in playbook: {request}"))
        .privileged(true)
        .gather_facts(true)
        .with_task(Task::debug(format!("Task: {request}"), NOTICE));

    for (keywords, name, msg) in KEYWORD_TASKS {
        if keywords.iter().any(|keyword| lowered.contains(keyword)) {
            play = play.with_task(Task::debug(name, msg));
        }
    }

    play = play.with_task(Task::debug(
        "Success message",
        "Stand-in task completed on {{ ansible_distribution }}",
    ));

    Playbook::new(vec![play])
}
