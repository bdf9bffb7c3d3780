//! The sample configuration shipped in the workspace

use playforge_core::AgentConfig;
use std::path::PathBuf;

#[tokio::test]
async fn sample_config_matches_defaults() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../config/config.yml");
    let config = AgentConfig::load(&path).await.unwrap();
    assert_eq!(config, AgentConfig::default());
}
