//! Fallback generation backend
//!
//! The backend is a seam: anything that can be probed for reachability and
//! asked for a text completion. [`OllamaBackend`] talks to a local Ollama
//! server over HTTP:
//!
//! - probe: plain `GET` on the base address, short timeout, any failure
//!   means unavailable
//! - completion: `POST {model, prompt, stream: false, options}` returning
//!   `{response}`

use crate::error::GenerateError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Something that can produce playbook text from a prompt
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Whether the backend is reachable right now
    ///
    /// Advisory only: a failed probe is never an error.
    async fn probe(&self) -> bool;

    /// Complete `prompt`
    async fn complete(&self, prompt: &str) -> Result<String, GenerateError>;
}

/// Sampling parameters sent with every completion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingOptions {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    /// Maximum tokens to generate
    pub num_predict: u32,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            top_p: 0.9,
            top_k: 40,
            num_predict: 1500,
        }
    }
}

/// `ollama` configuration section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaSettings {
    /// Base address, probed for reachability
    pub base_url: String,
    /// Completion endpoint
    pub url: String,
    pub model: String,
    pub probe_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub options: SamplingOptions,
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            url: "http://localhost:11434/api/generate".to_string(),
            model: "codellama:7b".to_string(),
            probe_timeout_secs: 2,
            request_timeout_secs: 60,
            options: SamplingOptions::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: SamplingOptions,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    response: String,
}

/// Longest slice of an error body carried into [`GenerateError::BackendStatus`]
const ERROR_BODY_LIMIT: usize = 200;

/// HTTP client for a local Ollama server
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    client: reqwest::Client,
    settings: OllamaSettings,
}

impl OllamaBackend {
    /// Create backend from settings
    ///
    /// # Errors
    /// Returns `GenerateError::Http` if the HTTP client cannot be built
    pub fn new(settings: OllamaSettings) -> Result<Self, GenerateError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client, settings })
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &OllamaSettings {
        &self.settings
    }
}

#[async_trait::async_trait]
impl GenerationBackend for OllamaBackend {
    async fn probe(&self) -> bool {
        let result = self
            .client
            .get(&self.settings.base_url)
            .timeout(Duration::from_secs(self.settings.probe_timeout_secs))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(url = %self.settings.base_url, model = %self.settings.model, "generation backend reachable");
                true
            }
            Ok(response) => {
                tracing::debug!(status = %response.status(), "generation backend probe rejected");
                false
            }
            Err(e) => {
                tracing::debug!(error = %e, "generation backend unreachable");
                false
            }
        }
    }

    async fn complete(&self, prompt: &str) -> Result<String, GenerateError> {
        let request = CompletionRequest {
            model: &self.settings.model,
            prompt,
            stream: false,
            options: self.settings.options,
        };

        tracing::info!(model = %self.settings.model, "requesting completion");
        let response = self
            .client
            .post(&self.settings.url)
            .timeout(Duration::from_secs(self.settings.request_timeout_secs))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerateError::BackendStatus {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        let completion: CompletionResponse = response.json().await?;
        let text = completion.response.trim();
        if text.is_empty() {
            return Err(GenerateError::EmptyCompletion);
        }
        Ok(text.to_string())
    }
}

/// Prompt sent to the backend for a free-form request
#[must_use]
pub fn build_prompt(request: &str) -> String {
    format!(
        "You are an expert Ansible playbook generator. Generate valid, production-ready \
Ansible playbooks in YAML format.

Task: {request}

Generate an Ansible playbook with these requirements:
- Use 'hosts: all'
- Include 'become: yes' if root access is needed
- Support the Debian, RedHat and Fedora OS families
- Guard OS-specific tasks with 'when: ansible_os_family == \"<family>\"'
- Include verification tasks that confirm success
- Give every task a descriptive name
- Keep the playbook idempotent
- End with a success message that uses the ansible_distribution variable

Output ONLY the YAML playbook starting with '---', no explanations or markdown:

---
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings() {
        let settings = OllamaSettings::default();
        assert_eq!(settings.model, "codellama:7b");
        assert_eq!(settings.probe_timeout_secs, 2);
        assert_eq!(settings.request_timeout_secs, 60);
        assert_eq!(settings.options.top_k, 40);
        assert_eq!(settings.options.num_predict, 1500);
    }

    #[test]
    fn partial_settings_fill_defaults() {
        let settings: OllamaSettings = serde_yaml::from_str("model: llama3\n").unwrap();
        assert_eq!(settings.model, "llama3");
        assert_eq!(settings.url, "http://localhost:11434/api/generate");
    }

    #[test]
    fn request_wire_shape() {
        let request = CompletionRequest {
            model: "m",
            prompt: "p",
            stream: false,
            options: SamplingOptions::default(),
        };
        let value = serde_yaml::to_value(&request).unwrap();
        assert_eq!(value["stream"], serde_yaml::Value::Bool(false));
        assert_eq!(value["options"]["top_k"], serde_yaml::Value::from(40));
    }

    #[test]
    fn prompt_embeds_request() {
        let prompt = build_prompt("harden sshd");
        assert!(prompt.contains("Task: harden sshd"));
        assert!(prompt.trim_end().ends_with("---"));
    }

    #[tokio::test]
    async fn unreachable_backend_probes_false() {
        let backend = OllamaBackend::new(OllamaSettings {
            base_url: "http://127.0.0.1:9".to_string(),
            probe_timeout_secs: 1,
            ..OllamaSettings::default()
        })
        .unwrap();
        assert!(!backend.probe().await);
    }
}
