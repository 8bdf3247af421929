//! Externally-hosted model over an OpenAI-compatible chat completions API.
//!
//! Configuration (environment):
//! - `TABULA_API_URL`: chat completions endpoint (required)
//! - `TABULA_API_KEY`: bearer credential, with or without the `Bearer ` prefix (required)
//! - `TABULA_MODEL`: model identifier
//! - `TABULA_TEMPERATURE`: sampling temperature
//! - `TABULA_TIMEOUT_SECS`: request timeout (default: 120)

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tb_core::{BridgeConfig, ChatMessage, ConfigError};
use tracing::{debug, info};

use crate::error::InferenceError;
use crate::host::HostInference;

const BEARER_PREFIX: &str = "Bearer ";

/// Prefix a credential with `"Bearer "` unless it already has it.
pub fn normalize_bearer(credential: &str) -> String {
    let credential = credential.trim();
    if credential.starts_with(BEARER_PREFIX) {
        credential.to_string()
    } else {
        format!("{}{}", BEARER_PREFIX, credential)
    }
}

/// Settings for the externally-hosted variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostedConfig {
    /// Chat completions URL
    pub endpoint: String,
    /// Bearer credential as supplied
    pub bearer: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Model identifier and temperature
    #[serde(flatten)]
    pub model: BridgeConfig,
}

fn default_timeout_secs() -> u64 {
    120
}

impl HostedConfig {
    /// Config with the default request timeout.
    pub fn new(endpoint: impl Into<String>, bearer: impl Into<String>, model: BridgeConfig) -> Self {
        Self {
            endpoint: endpoint.into(),
            bearer: bearer.into(),
            timeout_secs: default_timeout_secs(),
            model,
        }
    }

    /// Read from `TABULA_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read settings through `lookup`; missing optional values use defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = lookup("TABULA_API_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("TABULA_API_URL"))?;
        let bearer = lookup("TABULA_API_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("TABULA_API_KEY"))?;

        let mut model = BridgeConfig::default();
        if let Some(name) = lookup("TABULA_MODEL") {
            model.model = name;
        }
        if let Some(raw) = lookup("TABULA_TEMPERATURE") {
            model.temperature = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "TABULA_TEMPERATURE",
                value: raw.clone(),
            })?;
        }
        model.validate()?;

        let timeout_secs = match lookup("TABULA_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "TABULA_TIMEOUT_SECS",
                value: raw.clone(),
            })?,
            None => default_timeout_secs(),
        };

        Ok(Self {
            endpoint,
            bearer,
            timeout_secs,
            model,
        })
    }

    /// Value for the `Authorization` header.
    pub fn authorization(&self) -> String {
        normalize_bearer(&self.bearer)
    }

    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Chat completions client.
#[derive(Debug, Clone)]
pub struct HttpInference {
    client: Client,
    config: HostedConfig,
}

impl HttpInference {
    /// Build a client for `config`.
    pub fn new(config: HostedConfig) -> Result<Self, InferenceError> {
        config.model.validate()?;
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| InferenceError::Network(e.to_string()))?;

        info!(
            endpoint = %config.endpoint,
            model = %config.model.model,
            "hosted inference client configured"
        );
        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self, InferenceError> {
        Self::new(HostedConfig::from_env()?)
    }

    /// Settings this client was built with.
    pub fn config(&self) -> &HostedConfig {
        &self.config
    }
}

#[async_trait]
impl HostInference for HttpInference {
    async fn infer(&self, prompt: &str) -> Result<String, InferenceError> {
        let body = ChatCompletionRequest {
            model: &self.config.model.model,
            messages: vec![ChatMessage::user(prompt)],
            temperature: self.config.model.temperature,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("Authorization", self.config.authorization())
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    InferenceError::Timeout(self.config.timeout())
                } else {
                    InferenceError::Network(err.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Transport {
                status: status.as_u16(),
                body,
            });
        }

        let data: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::Parse(e.to_string()))?;

        let choice = data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| InferenceError::Parse("No choices returned in response".to_string()))?;

        debug!(chars = choice.message.content.len(), "hosted inference completed");
        Ok(choice.message.content)
    }

    fn host_name(&self) -> &str {
        "hosted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const COMPLETIONS_PATH: &str = "/v1/chat/completions";

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn hosted(server: &MockServer, bearer: &str, model: BridgeConfig) -> HttpInference {
        let endpoint = format!("{}{}", server.uri(), COMPLETIONS_PATH);
        HttpInference::new(HostedConfig::new(endpoint, bearer, model)).unwrap()
    }

    #[test]
    fn test_normalize_bearer() {
        assert_eq!(normalize_bearer("sk-123"), "Bearer sk-123");
        assert_eq!(normalize_bearer("Bearer sk-123"), "Bearer sk-123");
        assert_eq!(normalize_bearer("  sk-123 "), "Bearer sk-123");
        assert_eq!(normalize_bearer(&normalize_bearer("abc")), "Bearer abc");
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = HostedConfig::from_lookup(lookup_from(&[
            ("TABULA_API_URL", "https://models.example/v1/chat/completions"),
            ("TABULA_API_KEY", "secret"),
        ]))
        .unwrap();
        assert_eq!(config.authorization(), "Bearer secret");
        assert_eq!(config.model, BridgeConfig::default());
        assert_eq!(config.timeout(), Duration::from_secs(120));
    }

    #[test]
    fn test_from_lookup_errors() {
        let missing = HostedConfig::from_lookup(lookup_from(&[("TABULA_API_KEY", "k")]));
        assert_eq!(missing, Err(ConfigError::Missing("TABULA_API_URL")));

        let bad = HostedConfig::from_lookup(lookup_from(&[
            ("TABULA_API_URL", "u"),
            ("TABULA_API_KEY", "k"),
            ("TABULA_TEMPERATURE", "warm"),
        ]));
        assert!(matches!(bad, Err(ConfigError::Invalid { name: "TABULA_TEMPERATURE", .. })));
    }

    #[test]
    fn test_config_json_flattens_model() {
        let config: HostedConfig = serde_json::from_str(
            r#"{"endpoint": "u", "bearer": "k", "model": "m", "temperature": 0.5}"#,
        )
        .unwrap();
        assert_eq!(config.model.model, "m");
        assert_eq!(config.timeout_secs, 120);
    }

    #[tokio::test]
    async fn test_infer_success_sends_normalized_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(COMPLETIONS_PATH))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "tiny",
                "messages": [{"role": "user", "content": "compute"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "result = 42"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let host = hosted(&server, "sk-test", BridgeConfig::new("tiny", 0.2).unwrap());
        assert_eq!(host.infer("compute").await.unwrap(), "result = 42");
    }

    #[tokio::test]
    async fn test_prefixed_credential_not_doubled() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "ok"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let host = hosted(&server, "Bearer sk-test", BridgeConfig::default());
        assert_eq!(host.infer("q").await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_infer_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(COMPLETIONS_PATH))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({"error": "busy"})))
            .mount(&server)
            .await;

        let host = hosted(&server, "k", BridgeConfig::default());
        let err = host.infer("q").await.unwrap_err();
        assert!(matches!(err, InferenceError::Transport { status: 503, ref body } if body.contains("busy")));
    }

    #[tokio::test]
    async fn test_infer_without_choices() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(COMPLETIONS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let host = hosted(&server, "k", BridgeConfig::default());
        assert!(matches!(host.infer("q").await, Err(InferenceError::Parse(_))));
    }

    #[tokio::test]
    async fn test_infer_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("not json", "application/json"))
            .mount(&server)
            .await;

        let host = hosted(&server, "k", BridgeConfig::default());
        assert!(matches!(host.infer("q").await, Err(InferenceError::Parse(_))));
    }

    #[tokio::test]
    async fn test_slow_endpoint_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let mut config = HostedConfig::new(
            format!("{}{}", server.uri(), COMPLETIONS_PATH),
            "k",
            BridgeConfig::default(),
        );
        config.timeout_secs = 1;
        let host = HttpInference::new(config).unwrap();

        let err = host.infer("q").await.unwrap_err();
        assert!(matches!(err, InferenceError::Timeout(limit) if limit == Duration::from_secs(1)));
    }
}
