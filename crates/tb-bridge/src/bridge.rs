//! The synchronous model facade handed to the reasoning library.

use std::sync::Arc;

use tb_core::{BridgeConfig, ConversationMemory, InferenceRequest, Instruction};
use tracing::debug;

use crate::error::InferenceError;
use crate::host::HostInference;
use crate::strategy::BlockingStrategy;

/// Model interface the reasoning library calls.
///
/// Calls block until the model answers.
pub trait LanguageModel {
    /// Run a prepared request.
    fn complete(&self, request: &InferenceRequest) -> Result<String, InferenceError>;

    /// Model type reported to the library.
    fn model_type(&self) -> &str;

    /// Render `instruction` with optional `memory` and run it.
    fn call(
        &self,
        instruction: &dyn Instruction,
        memory: Option<&dyn ConversationMemory>,
    ) -> Result<String, InferenceError> {
        self.complete(&InferenceRequest::from_parts(instruction, memory))
    }
}

/// Blocking bridge to an asynchronous host.
///
/// Holds no state between calls beyond its configuration.
#[derive(Clone)]
pub struct InferenceBridge {
    host: Arc<dyn HostInference>,
    config: BridgeConfig,
    model_type: String,
}

impl std::fmt::Debug for InferenceBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceBridge")
            .field("host", &self.host.host_name())
            .field("config", &self.config)
            .field("model_type", &self.model_type)
            .finish()
    }
}

impl InferenceBridge {
    /// Bridge reporting model type `"webllm"`.
    pub fn new(host: Arc<dyn HostInference>, config: BridgeConfig) -> Self {
        Self::with_model_type(host, config, "webllm")
    }

    /// Bridge reporting a custom model type.
    pub fn with_model_type(
        host: Arc<dyn HostInference>,
        config: BridgeConfig,
        model_type: impl Into<String>,
    ) -> Self {
        debug_assert!(config.validate().is_ok(), "Bridge config must be valid");
        Self {
            host,
            config,
            model_type: model_type.into(),
        }
    }

    /// Model settings this bridge was built with.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Async counterpart of [`LanguageModel::complete`] for callers that
    /// can await directly.
    pub async fn complete_async(&self, request: &InferenceRequest) -> Result<String, InferenceError> {
        let prompt = request.render_prompt();
        let text = self.host.infer(&prompt).await?;
        non_empty(text)
    }
}

impl LanguageModel for InferenceBridge {
    fn complete(&self, request: &InferenceRequest) -> Result<String, InferenceError> {
        let prompt = request.render_prompt();
        let strategy = BlockingStrategy::detect();
        debug!(
            model = %self.config.model,
            host = self.host.host_name(),
            strategy = strategy.name(),
            history = request.history().len(),
            prompt_chars = prompt.len(),
            "dispatching inference"
        );

        let host = Arc::clone(&self.host);
        let text = strategy.block_on(async move { host.infer(&prompt).await })?;
        non_empty(text)
    }

    fn model_type(&self) -> &str {
        &self.model_type
    }
}

fn non_empty(text: String) -> Result<String, InferenceError> {
    if text.trim().is_empty() {
        Err(InferenceError::EmptyResponse)
    } else {
        Ok(text)
    }
}
