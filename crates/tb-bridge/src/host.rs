//! Host-side inference contract.

use async_trait::async_trait;

use crate::error::InferenceError;

/// Asynchronous inference engine reached across the host boundary.
///
/// Takes a fully rendered prompt and resolves to the generated text.
#[async_trait]
pub trait HostInference: Send + Sync {
    async fn infer(&self, prompt: &str) -> Result<String, InferenceError>;

    /// Name used in logs.
    fn host_name(&self) -> &str;
}
