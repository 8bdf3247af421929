//! In-process host boundary.
//!
//! The guest side ([`HostChannel`]) posts each prompt as a [`HostRequest`]
//! and waits on a one-shot reply. The host side ([`HostEndpoint`]) receives
//! requests and answers or rejects them. This mirrors a worker that posts a
//! message to the page hosting the model and awaits the response.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::error::InferenceError;
use crate::host::HostInference;

/// Maximum queued requests.
const QUEUE_DEPTH_MAX: usize = 1024;

/// Default per-request deadline, matching the hosted client's.
const TIMEOUT_MS_DEFAULT: u64 = 120_000;

/// Host boundary settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostChannelConfig {
    /// Requests that may wait for the host before senders block
    pub queue_depth: usize,
    /// Per-request deadline in milliseconds, covering queueing and reply.
    /// `None` waits indefinitely.
    pub timeout_ms: Option<u64>,
}

impl Default for HostChannelConfig {
    fn default() -> Self {
        Self {
            queue_depth: 16,
            timeout_ms: Some(TIMEOUT_MS_DEFAULT),
        }
    }
}

impl HostChannelConfig {
    /// Config with a request deadline.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout_ms: Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)),
            ..Default::default()
        }
    }

    /// Config that waits for the host indefinitely.
    ///
    /// Only safe when the host is served off the caller's thread.
    #[must_use]
    pub fn without_timeout() -> Self {
        Self {
            timeout_ms: None,
            ..Default::default()
        }
    }

    /// Request deadline, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// A prompt waiting for the host's answer.
#[derive(Debug)]
pub struct HostRequest {
    id: u64,
    prompt: String,
    reply: oneshot::Sender<Result<String, String>>,
}

impl HostRequest {
    /// Request number, increasing per channel.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Rendered prompt to answer.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Answer the request. Returns false if the guest stopped waiting.
    pub fn respond(self, outcome: Result<String, String>) -> bool {
        self.reply.send(outcome).is_ok()
    }
}

/// Create a connected guest/host pair.
pub fn host_boundary(config: HostChannelConfig) -> (HostChannel, HostEndpoint) {
    let depth = config.queue_depth.clamp(1, QUEUE_DEPTH_MAX);
    let (sender, receiver) = mpsc::channel(depth);

    let channel = HostChannel {
        sender,
        next_id: Arc::new(AtomicU64::new(1)),
        timeout: config.timeout(),
    };
    (channel, HostEndpoint { receiver })
}

/// Guest side of the boundary.
///
/// A blocking call made from a current-thread scheduler parks that
/// scheduler's only thread until the reply arrives, so an endpoint served
/// by a task on the same scheduler cannot answer. Serve the endpoint on
/// another thread or runtime; the request deadline turns the stall into
/// [`InferenceError::Timeout`].
#[derive(Debug, Clone)]
pub struct HostChannel {
    sender: mpsc::Sender<HostRequest>,
    next_id: Arc<AtomicU64>,
    timeout: Option<Duration>,
}

impl HostChannel {
    async fn exchange(&self, prompt: &str) -> Result<String, InferenceError> {
        let (reply, response) = oneshot::channel();
        let request = HostRequest {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            prompt: prompt.to_string(),
            reply,
        };
        let id = request.id;

        self.sender
            .send(request)
            .await
            .map_err(|_| InferenceError::Unavailable("host endpoint closed".to_string()))?;
        debug!(request_id = id, "prompt posted to host");

        match response.await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(message)) => Err(InferenceError::Host(message)),
            Err(_) => Err(InferenceError::Unavailable(format!(
                "host dropped request {} without answering",
                id
            ))),
        }
    }
}

#[async_trait]
impl HostInference for HostChannel {
    async fn infer(&self, prompt: &str) -> Result<String, InferenceError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.exchange(prompt))
                .await
                .map_err(|_| InferenceError::Timeout(limit))?,
            None => self.exchange(prompt).await,
        }
    }

    fn host_name(&self) -> &str {
        "host-channel"
    }
}

/// Host side of the boundary.
#[derive(Debug)]
pub struct HostEndpoint {
    receiver: mpsc::Receiver<HostRequest>,
}

impl HostEndpoint {
    /// Next pending request, or `None` once every guest handle is gone.
    pub async fn next_request(&mut self) -> Option<HostRequest> {
        self.receiver.recv().await
    }

    /// Answer requests with `handler` until every guest handle is dropped.
    ///
    /// Returns the number of requests answered.
    pub async fn serve<F, Fut>(mut self, mut handler: F) -> u64
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<String, String>>,
    {
        let mut answered_count = 0;
        while let Some(request) = self.next_request().await {
            let outcome = handler(request.prompt.clone()).await;
            let id = request.id;
            if request.respond(outcome) {
                answered_count += 1;
            } else {
                warn!(request_id = id, "guest stopped waiting before the host answered");
            }
        }
        answered_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use tb_core::{BridgeConfig, InferenceRequest};

    use crate::bridge::{InferenceBridge, LanguageModel};

    #[tokio::test]
    async fn test_round_trip() {
        let (channel, endpoint) = host_boundary(HostChannelConfig::default());
        let host = tokio::spawn(endpoint.serve(|prompt| async move { Ok(prompt.to_uppercase()) }));

        assert_eq!(channel.infer("select 1").await.unwrap(), "SELECT 1");
        assert_eq!(channel.infer("again").await.unwrap(), "AGAIN");

        drop(channel);
        assert_eq!(host.await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_host_rejection() {
        let (channel, endpoint) = host_boundary(HostChannelConfig::default());
        tokio::spawn(endpoint.serve(|_| async { Err("WebGPU device lost".to_string()) }));

        let err = channel.infer("q").await.unwrap_err();
        assert!(matches!(err, InferenceError::Host(ref m) if m == "WebGPU device lost"));
    }

    #[tokio::test]
    async fn test_closed_endpoint_is_unavailable() {
        let (channel, endpoint) = host_boundary(HostChannelConfig::default());
        drop(endpoint);

        let err = channel.infer("q").await.unwrap_err();
        assert!(matches!(err, InferenceError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_dropped_request_is_unavailable() {
        let (channel, mut endpoint) = host_boundary(HostChannelConfig::default());
        tokio::spawn(async move {
            while let Some(request) = endpoint.next_request().await {
                drop(request);
            }
        });

        let err = channel.infer("q").await.unwrap_err();
        assert!(matches!(err, InferenceError::Unavailable(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        let (channel, mut endpoint) =
            host_boundary(HostChannelConfig::with_timeout(Duration::from_secs(30)));
        // Hold requests without answering.
        let held = tokio::spawn(async move {
            let mut pending = Vec::new();
            while let Some(request) = endpoint.next_request().await {
                pending.push(request);
            }
            pending.len()
        });

        let err = channel.infer("slow").await.unwrap_err();
        assert!(err.is_timeout());
        drop(channel);
        assert_eq!(held.await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_request_ids_increase() {
        let (channel, mut endpoint) = host_boundary(HostChannelConfig::default());
        let guest = channel.clone();
        let asker = tokio::spawn(async move {
            let a = guest.infer("a").await;
            let b = guest.infer("b").await;
            (a, b)
        });

        let first = endpoint.next_request().await.unwrap();
        let first_id = first.id();
        assert_eq!(first.prompt(), "a");
        assert!(first.respond(Ok("1".into())));

        let second = endpoint.next_request().await.unwrap();
        assert!(second.id() > first_id);
        assert!(second.respond(Ok("2".into())));

        let (a, b) = asker.await.unwrap();
        assert_eq!(a.unwrap(), "1");
        assert_eq!(b.unwrap(), "2");
    }

    #[test]
    fn test_default_config_has_deadline() {
        let config = HostChannelConfig::default();
        assert_eq!(config.timeout(), Some(Duration::from_millis(TIMEOUT_MS_DEFAULT)));
        assert_eq!(HostChannelConfig::without_timeout().timeout(), None);

        let parsed: HostChannelConfig = serde_json::from_str(r#"{"queue_depth": 4}"#).unwrap();
        assert_eq!(parsed.timeout_ms, Some(TIMEOUT_MS_DEFAULT));
    }

    #[test]
    fn test_with_timeout_saturates() {
        let config = HostChannelConfig::with_timeout(Duration::MAX);
        assert_eq!(config.timeout_ms, Some(u64::MAX));
        assert_eq!(
            HostChannelConfig::with_timeout(Duration::from_millis(250)).timeout(),
            Some(Duration::from_millis(250))
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_endpoint_on_callers_scheduler_times_out() {
        let (channel, endpoint) = host_boundary(HostChannelConfig::with_timeout(Duration::from_millis(500)));
        // Shares the caller's only thread, so it cannot run while the call blocks.
        let host = tokio::spawn(endpoint.serve(|prompt| async move { Ok(prompt) }));

        let bridge = InferenceBridge::new(Arc::new(channel), BridgeConfig::default());
        let started = Instant::now();
        let err = bridge.complete(&InferenceRequest::new("q")).unwrap_err();

        assert!(matches!(err, InferenceError::Timeout(limit) if limit == Duration::from_millis(500)));
        assert!(started.elapsed() < Duration::from_secs(5));

        drop(bridge);
        assert_eq!(host.await.unwrap(), 0);
    }
}
