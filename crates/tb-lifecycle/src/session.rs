//! Per-query wiring of model, sink and instrumentation.

use std::sync::Arc;

use tb_bridge::{HostInference, HostedConfig, HttpInference, InferenceBridge, InferenceError};
use tb_core::BridgeConfig;
use tracing::info;

use crate::instrument::InstrumentedLifecycle;
use crate::lifecycle::CodeLifecycle;
use crate::sink::ProgressSink;

/// A configured model bridge plus the sink progress is reported to.
///
/// Each query gets its own [`InstrumentedLifecycle`] from [`Session::instrument`],
/// so concurrent queries never share a pending trace.
#[derive(Debug, Clone)]
pub struct Session<S> {
    bridge: InferenceBridge,
    sink: S,
    queries_count: u64,
}

impl<S> Session<S>
where
    S: ProgressSink + Clone,
{
    /// Session over an existing bridge.
    pub fn new(bridge: InferenceBridge, sink: S) -> Self {
        Self {
            bridge,
            sink,
            queries_count: 0,
        }
    }

    /// Session over an in-process host.
    pub fn with_host(host: Arc<dyn HostInference>, config: BridgeConfig, sink: S) -> Self {
        Self::new(InferenceBridge::new(host, config), sink)
    }

    /// Session over an OpenAI-compatible endpoint.
    pub fn hosted(config: HostedConfig, sink: S) -> Result<Self, InferenceError> {
        let model = config.model.clone();
        let client = HttpInference::new(config)?;
        Ok(Self::new(
            InferenceBridge::with_model_type(Arc::new(client), model, "hosted"),
            sink,
        ))
    }

    /// Model handle to give the reasoning library.
    pub fn model(&self) -> &InferenceBridge {
        &self.bridge
    }

    /// Progress sink shared by every query.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Wrap `library` for one query.
    pub fn instrument<L: CodeLifecycle>(&mut self, library: L) -> InstrumentedLifecycle<L, S> {
        self.queries_count += 1;
        info!(
            query = self.queries_count,
            model = %self.bridge.config().model,
            "starting query cycle"
        );
        InstrumentedLifecycle::new(library, self.sink.clone())
    }

    /// Queries instrumented so far.
    pub fn queries_count(&self) -> u64 {
        self.queries_count
    }
}
