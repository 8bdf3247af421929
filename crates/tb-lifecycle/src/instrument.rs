//! Progress and failure-context decorator for [`CodeLifecycle`].

use tb_core::{render_full_trace, FailureContext, ProgressEvent, Traced};
use tracing::{error, warn};

use crate::lifecycle::CodeLifecycle;
use crate::recovery::recover_here;
use crate::sink::ProgressSink;
use crate::slot::PendingTraceSlot;

/// Wraps a lifecycle, reporting each step to a sink.
///
/// Results and failures of the inner lifecycle pass through untouched.
/// The pending trace slot belongs to this value, so two instances never
/// see each other's traces.
#[derive(Debug)]
pub struct InstrumentedLifecycle<L, S> {
    inner: L,
    sink: S,
    slot: PendingTraceSlot,
}

impl<L, S> InstrumentedLifecycle<L, S>
where
    L: CodeLifecycle,
    S: ProgressSink,
{
    /// Wrap `inner`, posting progress to `sink`.
    pub fn new(inner: L, sink: S) -> Self {
        Self {
            inner,
            sink,
            slot: PendingTraceSlot::new(),
        }
    }

    /// Trace captured from the last failed execution, until the next one starts.
    pub fn pending_trace(&self) -> Option<&str> {
        self.slot.peek()
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut L {
        &mut self.inner
    }

    /// Unwrap the library.
    pub fn into_inner(self) -> L {
        self.inner
    }
}

impl<L, S> CodeLifecycle for InstrumentedLifecycle<L, S>
where
    L: CodeLifecycle,
    S: ProgressSink,
{
    type Output = L::Output;
    type Error = L::Error;

    fn generate_code(&mut self, query: &str) -> Result<String, Self::Error> {
        self.sink.post(ProgressEvent::GeneratingCode);
        let code = self.inner.generate_code(query)?;
        self.sink.post(ProgressEvent::CodeGenerated);
        Ok(code)
    }

    fn execute_code(&mut self, code: &str) -> Result<Self::Output, Self::Error> {
        self.slot.reset();
        self.sink.post(ProgressEvent::ExecutingCode);

        match self.inner.execute_code(code) {
            Ok(output) => {
                self.sink.post(ProgressEvent::CodeExecuted);
                Ok(output)
            }
            Err(err) => {
                let trace = render_full_trace(&err);
                error!(kind = err.kind(), code, trace = %trace, "generated code failed");
                self.slot.record(trace);
                Err(err)
            }
        }
    }

    fn regenerate_code_after_error(
        &mut self,
        code: Option<&str>,
        error: &Self::Error,
    ) -> Result<String, Self::Error> {
        let recovered = recover_here(self.slot.peek(), Some(error as &dyn Traced));
        let context = FailureContext::new(code, recovered);
        warn!(
            kind = error.kind(),
            source = context.trace.source.as_ref().map(|s| s.label()).unwrap_or("none"),
            "regenerating code after failure"
        );

        self.sink.post(ProgressEvent::FixingError(context.format_report()));
        self.inner.regenerate_code_after_error(code, error)
    }
}
