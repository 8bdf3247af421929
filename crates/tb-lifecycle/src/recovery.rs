//! Ordered trace recovery.
//!
//! Each source is a pure function over [`RecoveryInputs`]. The first one
//! producing non-blank text wins.

use tb_core::{render_full_trace, render_link, RecoveredTrace, TraceSource, Traced};

use crate::ambient;

/// Everything the recovery sources may consult.
#[derive(Clone, Copy)]
pub struct RecoveryInputs<'a> {
    /// Trace left in the pending slot by the execute wrapper.
    pub captured: Option<&'a str>,
    /// Trace of the failure an enclosing handler is dealing with.
    pub ambient: Option<&'a str>,
    /// The failure passed to the regeneration step.
    pub error: Option<&'a dyn Traced>,
}

impl<'a> RecoveryInputs<'a> {
    /// Inputs without an ambient failure.
    pub fn new(captured: Option<&'a str>, error: Option<&'a dyn Traced>) -> Self {
        Self {
            captured,
            ambient: None,
            error,
        }
    }

    /// Add the trace of the failure being handled.
    pub fn with_ambient(mut self, ambient: Option<&'a str>) -> Self {
        self.ambient = ambient;
        self
    }
}

impl std::fmt::Debug for RecoveryInputs<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecoveryInputs")
            .field("captured", &self.captured)
            .field("ambient", &self.ambient)
            .field("error", &self.error.map(|e| e.summary()))
            .finish()
    }
}

type Source = fn(&RecoveryInputs<'_>) -> Option<(String, TraceSource)>;

const SOURCES: [Source; 5] = [captured, ambient_failure, cause_trace, own_trace, summary];

fn captured(inputs: &RecoveryInputs<'_>) -> Option<(String, TraceSource)> {
    inputs.captured.map(|t| (t.to_string(), TraceSource::Captured))
}

fn ambient_failure(inputs: &RecoveryInputs<'_>) -> Option<(String, TraceSource)> {
    inputs.ambient.map(|t| (t.to_string(), TraceSource::Ambient))
}

/// Whether `failure` carries a non-blank trace of its own.
fn has_trace(failure: &dyn Traced) -> bool {
    failure.trace().is_some_and(|t| !t.trim().is_empty())
}

fn cause_trace(inputs: &RecoveryInputs<'_>) -> Option<(String, TraceSource)> {
    let cause = inputs.error?.cause()?;
    if !has_trace(cause) {
        return None;
    }
    Some((render_link(cause), TraceSource::Cause(cause.kind().to_string())))
}

fn own_trace(inputs: &RecoveryInputs<'_>) -> Option<(String, TraceSource)> {
    let error = inputs.error?;
    if !has_trace(error) {
        return None;
    }
    Some((
        render_full_trace(error),
        TraceSource::Traceback(error.kind().to_string()),
    ))
}

fn summary(inputs: &RecoveryInputs<'_>) -> Option<(String, TraceSource)> {
    let error = inputs.error?;
    if error.kind().is_empty() && error.to_string().is_empty() {
        return None;
    }
    Some((error.summary(), TraceSource::Summary))
}

/// Run the sources in order and return the first non-blank trace, or
/// `"Unknown error"` with no source.
pub fn recover(inputs: &RecoveryInputs<'_>) -> RecoveredTrace {
    SOURCES
        .iter()
        .filter_map(|source| source(inputs))
        .find(|(text, _)| !text.trim().is_empty())
        .map(|(text, source)| RecoveredTrace::found(text, source))
        .unwrap_or_else(RecoveredTrace::unknown)
}

/// [`recover`] with the ambient source read from the current thread.
pub fn recover_here(captured: Option<&str>, error: Option<&dyn Traced>) -> RecoveredTrace {
    let ambient = ambient::current();
    recover(&RecoveryInputs::new(captured, error).with_ambient(ambient.as_deref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tb_core::{ExecutionFailure, UNKNOWN_ERROR};

    #[test]
    fn test_captured_wins() {
        let err = ExecutionFailure::new("KeyError", "'x'").with_trace("line 1");
        let trace = recover(
            &RecoveryInputs::new(Some("captured trace"), Some(&err)).with_ambient(Some("ambient")),
        );
        assert_eq!(trace.text, "captured trace");
        assert_eq!(trace.source, Some(TraceSource::Captured));
    }

    #[test]
    fn test_blank_capture_falls_through() {
        let err = ExecutionFailure::new("KeyError", "'x'");
        let trace = recover(&RecoveryInputs::new(Some("  "), Some(&err)).with_ambient(Some("handled")));
        assert_eq!(trace.text, "handled");
        assert_eq!(trace.source, Some(TraceSource::Ambient));
    }

    #[test]
    fn test_cause_trace_only() {
        let cause = ExecutionFailure::new("ZeroDivisionError", "division by zero")
            .with_trace("  File \"<code>\", line 3");
        let err = ExecutionFailure::new("RuntimeError", "wrapped").without_trace().caused_by(cause);

        let trace = recover(&RecoveryInputs::new(None, Some(&err)));
        assert_eq!(
            trace.text,
            "  File \"<code>\", line 3\nZeroDivisionError: division by zero"
        );
        assert_eq!(trace.source, Some(TraceSource::Cause("ZeroDivisionError".to_string())));
    }

    #[test]
    fn test_untraced_cause_skipped() {
        let cause = ExecutionFailure::new("ValueError", "bad");
        let err = ExecutionFailure::new("RuntimeError", "wrapped")
            .with_trace("line 9")
            .caused_by(cause);

        let trace = recover(&RecoveryInputs::new(None, Some(&err)));
        assert_eq!(trace.source, Some(TraceSource::Traceback("RuntimeError".to_string())));
        assert!(trace.text.ends_with("line 9\nRuntimeError: wrapped"));
        assert!(trace.text.starts_with("ValueError: bad"));
    }

    #[test]
    fn test_blank_cause_trace_skipped() {
        let cause = ExecutionFailure::new("ValueError", "bad").with_trace("   \n");
        let err = ExecutionFailure::new("RuntimeError", "wrapped")
            .with_trace("  File \"<code>\", line 9")
            .caused_by(cause);

        let trace = recover(&RecoveryInputs::new(None, Some(&err)));
        assert_eq!(trace.source, Some(TraceSource::Traceback("RuntimeError".to_string())));
        assert!(trace.text.ends_with("  File \"<code>\", line 9\nRuntimeError: wrapped"));
    }

    #[test]
    fn test_blank_own_trace_falls_to_summary() {
        let err = ExecutionFailure::new("KeyError", "'regoin'").with_trace("\t\n");
        let trace = recover(&RecoveryInputs::new(None, Some(&err)));
        assert_eq!(trace.text, "KeyError: 'regoin'");
        assert_eq!(trace.source, Some(TraceSource::Summary));
    }

    #[test]
    fn test_summary_only() {
        let err = ExecutionFailure::new("NameError", "name 'df' is not defined");
        let trace = recover(&RecoveryInputs::new(None, Some(&err)));
        assert_eq!(trace.text, "NameError: name 'df' is not defined");
        assert_eq!(trace.source, Some(TraceSource::Summary));
    }

    #[test]
    fn test_nothing_available() {
        let trace = recover(&RecoveryInputs::new(None, None));
        assert_eq!(trace.text, UNKNOWN_ERROR);
        assert!(trace.is_unknown());
    }

    #[test]
    fn test_recover_here_reads_ambient() {
        let handled = ExecutionFailure::new("TypeError", "unsupported operand");
        let trace = ambient::handling(&handled, || recover_here(None, None));
        assert_eq!(trace.text, "TypeError: unsupported operand");
        assert_eq!(trace.source, Some(TraceSource::Ambient));

        assert!(recover_here(None, None).is_unknown());
    }
}
