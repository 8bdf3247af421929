//! Failure context handed to the regeneration step.

use std::fmt;

/// Trace text used when no source yields anything.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Where a recovered trace came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceSource {
    /// Captured by the execute wrapper at the original failure site.
    Captured,
    /// The failure currently being handled by an enclosing handler.
    Ambient,
    /// The trace of the failure's chained cause; holds the cause's kind.
    Cause(String),
    /// The failure's own attached trace; holds the failure's kind.
    Traceback(String),
    /// Only a `"kind: message"` line was available.
    Summary,
}

impl TraceSource {
    /// Short provenance label.
    pub fn label(&self) -> &'static str {
        match self {
            TraceSource::Captured => "captured",
            TraceSource::Ambient => "ambient",
            TraceSource::Cause(_) => "cause",
            TraceSource::Traceback(_) => "traceback",
            TraceSource::Summary => "summary",
        }
    }

    /// Human-readable description used in the debug footer.
    pub fn describe(&self) -> String {
        match self {
            TraceSource::Captured => "captured from execute_code".to_string(),
            TraceSource::Ambient => "failure being handled".to_string(),
            TraceSource::Cause(kind) => format!("chained cause ({})", kind),
            TraceSource::Traceback(kind) => format!("attached trace ({})", kind),
            TraceSource::Summary => "message only - no trace available".to_string(),
        }
    }
}

impl fmt::Display for TraceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of the recovery procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveredTrace {
    pub text: String,
    /// `None` when every source came up empty.
    pub source: Option<TraceSource>,
}

impl RecoveredTrace {
    /// Trace text recovered from `source`.
    pub fn found(text: String, source: TraceSource) -> Self {
        debug_assert!(!text.trim().is_empty(), "Recovered trace must not be empty");
        Self {
            text,
            source: Some(source),
        }
    }

    /// Placeholder when no source yields text.
    pub fn unknown() -> Self {
        Self {
            text: UNKNOWN_ERROR.to_string(),
            source: None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.source.is_none()
    }
}

/// Attempted code plus the best trace found for its failure.
///
/// Built fresh for every regeneration step and dropped afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureContext {
    pub code: Option<String>,
    pub trace: RecoveredTrace,
}

impl FailureContext {
    /// Pair the attempted code with its recovered trace.
    pub fn new(code: Option<&str>, trace: RecoveredTrace) -> Self {
        Self {
            code: code.filter(|c| !c.is_empty()).map(str::to_string),
            trace,
        }
    }

    /// Render as the `fixing_error` payload.
    #[must_use]
    pub fn format_report(&self) -> String {
        let mut parts: Vec<String> = Vec::new();

        if let Some(ref code) = self.code {
            parts.push("CODE:".to_string());
            parts.push(code.clone());
            parts.push(String::new());
        }

        parts.push("ERROR:".to_string());
        parts.push(self.trace.text.clone());

        if let Some(ref source) = self.trace.source {
            parts.push(String::new());
            parts.push(format!("[Debug: Source: {}]", source.describe()));
        }

        parts.join("\n")
    }
}

impl fmt::Display for FailureContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_report())
    }
}
