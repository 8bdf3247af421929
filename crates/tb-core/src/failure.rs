//! Traceable failures.
//!
//! The lifecycle wrappers never inspect a failure's concrete type. They only
//! need its kind, its message, a trace if one was attached where the failure
//! happened, and the failure that caused it, if any. [`Traced`] exposes
//! exactly that, so any error type can be plugged in without relying on a
//! particular chaining mechanism.

use std::fmt;

/// A failure that can describe where it came from.
pub trait Traced: fmt::Display {
    /// Short type-like name, e.g. `"KeyError"`.
    fn kind(&self) -> &str;

    /// Trace attached at the failure site.
    fn trace(&self) -> Option<&str> {
        None
    }

    /// The failure this one wraps.
    fn cause(&self) -> Option<&dyn Traced> {
        None
    }

    /// One-line `"{kind}: {message}"` rendering.
    fn summary(&self) -> String {
        format!("{}: {}", self.kind(), self)
    }
}

const CAUSE_SEPARATOR: &str =
    "\nThe above failure was the direct cause of the following failure:\n\n";

/// Maximum cause-chain depth rendered.
const CAUSE_DEPTH_MAX: usize = 32;

/// Render the full trace of a failure, causes first.
///
/// Each link renders as its attached trace (if any) followed by its
/// summary line. Never returns an empty string for a failure with a kind.
pub fn render_full_trace(failure: &dyn Traced) -> String {
    let mut chain: Vec<&dyn Traced> = Vec::new();
    let mut current = Some(failure);
    while let Some(link) = current {
        if chain.len() == CAUSE_DEPTH_MAX {
            break;
        }
        chain.push(link);
        current = link.cause();
    }

    chain
        .iter()
        .rev()
        .map(|link| render_link(*link))
        .collect::<Vec<_>>()
        .join(CAUSE_SEPARATOR)
}

/// Render one failure: its trace, then its summary line.
pub fn render_link(link: &dyn Traced) -> String {
    match link.trace().map(str::trim_end).filter(|t| !t.is_empty()) {
        Some(trace) => format!("{}\n{}", trace, link.summary()),
        None => link.summary(),
    }
}

/// Concrete failure value produced by code execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionFailure {
    kind: String,
    message: String,
    trace: Option<String>,
    cause: Option<Box<ExecutionFailure>>,
}

impl ExecutionFailure {
    /// Failure with no trace and no cause.
    #[must_use]
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        let kind = kind.into();
        debug_assert!(!kind.is_empty(), "Failure kind must not be empty");

        Self {
            kind,
            message: message.into(),
            trace: None,
            cause: None,
        }
    }

    /// Attach the trace captured at the failure site.
    #[must_use]
    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = Some(trace.into());
        self
    }

    /// Chain the failure that caused this one.
    #[must_use]
    pub fn caused_by(mut self, cause: ExecutionFailure) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Drop the attached trace, keeping kind, message and cause.
    #[must_use]
    pub fn without_trace(mut self) -> Self {
        self.trace = None;
        self
    }
}

impl fmt::Display for ExecutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ExecutionFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|c| c as &(dyn std::error::Error + 'static))
    }
}

impl Traced for ExecutionFailure {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn trace(&self) -> Option<&str> {
        self.trace.as_deref()
    }

    fn cause(&self) -> Option<&dyn Traced> {
        self.cause.as_deref().map(|c| c as &dyn Traced)
    }
}
