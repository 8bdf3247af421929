//! Progress events reported to the observing interface.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A step of the generate → execute → fix cycle.
///
/// Serialized as `{"event": "<tag>", "detail": ...}` so it can be posted
/// across the host boundary unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "detail", rename_all = "snake_case")]
pub enum ProgressEvent {
    GeneratingCode,
    CodeGenerated,
    ExecutingCode,
    CodeExecuted,
    /// Carries the rendered failure context.
    FixingError(String),
}

impl ProgressEvent {
    /// Event tag as seen by the observer.
    pub fn tag(&self) -> &'static str {
        match self {
            ProgressEvent::GeneratingCode => "generating_code",
            ProgressEvent::CodeGenerated => "code_generated",
            ProgressEvent::ExecutingCode => "executing_code",
            ProgressEvent::CodeExecuted => "code_executed",
            ProgressEvent::FixingError(_) => "fixing_error",
        }
    }

    /// Payload carried by the event, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ProgressEvent::FixingError(detail) => Some(detail),
            _ => None,
        }
    }
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
