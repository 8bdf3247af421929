//! Single-slot storage for the last execution failure's trace.

/// Holds the trace of the most recent failed execution, if any.
///
/// Overwritten on each write. Owned by one [`InstrumentedLifecycle`], which
/// empties it at the start of every execution attempt so a trace never
/// outlives the attempt that produced it.
///
/// [`InstrumentedLifecycle`]: crate::InstrumentedLifecycle
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PendingTraceSlot {
    trace: Option<String>,
    writes_count: u64,
}

impl PendingTraceSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear any captured trace.
    pub fn reset(&mut self) {
        self.trace = None;
    }

    /// Store `trace`, replacing any previous value. Empty traces are ignored.
    pub fn record(&mut self, trace: String) {
        if trace.trim().is_empty() {
            return;
        }
        self.trace = Some(trace);
        self.writes_count += 1;
    }

    /// Captured trace, left in place.
    pub fn peek(&self) -> Option<&str> {
        self.trace.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.trace.is_none()
    }

    /// Number of traces recorded over the slot's lifetime.
    pub fn writes_count(&self) -> u64 {
        self.writes_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overwrite_on_write() {
        let mut slot = PendingTraceSlot::new();
        assert!(slot.is_empty());

        slot.record("first".to_string());
        slot.record("second".to_string());
        assert_eq!(slot.peek(), Some("second"));
        assert_eq!(slot.writes_count(), 2);

        slot.reset();
        assert!(slot.is_empty());
        assert_eq!(slot.writes_count(), 2);
    }

    #[test]
    fn test_blank_trace_ignored() {
        let mut slot = PendingTraceSlot::new();
        slot.record(" \n".to_string());
        assert!(slot.is_empty());
        assert_eq!(slot.writes_count(), 0);
    }
}
