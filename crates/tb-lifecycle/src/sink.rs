//! Destinations for lifecycle progress events.
//!
//! Posting is fire-and-forget: a sink never reports failure back to the
//! lifecycle, and an absent observer is not an error.

use std::sync::{Arc, Mutex};

use tb_core::ProgressEvent;
use tokio::sync::mpsc;
use tracing::info;

pub trait ProgressSink {
    fn post(&self, event: ProgressEvent);
}

impl<S: ProgressSink + ?Sized> ProgressSink for &S {
    fn post(&self, event: ProgressEvent) {
        (**self).post(event)
    }
}

impl<S: ProgressSink + ?Sized> ProgressSink for Arc<S> {
    fn post(&self, event: ProgressEvent) {
        (**self).post(event)
    }
}

/// Adapts a closure into a sink.
#[derive(Clone)]
pub struct FnSink<F>(pub F);

impl<F: Fn(ProgressEvent)> ProgressSink for FnSink<F> {
    fn post(&self, event: ProgressEvent) {
        (self.0)(event)
    }
}

/// Forwards events to the host side over an unbounded queue.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

/// Create a sink and the receiver the host reads events from.
pub fn progress_channel() -> (ChannelSink, mpsc::UnboundedReceiver<ProgressEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelSink { tx }, rx)
}

impl ProgressSink for ChannelSink {
    fn post(&self, event: ProgressEvent) {
        // Receiver gone means nobody is watching.
        let _ = self.tx.send(event);
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events in delivery order.
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.lock().clone()
    }

    /// Wire tags of the recorded events.
    pub fn tags(&self) -> Vec<&'static str> {
        self.lock().iter().map(ProgressEvent::tag).collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ProgressEvent>> {
        // A panicking observer must not silence later events.
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ProgressSink for RecordingSink {
    fn post(&self, event: ProgressEvent) {
        self.lock().push(event);
    }
}

/// Writes events to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn post(&self, event: ProgressEvent) {
        match event.detail() {
            Some(detail) => info!(event = event.tag(), detail, "progress"),
            None => info!(event = event.tag(), "progress"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink() {
        let sink = RecordingSink::new();
        sink.post(ProgressEvent::GeneratingCode);
        sink.post(ProgressEvent::FixingError("ctx".to_string()));

        assert_eq!(sink.tags(), vec!["generating_code", "fixing_error"]);
        assert_eq!(sink.events()[1].detail(), Some("ctx"));

        sink.clear();
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_shared_sink_through_arc() {
        let sink = Arc::new(RecordingSink::new());
        let shared = Arc::clone(&sink);
        shared.post(ProgressEvent::CodeGenerated);
        assert_eq!(sink.tags(), vec!["code_generated"]);
    }

    #[test]
    fn test_fn_sink() {
        let seen = Mutex::new(Vec::new());
        let sink = FnSink(|event: ProgressEvent| seen.lock().unwrap().push(event.tag()));
        sink.post(ProgressEvent::ExecutingCode);
        sink.post(ProgressEvent::CodeExecuted);
        assert_eq!(*seen.lock().unwrap(), vec!["executing_code", "code_executed"]);
    }

    #[tokio::test]
    async fn test_channel_sink_delivers_in_order() {
        let (sink, mut rx) = progress_channel();
        sink.post(ProgressEvent::GeneratingCode);
        sink.post(ProgressEvent::CodeGenerated);

        assert_eq!(rx.recv().await, Some(ProgressEvent::GeneratingCode));
        assert_eq!(rx.recv().await, Some(ProgressEvent::CodeGenerated));
    }

    #[test]
    fn test_channel_sink_without_receiver() {
        let (sink, rx) = progress_channel();
        drop(rx);
        sink.post(ProgressEvent::GeneratingCode);
    }
}
