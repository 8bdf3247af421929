//! # tb-lifecycle
//!
//! Instrumentation around the reasoning library's code lifecycle.
//!
//! The library generates code for a query, executes it, and on failure asks
//! for corrected code. [`InstrumentedLifecycle`] decorates any
//! [`CodeLifecycle`] so that each step reports a [`ProgressEvent`] and every
//! regeneration receives the most complete failure trace available.
//!
//! ```text
//! generate ──> generating_code ─> (inner) ─> code_generated
//! execute  ──> reset slot ─> executing_code ─> (inner) ─┬─> code_executed
//!                                                       └─> trace into slot, re-raise
//! regenerate ─> recover trace ─> fixing_error(context) ─> (inner)
//! ```
//!
//! ## Trace recovery order
//!
//! 1. trace captured by the execute wrapper
//! 2. failure currently being handled ([`ambient::handling`])
//! 3. trace of the failure's cause
//! 4. the failure's own trace
//! 5. `"kind: message"`
//!
//! Nothing found yields `"Unknown error"`.
//!
//! [`ProgressEvent`]: tb_core::ProgressEvent

pub mod ambient;
pub mod instrument;
pub mod lifecycle;
pub mod recovery;
pub mod session;
pub mod sink;
pub mod slot;

pub use instrument::InstrumentedLifecycle;
pub use lifecycle::CodeLifecycle;
pub use recovery::{recover, RecoveryInputs};
pub use session::Session;
pub use sink::{progress_channel, ChannelSink, FnSink, ProgressSink, RecordingSink, TracingSink};
pub use slot::PendingTraceSlot;
