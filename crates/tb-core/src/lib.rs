//! # tb-core
//!
//! Core types shared by the inference bridge and the lifecycle wrappers.
//!
//! A tabular-reasoning library running inside a sandboxed guest asks a
//! language model for code, executes that code, and asks again when the code
//! fails. This crate holds the values that flow through that cycle:
//!
//! - [`InferenceRequest`]: an instruction plus optional conversation history,
//!   rendered into the single prompt string sent across the host boundary
//! - [`ProgressEvent`]: what the observing interface is told at each step
//! - [`Traced`] / [`ExecutionFailure`]: failures that expose a kind, a
//!   message, an optional trace and an optional cause
//! - [`FailureContext`]: the diagnostic text handed to the regeneration step
//!
//! ```text
//! ┌─────────────┐   render    ┌─────────────┐   host call   ┌─────────────┐
//! │ Instruction │ ──────────> │   Prompt    │ ────────────> │ Host model  │
//! │ + history   │             │   string    │               │  (async)    │
//! └─────────────┘             └─────────────┘               └─────────────┘
//! ```

pub mod config;
pub mod context;
pub mod failure;
pub mod instruction;
pub mod message;
pub mod progress;
pub mod request;

pub use config::{BridgeConfig, ConfigError};
pub use context::{FailureContext, RecoveredTrace, TraceSource, UNKNOWN_ERROR};
pub use failure::{render_full_trace, render_link, ExecutionFailure, Traced};
pub use instruction::{AugmentedInstruction, Instruction};
pub use message::{ChatMessage, ConversationMemory, Role};
pub use progress::ProgressEvent;
pub use request::InferenceRequest;
