//! # tb-bridge
//!
//! Lets a library that calls its language model synchronously reach an
//! asynchronous inference engine on the other side of a host boundary.
//!
//! ## Blocking strategies
//!
//! The caller may already be running inside a scheduler. Starting a second
//! one there panics, and blocking the one it is on can starve the very task
//! that would answer. [`BlockingStrategy::detect`] asks explicitly which case
//! applies:
//!
//! | Caller context | Strategy | How the host call is driven |
//! |----------------|----------|-----------------------------|
//! | multi-thread scheduler | `Reenter` | `block_in_place` + `Handle::block_on` |
//! | current-thread scheduler | `Offload` | transient scheduler on a scoped helper thread |
//! | no scheduler | `Transient` | transient scheduler on the calling thread |
//!
//! All three return the host's result or its error unchanged.
//!
//! ```text
//! ┌─────────────┐  call()   ┌─────────────┐  infer()  ┌─────────────┐
//! │  Library    │ ────────> │  Inference  │ ────────> │    Host     │
//! │  (sync)     │ <──────── │   Bridge    │ <──────── │  (async)    │
//! └─────────────┘  String   └─────────────┘  Result   └─────────────┘
//! ```
//!
//! ## Hosts
//!
//! - [`HostChannel`]: in-process boundary; the host side answers requests
//!   through a [`HostEndpoint`]
//! - [`HttpInference`]: OpenAI-compatible chat completions endpoint

pub mod bridge;
pub mod channel;
pub mod error;
pub mod host;
pub mod http;
pub mod strategy;

pub use bridge::{InferenceBridge, LanguageModel};
pub use channel::{host_boundary, HostChannel, HostChannelConfig, HostEndpoint, HostRequest};
pub use error::InferenceError;
pub use host::HostInference;
pub use http::{normalize_bearer, HostedConfig, HttpInference};
pub use strategy::BlockingStrategy;
