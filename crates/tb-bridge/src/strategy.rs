//! Synchronous waits on asynchronous host calls.

use std::future::Future;
use std::panic;
use std::thread;

use tokio::runtime::{Builder, Handle, RuntimeFlavor};

use crate::error::InferenceError;

/// How a blocking caller waits for an asynchronous result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockingStrategy {
    /// Active multi-thread scheduler: hand this worker's queue to the other
    /// workers and drive the call on the existing scheduler.
    Reenter,
    /// Active current-thread scheduler: it cannot be re-entered from a
    /// blocking call, so a scoped helper thread drives the call on a
    /// transient scheduler of its own.
    ///
    /// The caller's scheduler makes no progress until the call returns.
    /// Work the call depends on must not be spawned there; bound such
    /// calls with a deadline (see [`crate::HostChannelConfig`]).
    Offload,
    /// No active scheduler: build a transient one on this thread, drive the
    /// call, tear it down.
    Transient,
}

impl BlockingStrategy {
    /// Select the strategy for the calling context.
    #[must_use]
    pub fn detect() -> Self {
        match Handle::try_current() {
            Ok(handle) => match handle.runtime_flavor() {
                RuntimeFlavor::MultiThread => BlockingStrategy::Reenter,
                _ => BlockingStrategy::Offload,
            },
            Err(_) => BlockingStrategy::Transient,
        }
    }

    /// Whether a scheduler was active when this strategy was selected.
    pub fn scheduler_active(&self) -> bool {
        !matches!(self, BlockingStrategy::Transient)
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            BlockingStrategy::Reenter => "reenter",
            BlockingStrategy::Offload => "offload",
            BlockingStrategy::Transient => "transient",
        }
    }

    /// Block until `fut` completes.
    ///
    /// Errors produced by `fut` are returned as-is. Only a failure to build
    /// a transient scheduler adds an error of its own.
    ///
    /// `Reenter` must only be used from a multi-thread scheduler context;
    /// prefer [`BlockingStrategy::detect`] over constructing it by hand.
    pub fn block_on<F, T>(self, fut: F) -> Result<T, InferenceError>
    where
        F: Future<Output = Result<T, InferenceError>> + Send,
        T: Send,
    {
        match self {
            BlockingStrategy::Reenter => {
                let handle = Handle::current();
                tokio::task::block_in_place(move || handle.block_on(fut))
            }
            BlockingStrategy::Offload => thread::scope(|scope| {
                match scope.spawn(move || run_transient(fut)).join() {
                    Ok(result) => result,
                    Err(payload) => panic::resume_unwind(payload),
                }
            }),
            BlockingStrategy::Transient => run_transient(fut),
        }
    }
}

fn run_transient<F, T>(fut: F) -> Result<T, InferenceError>
where
    F: Future<Output = Result<T, InferenceError>>,
{
    let runtime = Builder::new_current_thread().enable_all().build()?;
    runtime.block_on(fut)
}
