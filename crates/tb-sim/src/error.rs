//! Failures of the simulated reasoning library.

use tb_bridge::InferenceError;
use tb_core::{ExecutionFailure, Traced};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    /// The model could not be reached or answered badly.
    #[error(transparent)]
    Inference(#[from] InferenceError),

    /// Generated code failed when run.
    #[error(transparent)]
    Execution(#[from] ExecutionFailure),

    #[error("model reply contained no code")]
    NoCode,
}

impl Traced for SimError {
    fn kind(&self) -> &str {
        match self {
            SimError::Inference(err) => Traced::kind(err),
            SimError::Execution(err) => Traced::kind(err),
            SimError::NoCode => "NoCodeFound",
        }
    }

    fn trace(&self) -> Option<&str> {
        match self {
            SimError::Execution(err) => Traced::trace(err),
            _ => None,
        }
    }

    fn cause(&self) -> Option<&dyn Traced> {
        match self {
            SimError::Execution(err) => Traced::cause(err),
            _ => None,
        }
    }
}
