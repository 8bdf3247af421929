//! # tb-sim
//!
//! Deterministic simulation of both sides of the bridge: a seeded host
//! inference engine and a scripted reasoning library. All behavior is
//! reproducible from one seed.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use tb_core::BridgeConfig;
//! use tb_lifecycle::{RecordingSink, Session};
//! use tb_sim::{drive_cycle, FaultConfig, SimEnv};
//!
//! let mut env = SimEnv::with_fault_config(12345, FaultConfig::none());
//! let sink = Arc::new(RecordingSink::new());
//! let mut session = Session::with_host(env.host(), BridgeConfig::default(), Arc::clone(&sink));
//!
//! let library = env.library(session.model().clone());
//! let mut lifecycle = session.instrument(library);
//! let outcome = drive_cycle(&mut lifecycle, "How many rows?", 3).unwrap();
//!
//! assert_eq!(outcome.attempts, 1);
//! assert_eq!(sink.tags(), ["generating_code", "code_generated", "executing_code", "code_executed"]);
//! ```
//!
//! ## Reproducibility
//!
//! ```bash
//! SIM_SEED=12345 cargo test -p tb-sim
//! ```

pub mod driver;
pub mod env;
pub mod error;
pub mod fault;
pub mod host;
pub mod library;
pub mod random;

pub use driver::{drive_cycle, CycleOutcome};
pub use env::SimEnv;
pub use error::SimError;
pub use fault::{FaultConfig, FaultInjector, FaultStats};
pub use host::SimulatedHost;
pub use library::{extract_code, FailureShape, ScriptedLibrary, Step};
pub use random::SimRng;

/// Seed from `SIM_SEED`, or a fresh random one.
///
/// The seed is printed either way so a run can be reproduced.
#[must_use]
pub fn get_or_generate_seed() -> u64 {
    match std::env::var("SIM_SEED") {
        Ok(value) => match value.trim().parse::<u64>() {
            Ok(seed) => {
                println!("SIM_SEED={} (from environment)", seed);
                seed
            }
            Err(_) => {
                let seed = rand::random::<u64>();
                eprintln!("SIM_SEED={:?} is not a u64, using {}", value, seed);
                seed
            }
        },
        Err(_) => {
            let seed = rand::random::<u64>();
            println!("SIM_SEED={} (randomly generated)", seed);
            seed
        }
    }
}
