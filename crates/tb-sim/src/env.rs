//! One seed driving every simulated component.

use std::sync::Arc;

use tb_bridge::LanguageModel;

use crate::fault::{FaultConfig, FaultInjector};
use crate::host::SimulatedHost;
use crate::library::ScriptedLibrary;
use crate::random::SimRng;

/// Source of reproducible simulated hosts and libraries.
///
/// Each component gets a generator forked from the master seed, in the
/// order components are requested.
///
/// ```rust
/// use tb_sim::SimEnv;
///
/// let mut env = SimEnv::new(12345);
/// let host = env.host();
/// assert_eq!(env.format_seed(), "SIM_SEED=12345");
/// # drop(host);
/// ```
#[derive(Debug)]
pub struct SimEnv {
    seed: u64,
    master: SimRng,
    config: FaultConfig,
    components_count: u32,
}

impl SimEnv {
    /// Environment with the default fault config.
    pub fn new(seed: u64) -> Self {
        Self::with_fault_config(seed, FaultConfig::default())
    }

    pub fn with_fault_config(seed: u64, config: FaultConfig) -> Self {
        Self {
            seed,
            master: SimRng::new(seed),
            config,
            components_count: 0,
        }
    }

    /// Master seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub fn fault_config(&self) -> &FaultConfig {
        &self.config
    }

    /// A host with its own forked generator.
    pub fn host(&mut self) -> Arc<SimulatedHost> {
        Arc::new(SimulatedHost::new(self.fork(), self.config.clone()))
    }

    /// A library whose execution failures are drawn from a forked generator.
    pub fn library<M: LanguageModel>(&mut self, model: M) -> ScriptedLibrary<M> {
        let faults = FaultInjector::new(self.fork(), self.config.clone());
        ScriptedLibrary::seeded(model, faults)
    }

    /// `SIM_SEED=<seed>`, ready to paste into a failing run.
    #[must_use]
    pub fn format_seed(&self) -> String {
        format!("SIM_SEED={}", self.seed)
    }

    fn fork(&mut self) -> SimRng {
        self.components_count += 1;
        self.master.fork()
    }
}
