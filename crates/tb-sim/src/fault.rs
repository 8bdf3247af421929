//! Seeded fault decisions for the simulated host and library.

use std::time::Duration;

use serde::Deserialize;

use crate::random::SimRng;

/// Probabilities driving injected faults.
///
/// Missing fields take their [`Default`] values when deserialized.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FaultConfig {
    /// Chance a host inference call is rejected
    pub host_failure_probability: f64,
    /// Chance a host call is delayed
    pub delay_probability: f64,
    /// Upper bound of an injected delay
    pub delay_ms_max: u64,
    /// Chance an execution attempt fails
    pub execution_failure_probability: f64,
    pub enabled: bool,
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            host_failure_probability: 0.02,
            delay_probability: 0.1,
            delay_ms_max: 5,
            execution_failure_probability: 0.3,
            enabled: true,
        }
    }
}

impl FaultConfig {
    /// No faults.
    #[must_use]
    pub fn none() -> Self {
        Self {
            host_failure_probability: 0.0,
            delay_probability: 0.0,
            delay_ms_max: 0,
            execution_failure_probability: 0.0,
            enabled: false,
        }
    }

    /// High fault rates for stress runs.
    #[must_use]
    pub fn aggressive() -> Self {
        Self {
            host_failure_probability: 0.1,
            delay_probability: 0.3,
            delay_ms_max: 20,
            execution_failure_probability: 0.6,
            enabled: true,
        }
    }
}

/// Draws fault decisions from a seeded generator.
#[derive(Debug, Clone)]
pub struct FaultInjector {
    rng: SimRng,
    config: FaultConfig,
    stats: FaultStats,
}

impl FaultInjector {
    /// Create an injector drawing from `rng`.
    pub fn new(rng: SimRng, config: FaultConfig) -> Self {
        debug_assert!(
            (0.0..=1.0).contains(&config.host_failure_probability),
            "Host failure probability must be in [0.0, 1.0]"
        );
        debug_assert!(
            (0.0..=1.0).contains(&config.execution_failure_probability),
            "Execution failure probability must be in [0.0, 1.0]"
        );

        Self {
            rng,
            config,
            stats: FaultStats::default(),
        }
    }

    /// Decide whether the next host call fails.
    pub fn should_fail_host(&mut self) -> bool {
        if !self.config.enabled {
            return false;
        }
        let fail = self.rng.gen_bool(self.config.host_failure_probability);
        if fail {
            self.stats.host_failures_count += 1;
        }
        fail
    }

    /// Decide whether the next execution fails.
    pub fn should_fail_execution(&mut self) -> bool {
        if !self.config.enabled {
            return false;
        }
        let fail = self.rng.gen_bool(self.config.execution_failure_probability);
        if fail {
            self.stats.execution_failures_count += 1;
        }
        fail
    }

    /// Latency to add to the next host call, if any.
    pub fn maybe_delay(&mut self) -> Option<Duration> {
        if !self.config.enabled || self.config.delay_ms_max == 0 {
            return None;
        }
        if self.rng.gen_bool(self.config.delay_probability) {
            self.stats.delays_count += 1;
            Some(Duration::from_millis(self.rng.gen_range(1..=self.config.delay_ms_max)))
        } else {
            None
        }
    }

    /// Generator for choices that are not faults (reply text, failure shape).
    pub fn rng(&mut self) -> &mut SimRng {
        &mut self.rng
    }

    #[must_use]
    pub fn config(&self) -> &FaultConfig {
        &self.config
    }

    /// Get fault injection statistics.
    #[must_use]
    pub fn stats(&self) -> FaultStats {
        self.stats
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FaultStats {
    pub host_failures_count: u64,
    pub execution_failures_count: u64,
    pub delays_count: u64,
}
