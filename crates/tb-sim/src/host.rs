//! Seeded stand-in for the host inference engine.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tb_bridge::{HostInference, InferenceError};
use tracing::{debug, warn};

use crate::fault::{FaultConfig, FaultInjector, FaultStats};
use crate::random::SimRng;

/// Code bodies the simulated model picks from.
const SNIPPETS: &[&str] = &[
    "df = dfs[0]\nresult = {'type': 'number', 'value': len(df)}",
    "df = execute_sql_query('SELECT region, SUM(sales) AS total FROM sales GROUP BY region')\nresult = {'type': 'dataframe', 'value': df}",
    "df = dfs[0]\nresult = {'type': 'string', 'value': ', '.join(df.columns)}",
    "df = dfs[0].describe()\nresult = {'type': 'dataframe', 'value': df}",
];

/// Answers every prompt with fenced python code after seeded delays and
/// failures.
pub struct SimulatedHost {
    faults: Mutex<FaultInjector>,
    replies_count: AtomicU64,
    prompts: Mutex<Vec<String>>,
}

impl SimulatedHost {
    /// Host whose faults are drawn from `rng`.
    pub fn new(rng: SimRng, config: FaultConfig) -> Self {
        Self {
            faults: Mutex::new(FaultInjector::new(rng, config)),
            replies_count: AtomicU64::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Host without injected faults.
    pub fn reliable(seed: u64) -> Self {
        Self::new(SimRng::new(seed), FaultConfig::none())
    }

    /// Prompts received so far, in arrival order.
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    /// Replies returned so far.
    pub fn replies_count(&self) -> u64 {
        self.replies_count.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> FaultStats {
        lock(&self.faults).stats()
    }
}

impl std::fmt::Debug for SimulatedHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedHost")
            .field("replies_count", &self.replies_count())
            .field("stats", &self.stats())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl HostInference for SimulatedHost {
    async fn infer(&self, prompt: &str) -> Result<String, InferenceError> {
        let (delay, fail, snippet) = {
            let mut faults = lock(&self.faults);
            let delay = faults.maybe_delay();
            let fail = faults.should_fail_host();
            let snippet = faults.rng().choose(SNIPPETS).copied().unwrap_or(SNIPPETS[0]);
            (delay, fail, snippet)
        };
        lock(&self.prompts).push(prompt.to_string());

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            warn!(prompt_chars = prompt.len(), "simulated host rejected request");
            return Err(InferenceError::Host("simulated engine failure".to_string()));
        }

        let reply_id = self.replies_count.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(reply_id, "simulated host answered");
        Ok(format!("```python\n# reply {}\n{}\n```", reply_id, snippet))
    }

    fn host_name(&self) -> &str {
        "simulated"
    }
}
