//! Run configuration and the workload mix.
//!
//! [`RunConfig`] fixes the run length, warmup size, and worker-thread count;
//! [`WorkloadMix`] fixes the per-tick dispatch coins and operation budgets.
//! The defaults reproduce the standard one-minute soak.

use std::thread;
use std::time::Duration;

/// How long and how hard one run drives the store.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Wall-clock budget for the RUNNING phase.
    pub duration: Duration,
    /// Operation budget of the synchronous warmup bulk-create.
    pub seed_ops: u32,
    /// Seed for the dispatch RNG; `None` draws from the OS.
    pub rng_seed: Option<u64>,
    /// Worker-thread override; `None` sizes from hardware parallelism.
    pub threads: Option<usize>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(60),
            seed_ops: 10_000,
            rng_seed: None,
            threads: None,
        }
    }
}

impl RunConfig {
    /// An `m`-minute soak with the standard warmup.
    pub fn minutes(m: u64) -> Self {
        Self {
            duration: Duration::from_secs(m * 60),
            seed_ops: 10_000,
            rng_seed: None,
            threads: None,
        }
    }

    /// Warmup and drain only: the RUNNING phase expires immediately.
    pub fn smoke() -> Self {
        Self {
            duration: Duration::ZERO,
            seed_ops: 10_000,
            rng_seed: None,
            threads: None,
        }
    }

    /// Worker threads to spawn: hardware parallelism + 2 unless overridden.
    pub fn worker_threads(&self) -> usize {
        self.threads.unwrap_or_else(|| {
            thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
                + 2
        })
    }
}

/// Per-tick dispatch probabilities and operation budgets.
///
/// A single three-way coin submits at most one of Create/Delete per tick;
/// the bulk and property kinds flip independent coins.
#[derive(Debug, Clone)]
pub struct WorkloadMix {
    /// Three-way coin: create branch.
    pub create_probability: f64,
    /// Three-way coin: delete branch (stacked after the create branch).
    pub delete_probability: f64,
    /// Independent coin for bulk-create submission.
    pub bulk_create_probability: f64,
    /// Independent coin for bulk-read submission.
    pub bulk_read_probability: f64,
    /// Independent coin for property submission.
    pub property_probability: f64,
    /// Create budgets draw uniformly from `[0, create_ops_max)`.
    pub create_ops_max: u32,
    /// Delete budgets draw uniformly from `[0, delete_ops_max)`.
    pub delete_ops_max: u32,
    /// Fixed bulk-create budget.
    pub bulk_create_ops: u32,
    /// Fixed property budget.
    pub property_ops: u32,
}

impl Default for WorkloadMix {
    fn default() -> Self {
        Self {
            create_probability: 0.5,
            delete_probability: 0.4,
            bulk_create_probability: 0.7,
            bulk_read_probability: 0.1,
            property_probability: 0.5,
            create_ops_max: 1000,
            delete_ops_max: 1000,
            bulk_create_ops: 2000,
            property_ops: 200,
        }
    }
}
