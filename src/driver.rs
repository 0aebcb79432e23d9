//! The load driver: warmup, probabilistic dispatch, throttle, drain.
//!
//! A single control thread owns the dispatch RNG and the aggregator. It
//! submits tasks to the worker pool, polls for completed ones while the
//! in-flight count sits above the high-water mark, and blocks only when
//! draining. Totals are folded exclusively on the control thread, so they
//! need no lock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::config::{RunConfig, WorkloadMix};
use crate::error::Result;
use crate::pool::EntityPool;
use crate::stats::{Aggregator, RunTotals, TaskMetrics};
use crate::store::GraphStore;
use crate::task_pool::{TaskHandle, TaskPool};
use crate::workers::{self, WorkerKind};

/// Phases of one run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Synchronous seeding bulk-create; no clock yet.
    Warmup,
    /// Probabilistic dispatch while wall-clock time remains.
    Running,
    /// Blocking collection of every outstanding task.
    Draining,
    /// Totals finalized.
    Done,
}

/// Sleep between collection sweeps while over the high-water mark.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

struct InFlight {
    kind: WorkerKind,
    handle: TaskHandle,
}

/// Drives a mixed workload against one store and aggregates the results.
pub struct LoadDriver<S: GraphStore> {
    store: S,
    pool: Arc<EntityPool>,
    run: RunConfig,
    mix: WorkloadMix,
    state: DriverState,
    dump_flag: Arc<AtomicBool>,
}

impl<S: GraphStore> LoadDriver<S> {
    /// Builds a driver over `store` with a fresh, empty entity pool.
    pub fn new(store: S, run: RunConfig, mix: WorkloadMix) -> Self {
        Self {
            store,
            pool: Arc::new(EntityPool::new()),
            run,
            mix,
            state: DriverState::Warmup,
            dump_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that requests a pool-size log line on the next tick. The binary
    /// wires this to SIGUSR2.
    pub fn dump_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.dump_flag)
    }

    /// Current phase.
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Entities currently parked in the shared pool.
    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    /// Executes one full run and returns the final totals.
    ///
    /// A warmup failure is fatal; any task failure after that is counted
    /// and tolerated.
    pub fn run(&mut self) -> Result<RunTotals> {
        let threads = self.run.worker_threads();
        let task_pool = TaskPool::new(threads);
        let mut rng = match self.run.rng_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let mut aggregator = Aggregator::new();
        let mut in_flight: Vec<InFlight> = Vec::new();
        // Uncollected tasks may exceed this only until the next sweep.
        let high_water = threads.saturating_sub(2).max(1);

        self.state = DriverState::Warmup;
        info!(seed_ops = self.run.seed_ops, "warmup: seeding the store");
        let warmup = self.submit(&task_pool, WorkerKind::BulkCreate, self.run.seed_ops, &mut rng);
        let metrics = warmup.handle.join()?;
        aggregator.fold(WorkerKind::BulkCreate.category(), metrics);

        self.state = DriverState::Running;
        info!(
            duration_ms = self.run.duration.as_millis() as u64,
            threads,
            pool_size = self.pool.len(),
            "running"
        );
        let started = Instant::now();
        while started.elapsed() < self.run.duration {
            self.tick(&task_pool, &mut rng, &mut in_flight);
            while in_flight.len() > high_water {
                Self::collect_finished(&mut in_flight, &mut aggregator);
                if in_flight.len() > high_water {
                    thread::sleep(POLL_INTERVAL);
                }
            }
            if self.dump_flag.swap(false, Ordering::AcqRel) {
                info!(pool_size = self.pool.len(), "entity pool size");
            }
            debug!(
                in_flight = in_flight.len(),
                tasks = aggregator.totals().tasks_executed,
                failed = aggregator.totals().tasks_failed,
                reads = aggregator.totals().total_reads,
                writes = aggregator.totals().total_writes,
                "tick"
            );
        }

        self.state = DriverState::Draining;
        info!(outstanding = in_flight.len(), "draining");
        for task in in_flight.drain(..) {
            Self::collect(task.kind, task.handle.join(), &mut aggregator);
        }

        self.state = DriverState::Done;
        let totals = aggregator.into_totals();
        info!(
            tasks = totals.tasks_executed,
            failed = totals.tasks_failed,
            reads = totals.total_reads,
            writes = totals.total_writes,
            pool_size = self.pool.len(),
            "run complete"
        );
        Ok(totals)
    }

    /// One dispatch tick: a stacked coin chooses at most one of
    /// Create/Delete, then each bulk/property kind flips its own coin.
    fn tick(&self, task_pool: &TaskPool, rng: &mut ChaCha8Rng, in_flight: &mut Vec<InFlight>) {
        let dice: f64 = rng.gen();
        if dice < self.mix.create_probability {
            let ops = rng.gen_range(0..self.mix.create_ops_max);
            in_flight.push(self.submit(task_pool, WorkerKind::Create, ops, rng));
        } else if dice < self.mix.create_probability + self.mix.delete_probability {
            let ops = rng.gen_range(0..self.mix.delete_ops_max);
            in_flight.push(self.submit(task_pool, WorkerKind::Delete, ops, rng));
        }
        if rng.gen_bool(self.mix.bulk_create_probability) {
            let ops = self.mix.bulk_create_ops;
            in_flight.push(self.submit(task_pool, WorkerKind::BulkCreate, ops, rng));
        }
        if rng.gen_bool(self.mix.bulk_read_probability) {
            in_flight.push(self.submit(task_pool, WorkerKind::BulkRead, 0, rng));
        }
        if rng.gen_bool(self.mix.property_probability) {
            let ops = self.mix.property_ops;
            in_flight.push(self.submit(task_pool, WorkerKind::PropertyAdd, ops, rng));
        }
    }

    /// Submits one task. Each task gets its own RNG stream seeded from the
    /// dispatch RNG, so a seeded run replays identically.
    fn submit(
        &self,
        task_pool: &TaskPool,
        kind: WorkerKind,
        ops: u32,
        rng: &mut ChaCha8Rng,
    ) -> InFlight {
        let store = self.store.clone();
        let pool = Arc::clone(&self.pool);
        let task_seed: u64 = rng.gen();
        debug!(kind = kind.label(), ops, "submitting task");
        let handle = match kind {
            WorkerKind::BulkCreate => task_pool.submit(move || {
                let mut rng = ChaCha8Rng::seed_from_u64(task_seed);
                workers::bulk_create::run(&store, &pool, ops, &mut rng)
            }),
            WorkerKind::BulkRead => task_pool.submit(move || workers::bulk_read::run(&store)),
            WorkerKind::Create => task_pool.submit(move || {
                let mut rng = ChaCha8Rng::seed_from_u64(task_seed);
                workers::create::run(&store, &pool, ops, &mut rng)
            }),
            WorkerKind::Delete => task_pool.submit(move || {
                let mut rng = ChaCha8Rng::seed_from_u64(task_seed);
                workers::delete::run(&store, &pool, ops, &mut rng)
            }),
            WorkerKind::PropertyAdd => task_pool.submit(move || {
                let mut rng = ChaCha8Rng::seed_from_u64(task_seed);
                workers::property::run(&store, &pool, ops, &mut rng)
            }),
        };
        InFlight { kind, handle }
    }

    /// Collects every already-completed task; never blocks on a running one.
    fn collect_finished(in_flight: &mut Vec<InFlight>, aggregator: &mut Aggregator) {
        let mut index = 0;
        while index < in_flight.len() {
            if in_flight[index].handle.is_finished() {
                let task = in_flight.swap_remove(index);
                Self::collect(task.kind, task.handle.join(), aggregator);
            } else {
                index += 1;
            }
        }
    }

    fn collect(kind: WorkerKind, outcome: Result<TaskMetrics>, aggregator: &mut Aggregator) {
        match outcome {
            Ok(metrics) => {
                debug!(
                    kind = kind.label(),
                    reads = metrics.reads,
                    writes = metrics.writes,
                    elapsed_ms = metrics.elapsed_ms,
                    "task complete"
                );
                aggregator.fold(kind.category(), metrics);
            }
            Err(err) => {
                warn!(kind = kind.label(), %err, "task failed");
                aggregator.record_failure();
            }
        }
    }
}
