//! Bulk creation: one transaction, many nodes and edges.

use std::time::Instant;

use rand::Rng;

use crate::error::Result;
use crate::pool::EntityPool;
use crate::stats::TaskMetrics;
use crate::store::{EntityId, GraphStore, StoreTransaction, REL_KIND_BULK};

use super::with_tx;

/// Runs `ops` create operations inside a single transaction.
///
/// Each step creates a node with probability 0.75 (always, while fewer than
/// four exist in this task) or wires two distinct task-local nodes with a
/// randomly directed edge. Created handles reach the shared pool only after
/// the transaction commits, as one batch.
pub fn run<S, R>(store: &S, pool: &EntityPool, ops: u32, rng: &mut R) -> Result<TaskMetrics>
where
    S: GraphStore,
    R: Rng,
{
    let started = Instant::now();
    let mut metrics = TaskMetrics::default();
    let mut created: Vec<EntityId> = Vec::new();

    with_tx(store, |tx| {
        for _ in 0..ops {
            if created.len() < 4 || rng.gen_bool(0.75) {
                created.push(tx.create_entity()?);
                metrics.writes += 1;
            } else {
                let one = rng.gen_range(0..created.len());
                let mut two = rng.gen_range(0..created.len());
                while two == one {
                    two = rng.gen_range(0..created.len());
                }
                let (from, to) = if rng.gen_bool(0.5) {
                    (created[one], created[two])
                } else {
                    (created[two], created[one])
                };
                tx.create_relationship(from, to, REL_KIND_BULK)?;
                metrics.reads += 2;
                metrics.writes += 1;
            }
        }
        Ok(())
    })?;

    pool.extend(created);
    metrics.elapsed_ms = started.elapsed().as_millis() as u64;
    Ok(metrics)
}
