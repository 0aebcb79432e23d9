//! Single-create: the bulk mix, one transaction per iteration.

use std::time::Instant;

use rand::Rng;

use crate::error::{Result, SoakError};
use crate::pool::EntityPool;
use crate::stats::TaskMetrics;
use crate::store::{EntityId, GraphStore, StoreTransaction, REL_KIND_GENERIC};

use super::with_tx;

const ENDPOINT_RETRIES: usize = 8;

/// Runs `ops` iterations, each in its own transaction.
///
/// Node creations publish their handle to the shared pool as soon as the
/// iteration commits. Relationship iterations draw both endpoints from the
/// shared pool by rotate-sampling, which leaves them pooled; when the pool
/// cannot supply two distinct endpoints the iteration falls back to creating
/// a node.
pub fn run<S, R>(store: &S, pool: &EntityPool, ops: u32, rng: &mut R) -> Result<TaskMetrics>
where
    S: GraphStore,
    R: Rng,
{
    let started = Instant::now();
    let mut metrics = TaskMetrics::default();

    for _ in 0..ops {
        let wants_relationship = !rng.gen_bool(0.75) && pool.len() >= 4;
        if wants_relationship {
            match sample_endpoints(pool, rng) {
                Ok((from, to)) => {
                    with_tx(store, |tx| {
                        tx.create_relationship(from, to, REL_KIND_GENERIC)?;
                        Ok(())
                    })?;
                    metrics.reads += 2;
                    metrics.writes += 1;
                    continue;
                }
                Err(SoakError::EmptyPool) => {
                    // Raced below the minimum; fall through to a create.
                }
                Err(err) => return Err(err),
            }
        }
        let id = with_tx(store, |tx| Ok(tx.create_entity()?))?;
        metrics.writes += 1;
        pool.push(id);
    }

    metrics.elapsed_ms = started.elapsed().as_millis() as u64;
    Ok(metrics)
}

/// Two distinct pooled handles via rotate-sampling.
fn sample_endpoints<R: Rng>(pool: &EntityPool, rng: &mut R) -> Result<(EntityId, EntityId)> {
    let span = pool.len().max(1);
    let from = pool.rotate_sample(rng.gen_range(0..span))?;
    for _ in 0..ENDPOINT_RETRIES {
        let to = pool.rotate_sample(rng.gen_range(0..span))?;
        if to != from {
            return Ok((from, to));
        }
    }
    Err(SoakError::EmptyPool)
}
