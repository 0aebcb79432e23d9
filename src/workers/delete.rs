//! Delete: unlink-then-remove entities, or prune a single relationship.

use std::time::Instant;

use rand::Rng;

use crate::error::Result;
use crate::pool::EntityPool;
use crate::stats::TaskMetrics;
use crate::store::{GraphStore, StoreTransaction};

use super::with_tx;

/// What a single delete iteration goes after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeleteTarget {
    /// Pop an entity from the pool, detach every relationship, remove it.
    Entity,
    /// Rotate to an anchor entity and remove one of its relationships.
    Relationship,
}

/// Runs `ops` delete iterations, each in its own transaction.
///
/// Entity deletes take ownership of the popped handle; it only returns to
/// the pool if the transaction fails. Relationship deletes leave the anchor
/// pooled, and an anchor without relationships is a counted no-op.
pub fn run<S, R>(store: &S, pool: &EntityPool, ops: u32, rng: &mut R) -> Result<TaskMetrics>
where
    S: GraphStore,
    R: Rng,
{
    let started = Instant::now();
    let mut metrics = TaskMetrics::default();

    for _ in 0..ops {
        let target = if rng.gen_bool(0.6) {
            DeleteTarget::Entity
        } else {
            DeleteTarget::Relationship
        };
        match target {
            DeleteTarget::Entity => {
                let victim = pool.pop_random(rng)?;
                let outcome = with_tx(store, |tx| {
                    for rel in tx.relationships(victim)? {
                        tx.delete_relationship(rel)?;
                        metrics.reads += 1;
                        metrics.writes += 1;
                    }
                    tx.delete_entity(victim)?;
                    Ok(())
                });
                if let Err(err) = outcome {
                    pool.push(victim);
                    return Err(err);
                }
                metrics.reads += 1;
                metrics.writes += 1;
            }
            DeleteTarget::Relationship => {
                let span = pool.len().max(1);
                let anchor = pool.rotate_sample(rng.gen_range(0..span))?;
                let pruned = with_tx(store, |tx| {
                    let rels = tx.relationships(anchor)?;
                    if rels.is_empty() {
                        return Ok(false);
                    }
                    let rel = rels[rng.gen_range(0..rels.len())];
                    tx.delete_relationship(rel)?;
                    Ok(true)
                })?;
                if pruned {
                    metrics.reads += 1;
                    metrics.writes += 1;
                }
            }
        }
    }

    metrics.elapsed_ms = started.elapsed().as_millis() as u64;
    Ok(metrics)
}
