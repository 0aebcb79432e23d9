//! PropertyAdd: walk the pool and decorate an entity with a typed value.

use std::time::Instant;

use rand::Rng;

use crate::error::{Result, SoakError};
use crate::pool::EntityPool;
use crate::stats::TaskMetrics;
use crate::store::{GraphStore, StoreTransaction};

use super::{random_key, random_value, with_tx};

/// Runs `ops` property iterations, each in its own transaction.
///
/// Every iteration rotates a bounded number of steps through the pool,
/// settling on the last entity visited; the walk leaves the pool's contents
/// untouched. Half the iterations try to reuse a property key discovered on
/// the entities they pass (1 read when one turns up); the rest, and any
/// iteration whose target already carries the discovered key, synthesize a
/// fresh random key. One write per iteration.
pub fn run<S, R>(store: &S, pool: &EntityPool, ops: u32, rng: &mut R) -> Result<TaskMetrics>
where
    S: GraphStore,
    R: Rng,
{
    let started = Instant::now();
    let mut metrics = TaskMetrics::default();

    for _ in 0..ops {
        let len = pool.len();
        if len == 0 {
            return Err(SoakError::EmptyPool);
        }
        let offset = rng.gen_range(1..=len);
        let reuse = rng.gen_bool(0.5);

        with_tx(store, |tx| {
            let mut discovered: Option<String> = None;
            let mut target = pool.rotate_sample(1)?;
            for step in 0..offset {
                if step > 0 {
                    target = pool.rotate_sample(1)?;
                }
                if reuse && discovered.is_none() {
                    if let Some(key) = tx.entity_property_keys(target)?.into_iter().next() {
                        discovered = Some(key);
                        metrics.reads += 1;
                    }
                }
            }
            let key = match discovered {
                Some(key) if tx.entity_property(target, &key)?.is_none() => key,
                _ => random_key(rng),
            };
            tx.set_entity_property(target, &key, random_value(rng))?;
            metrics.writes += 1;
            Ok(())
        })?;
    }

    metrics.elapsed_ms = started.elapsed().as_millis() as u64;
    Ok(metrics)
}
