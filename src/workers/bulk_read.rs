//! BulkRead: full-store scans, intentionally expensive and rare.

use std::time::Instant;

use crate::error::Result;
use crate::stats::TaskMetrics;
use crate::store::GraphStore;

/// Passes over the whole store per task.
const PASSES: usize = 10;

/// Scans every entity, its relationships, and all property key/value pairs
/// on both, ten times over. No transaction and no mutation; counts 1 read
/// per entity, 1 per relationship visit, and 2 per property (key + value).
/// Relationships are visited from both endpoints, so each contributes twice
/// per pass.
pub fn run<S: GraphStore>(store: &S) -> Result<TaskMetrics> {
    let started = Instant::now();
    let mut metrics = TaskMetrics::default();

    for _ in 0..PASSES {
        for entity in store.all_entities()? {
            metrics.reads += 1;
            for rel in store.relationships(entity)? {
                metrics.reads += 1;
                for key in store.relationship_property_keys(rel)? {
                    let _ = store.relationship_property(rel, &key)?;
                    metrics.reads += 2;
                }
            }
            for key in store.entity_property_keys(entity)? {
                let _ = store.entity_property(entity, &key)?;
                metrics.reads += 2;
            }
        }
    }

    metrics.elapsed_ms = started.elapsed().as_millis() as u64;
    Ok(metrics)
}
