//! The five task kinds the driver dispatches.
//!
//! Each worker is a synchronous function over the store, the shared entity
//! pool, an operation budget, and a seeded RNG, returning the task's
//! [`TaskMetrics`](crate::stats::TaskMetrics). Store failures roll back the
//! surrounding transaction and fail the task; the driver tolerates that.

pub mod bulk_create;
pub mod bulk_read;
pub mod create;
pub mod delete;
pub mod property;

use rand::Rng;
use tracing::warn;

use crate::error::Result;
use crate::stats::TaskCategory;
use crate::store::{GraphStore, PropertyValue, StoreTransaction};

/// Worker kinds the driver can submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerKind {
    /// One big transaction creating nodes and edges over a task-local set.
    BulkCreate,
    /// Full-store scan, ten passes, read-only.
    BulkRead,
    /// Per-iteration transactions creating nodes and pool-endpoint edges.
    Create,
    /// Per-iteration transactions deleting entities or relationships.
    Delete,
    /// Per-iteration transactions writing randomly-typed properties.
    PropertyAdd,
}

impl WorkerKind {
    /// Aggregation class: bulk kinds feed the sustained maxima.
    pub fn category(self) -> TaskCategory {
        match self {
            WorkerKind::BulkCreate | WorkerKind::BulkRead => TaskCategory::Bulk,
            WorkerKind::Create | WorkerKind::Delete | WorkerKind::PropertyAdd => {
                TaskCategory::Simple
            }
        }
    }

    /// Stable name for logs.
    pub fn label(self) -> &'static str {
        match self {
            WorkerKind::BulkCreate => "bulk-create",
            WorkerKind::BulkRead => "bulk-read",
            WorkerKind::Create => "create",
            WorkerKind::Delete => "delete",
            WorkerKind::PropertyAdd => "property-add",
        }
    }
}

/// Runs `body` inside one transaction: commit on success, roll back and
/// propagate on failure.
pub(crate) fn with_tx<S, T, F>(store: &S, body: F) -> Result<T>
where
    S: GraphStore,
    F: FnOnce(&mut S::Tx) -> Result<T>,
{
    let mut tx = store.begin()?;
    match body(&mut tx) {
        Ok(value) => {
            tx.commit()?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback() {
                warn!(%rollback_err, "transaction rollback failed");
            }
            Err(err)
        }
    }
}

const SYMBOLS: &[u8] = b"1234567890!@#$%^&*()qwertyuiopasdfghjklQWERTYUIOPASDFGHJKLzxcvbnmZXCVBNM";

/// Random string of up to `max_len` symbols from the fixed alphabet.
pub(crate) fn random_string<R: Rng>(rng: &mut R, max_len: usize) -> String {
    let len = rng.gen_range(0..max_len);
    (0..len)
        .map(|_| SYMBOLS[rng.gen_range(0..SYMBOLS.len())] as char)
        .collect()
}

/// Fresh property key, collision-free for all practical purposes.
pub(crate) fn random_key<R: Rng>(rng: &mut R) -> String {
    format!("{:032x}", rng.gen::<u128>())
}

/// One randomly-typed property value; every variant is reachable.
pub(crate) fn random_value<R: Rng>(rng: &mut R) -> PropertyValue {
    match rng.gen_range(0..5) {
        0 => PropertyValue::Int(rng.gen()),
        1 => PropertyValue::Long(rng.gen()),
        2 => PropertyValue::Bool(rng.gen()),
        3 => PropertyValue::Text(random_string(rng, 50)),
        _ => PropertyValue::TextList(vec![
            random_string(rng, 20),
            String::new(),
            random_string(rng, 20),
        ]),
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn every_value_variant_is_reachable() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut seen = [false; 5];
        for _ in 0..500 {
            let slot = match random_value(&mut rng) {
                PropertyValue::Int(_) => 0,
                PropertyValue::Long(_) => 1,
                PropertyValue::Bool(_) => 2,
                PropertyValue::Text(_) => 3,
                PropertyValue::TextList(_) => 4,
            };
            seen[slot] = true;
        }
        assert_eq!(seen, [true; 5]);
    }

    #[test]
    fn strings_stay_inside_the_alphabet_and_limit() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let s = random_string(&mut rng, 50);
            assert!(s.len() < 50);
            assert!(s.bytes().all(|b| SYMBOLS.contains(&b)));
        }
    }

    #[test]
    fn list_values_keep_the_three_element_shape() {
        let mut rng = StdRng::seed_from_u64(3);
        loop {
            if let PropertyValue::TextList(items) = random_value(&mut rng) {
                assert_eq!(items.len(), 3);
                assert!(items[1].is_empty());
                break;
            }
        }
    }

    #[test]
    fn categories_split_bulk_from_simple() {
        assert_eq!(WorkerKind::BulkCreate.category(), TaskCategory::Bulk);
        assert_eq!(WorkerKind::BulkRead.category(), TaskCategory::Bulk);
        assert_eq!(WorkerKind::Create.category(), TaskCategory::Simple);
        assert_eq!(WorkerKind::Delete.category(), TaskCategory::Simple);
        assert_eq!(WorkerKind::PropertyAdd.category(), TaskCategory::Simple);
    }
}
