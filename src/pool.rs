//! Shared pool of live entity handles.
//!
//! Every concurrently running worker enqueues freshly created entities here
//! and draws deletion targets and relationship endpoints from it. A single
//! mutex serializes structural changes, so each handle is observably either
//! in the pool or checked out by exactly one in-progress task.

use std::collections::VecDeque;

use parking_lot::Mutex;
use rand::Rng;

use crate::error::{Result, SoakError};
use crate::store::EntityId;

/// Thread-safe, FIFO-rotatable collection of live entity handles.
#[derive(Debug, Default)]
pub struct EntityPool {
    entries: Mutex<VecDeque<EntityId>>,
}

impl EntityPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one live handle.
    pub fn push(&self, handle: EntityId) {
        self.entries.lock().push_back(handle);
    }

    /// Adds a batch of live handles in one lock acquisition.
    pub fn extend<I>(&self, handles: I)
    where
        I: IntoIterator<Item = EntityId>,
    {
        self.entries.lock().extend(handles);
    }

    /// Removes and returns a handle chosen uniformly at random.
    ///
    /// The caller takes ownership: it must either push the handle back
    /// (entity still live) or drop it for good (entity deleted).
    pub fn pop_random<R: Rng>(&self, rng: &mut R) -> Result<EntityId> {
        let mut entries = self.entries.lock();
        if entries.is_empty() {
            return Err(SoakError::EmptyPool);
        }
        let index = rng.gen_range(0..entries.len());
        entries.swap_remove_back(index).ok_or(SoakError::EmptyPool)
    }

    /// Rotates the front `k % len` handles to the back and returns the new
    /// front, which stays in the pool.
    ///
    /// Approximately uniform selection over FIFO primitives; pool size is
    /// preserved exactly.
    pub fn rotate_sample(&self, k: usize) -> Result<EntityId> {
        let mut entries = self.entries.lock();
        if entries.is_empty() {
            return Err(SoakError::EmptyPool);
        }
        let len = entries.len();
        entries.rotate_left(k % len);
        entries.front().copied().ok_or(SoakError::EmptyPool)
    }

    /// Current number of pooled handles.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True when no handles are pooled.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
