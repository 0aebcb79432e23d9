use std::io;

use thiserror::Error;

use crate::store::StoreError;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SoakError>;

/// Errors surfaced by the harness.
///
/// Store failures and `EmptyPool` abort a single task, never the run; the
/// driver collects them, logs, and keeps dispatching. `MalformedRecord` is
/// raised per history line and skipped by the loader.
#[derive(Debug, Error)]
pub enum SoakError {
    /// A store operation failed inside a transaction; the transaction rolled
    /// back and the task carrying it failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    /// An operation needed a live entity but the pool had none.
    #[error("entity pool is empty")]
    EmptyPool,
    /// A stats-history line did not match the tab-separated schema.
    #[error("malformed stats record: {line:?}")]
    MalformedRecord {
        /// The offending line, verbatim.
        line: String,
    },
    /// A submitted task failed to produce a result.
    #[error("task failed: {0}")]
    TaskFailure(String),
    /// An argument or configuration value was rejected.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// History file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
