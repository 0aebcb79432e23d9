//! Mixed-workload soak harness for an embedded graph store.
//!
//! The harness seeds a store with one synchronous bulk-create, then drives
//! it with five probabilistically dispatched task kinds (bulk create, bulk
//! read, create, delete, property add) on a fixed worker-thread pool. Each
//! completed task's read/write counts and duration fold into run totals;
//! a finished run becomes one tab-separated line in a history file, which
//! is then checked for throughput regressions against earlier runs.
//!
//! [`driver::LoadDriver`] owns a run end to end; [`store::MemoryStore`] is
//! the bundled store implementation the binary soaks.

#![warn(missing_docs)]

pub mod config;
pub mod driver;
pub mod error;
pub mod history;
pub mod logging;
pub mod pool;
pub mod stats;
pub mod store;
pub mod task_pool;
pub mod workers;

pub use config::{RunConfig, WorkloadMix};
pub use driver::{DriverState, LoadDriver};
pub use error::{Result, SoakError};
pub use history::{detect_regression, Regression};
pub use pool::EntityPool;
pub use stats::{RunSummary, RunTotals, StatsRecord};
pub use store::{GraphStore, MemoryStore, StoreTransaction};
pub use workers::WorkerKind;
