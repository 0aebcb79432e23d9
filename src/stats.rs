//! Result vectors, run totals, and the per-run stats record.

use serde::Serialize;

use crate::error::SoakError;

/// What one completed task did: counts plus wall-clock duration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskMetrics {
    /// Store read operations performed.
    pub reads: u64,
    /// Store write operations performed.
    pub writes: u64,
    /// Task wall-clock duration in milliseconds.
    pub elapsed_ms: u64,
}

/// Aggregation class of a worker kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskCategory {
    /// Short transactional tasks (create, delete, property-add).
    Simple,
    /// Long scanning/batching tasks (bulk-create, bulk-read); the only ones
    /// eligible for the sustained maxima.
    Bulk,
}

/// Running aggregate over all successfully completed tasks.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RunTotals {
    /// Sum of reads across folded tasks.
    pub total_reads: u64,
    /// Sum of writes across folded tasks.
    pub total_writes: u64,
    /// Sum of task durations in milliseconds.
    pub total_elapsed_ms: u64,
    /// Successfully folded tasks.
    pub tasks_executed: u64,
    /// Tasks that failed and were excluded from the sums.
    pub tasks_failed: u64,
    /// Highest per-task read rate among peak-eligible tasks.
    pub peak_reads: f64,
    /// Highest per-task write rate among peak-eligible tasks.
    pub peak_writes: f64,
    /// Highest per-task read rate among sustained-eligible bulk tasks.
    pub sustained_reads: f64,
    /// Highest per-task write rate among sustained-eligible bulk tasks.
    pub sustained_writes: f64,
}

impl RunTotals {
    /// Average reads per millisecond over the whole run. Always finite.
    pub fn avg_reads(&self) -> f64 {
        self.total_reads as f64 / self.total_elapsed_ms.max(1) as f64
    }

    /// Average writes per millisecond over the whole run. Always finite.
    pub fn avg_writes(&self) -> f64 {
        self.total_writes as f64 / self.total_elapsed_ms.max(1) as f64
    }
}

/// Folds completed tasks' metrics into [`RunTotals`].
///
/// Peak and sustained maxima are judged against the running mean task
/// duration *at fold time* (including the task being folded), so they are
/// order-dependent: folding the same set of metrics in a different order may
/// yield different maxima. The sums and counters are order-independent.
#[derive(Debug, Default)]
pub struct Aggregator {
    totals: RunTotals,
}

impl Aggregator {
    /// Creates an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one completed task.
    pub fn fold(&mut self, category: TaskCategory, metrics: TaskMetrics) {
        let totals = &mut self.totals;
        totals.total_reads += metrics.reads;
        totals.total_writes += metrics.writes;
        totals.total_elapsed_ms += metrics.elapsed_ms;
        totals.tasks_executed += 1;

        let this_reads = metrics.reads as f64 / metrics.elapsed_ms.max(1) as f64;
        let this_writes = metrics.writes as f64 / metrics.elapsed_ms.max(1) as f64;
        let elapsed = metrics.elapsed_ms as f64;
        // Running mean after the sums above, so it includes this task.
        let mean_ms = totals.total_elapsed_ms as f64 / totals.tasks_executed as f64;

        if category == TaskCategory::Bulk && elapsed > mean_ms * 0.5 {
            totals.sustained_reads = totals.sustained_reads.max(this_reads);
            totals.sustained_writes = totals.sustained_writes.max(this_writes);
        }
        if elapsed > mean_ms * 0.1 {
            totals.peak_reads = totals.peak_reads.max(this_reads);
            totals.peak_writes = totals.peak_writes.max(this_writes);
        }
    }

    /// Records a failed task; nothing is folded.
    pub fn record_failure(&mut self) {
        self.totals.tasks_failed += 1;
    }

    /// Current totals.
    pub fn totals(&self) -> &RunTotals {
        &self.totals
    }

    /// Consumes the aggregator, yielding the final totals.
    pub fn into_totals(self) -> RunTotals {
        self.totals
    }
}

/// Durable summary of one run, one line in the stats history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsRecord {
    /// Run identifier, typically a timestamp; history is ordered by it.
    pub name: String,
    /// Average reads per millisecond.
    pub avg_reads: f64,
    /// Average writes per millisecond.
    pub avg_writes: f64,
    /// Peak read rate among duration-eligible tasks.
    pub peak_reads: f64,
    /// Peak write rate.
    pub peak_writes: f64,
    /// Sustained read rate (bulk tasks only).
    pub sustained_reads: f64,
    /// Sustained write rate.
    pub sustained_writes: f64,
}

impl StatsRecord {
    /// Builds the record for a finished run.
    pub fn from_totals(name: impl Into<String>, totals: &RunTotals) -> Self {
        Self {
            name: name.into(),
            avg_reads: totals.avg_reads(),
            avg_writes: totals.avg_writes(),
            peak_reads: totals.peak_reads,
            peak_writes: totals.peak_writes,
            sustained_reads: totals.sustained_reads,
            sustained_writes: totals.sustained_writes,
        }
    }

    /// Serializes to one tab-separated history line (no trailing newline).
    ///
    /// Floats use `Display`, which round-trips exactly through
    /// [`StatsRecord::parse`].
    pub fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.name,
            self.avg_reads,
            self.avg_writes,
            self.peak_reads,
            self.peak_writes,
            self.sustained_reads,
            self.sustained_writes
        )
    }

    /// Parses one history line.
    ///
    /// Requires at least five tab-separated tokens (name plus the four
    /// avg/peak fields); the two sustained fields default to zero when the
    /// line predates them. Any unparsable numeric field rejects the line.
    pub fn parse(line: &str) -> Result<Self, SoakError> {
        let malformed = || SoakError::MalformedRecord { line: line.into() };
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 5 {
            return Err(malformed());
        }
        let number = |token: &str| token.parse::<f64>().map_err(|_| malformed());
        let optional = |token: Option<&&str>| token.map_or(Ok(0.0), |t| number(t));
        Ok(Self {
            name: fields[0].to_owned(),
            avg_reads: number(fields[1])?,
            avg_writes: number(fields[2])?,
            peak_reads: number(fields[3])?,
            peak_writes: number(fields[4])?,
            sustained_reads: optional(fields.get(5))?,
            sustained_writes: optional(fields.get(6))?,
        })
    }
}

/// Everything the binary reports after a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// The record appended to history.
    pub record: StatsRecord,
    /// Raw totals behind the record.
    pub totals: RunTotals,
    /// Entity pool size when the run finished.
    pub pool_size: usize,
}

impl RunSummary {
    /// Assembles the summary for a finished run.
    pub fn new(name: impl Into<String>, totals: RunTotals, pool_size: usize) -> Self {
        Self {
            record: StatsRecord::from_totals(name, &totals),
            totals,
            pool_size,
        }
    }
}
