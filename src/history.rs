//! Stats-file history: append, load, regression detection.
//!
//! The history file is append-only, one tab-separated record per line (the
//! [`StatsRecord::to_line`] format). Loading tolerates malformed lines so a
//! damaged or hand-edited history never blocks a run.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::stats::StatsRecord;

/// How many trailing records the chart dataset keeps.
pub const DRAW_WINDOW: usize = 10;

/// Appends one record to the history file, creating it if needed.
pub fn append(path: &Path, record: &StatsRecord) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", record.to_line())?;
    Ok(())
}

/// Loads the full history, keyed and ordered by run name.
///
/// Malformed lines are skipped with a debug log; blank lines are ignored. A
/// later record with a duplicate name replaces the earlier one.
pub fn load(path: &Path) -> Result<BTreeMap<String, StatsRecord>> {
    let file = File::open(path)?;
    let mut history = BTreeMap::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        match StatsRecord::parse(line) {
            Ok(record) => {
                history.insert(record.name.clone(), record);
            }
            Err(err) => debug!(%err, "skipping malformed stats line"),
        }
    }
    Ok(history)
}

/// A detected throughput regression: the latest run failed to clear an
/// earlier one by the configured margin.
#[derive(Debug, Clone)]
pub struct Regression {
    /// The earlier run the latest one lost to.
    pub earlier: StatsRecord,
    /// The latest run.
    pub latest: StatsRecord,
}

/// Compares the latest record against every earlier one.
///
/// The latest run must beat each earlier run's average read and write rates
/// by the threshold margin; the first earlier record satisfying
/// `earlier * (1 + threshold) > latest` on either rate is reported.
pub fn detect_regression(
    history: &BTreeMap<String, StatsRecord>,
    threshold: f64,
) -> Option<Regression> {
    if history.len() < 2 {
        return None;
    }
    let latest = history.values().last()?;
    let margin = 1.0 + threshold;
    for earlier in history.values().take(history.len() - 1) {
        if earlier.avg_reads * margin > latest.avg_reads
            || earlier.avg_writes * margin > latest.avg_writes
        {
            return Some(Regression {
                earlier: earlier.clone(),
                latest: latest.clone(),
            });
        }
    }
    None
}

/// The last `n` records in name order (the newest runs).
pub fn recent_window(
    history: &BTreeMap<String, StatsRecord>,
    n: usize,
) -> Vec<&StatsRecord> {
    let skip = history.len().saturating_sub(n);
    history.values().skip(skip).collect()
}

/// Writes the recent window as a TSV dataset for external plotting.
pub fn export_window(path: &Path, history: &BTreeMap<String, StatsRecord>) -> Result<()> {
    let mut file = File::create(path)?;
    for record in recent_window(history, DRAW_WINDOW) {
        writeln!(file, "{}", record.to_line())?;
    }
    Ok(())
}
