//! History file round-trips, malformed-line tolerance, and regression
//! detection over reloaded histories.

use std::fs;

use proptest::prelude::*;

use graphsoak::history::{self, DRAW_WINDOW};
use graphsoak::{Result, StatsRecord};

fn record(name: &str, avg_reads: f64, avg_writes: f64) -> StatsRecord {
    StatsRecord {
        name: name.to_owned(),
        avg_reads,
        avg_writes,
        peak_reads: avg_reads * 2.0,
        peak_writes: avg_writes * 2.0,
        sustained_reads: avg_reads * 1.5,
        sustained_writes: avg_writes * 1.5,
    }
}

#[test]
fn appended_records_load_back_with_malformed_lines_skipped() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("ops-per-second");

    history::append(&path, &record("run-1", 10.25, 4.5))?;
    // Interleave garbage the loader must tolerate.
    let mut raw = fs::read_to_string(&path)?;
    raw.push_str("run1\t1.0\t2.0\n");
    raw.push_str("bad\tx\ty\tz\tw\n");
    raw.push('\n');
    fs::write(&path, raw)?;
    history::append(&path, &record("run-2", 11.0, 5.0))?;

    let history = history::load(&path)?;
    assert_eq!(history.len(), 2);
    assert_eq!(history["run-1"], record("run-1", 10.25, 4.5));
    assert_eq!(history["run-2"], record("run-2", 11.0, 5.0));
    Ok(())
}

#[test]
fn legacy_five_field_lines_load_with_zero_sustained() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("ops-per-second");
    fs::write(&path, "old-run\t1.5\t0.75\t3\t1.5\n")?;

    let history = history::load(&path)?;
    let old = &history["old-run"];
    assert_eq!(old.avg_reads, 1.5);
    assert_eq!(old.avg_writes, 0.75);
    assert_eq!(old.peak_reads, 3.0);
    assert_eq!(old.peak_writes, 1.5);
    assert_eq!(old.sustained_reads, 0.0);
    assert_eq!(old.sustained_writes, 0.0);
    Ok(())
}

#[test]
fn regression_verdict_follows_the_history_as_it_grows() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("ops-per-second");
    history::append(&path, &record("04-01-10-00", 10.0, 10.0))?;
    history::append(&path, &record("04-02-10-00", 12.0, 12.0))?;
    history::append(&path, &record("04-03-10-00", 11.0, 11.0))?;

    // 11.0 does not clear 12.0 plus the 5% margin.
    let history = history::load(&path)?;
    let regression = history::detect_regression(&history, 0.05).expect("run 3 lags run 2");
    assert_eq!(regression.earlier.name, "04-02-10-00");
    assert_eq!(regression.latest.name, "04-03-10-00");

    // A strong fourth run clears every earlier record.
    history::append(&path, &record("04-04-10-00", 13.0, 13.0))?;
    let history = history::load(&path)?;
    assert!(history::detect_regression(&history, 0.05).is_none());
    Ok(())
}

proptest! {
    #[test]
    fn every_valid_record_survives_the_line_format(
        name in "[A-Za-z0-9._-]{1,24}",
        avg_reads in 0.0..1.0e12f64,
        avg_writes in 0.0..1.0e12f64,
        peak_reads in 0.0..1.0e12f64,
        peak_writes in 0.0..1.0e12f64,
        sustained_reads in 0.0..1.0e12f64,
        sustained_writes in 0.0..1.0e12f64,
    ) {
        let record = StatsRecord {
            name,
            avg_reads,
            avg_writes,
            peak_reads,
            peak_writes,
            sustained_reads,
            sustained_writes,
        };
        let parsed = StatsRecord::parse(&record.to_line());
        prop_assert!(parsed.is_ok(), "round-trip rejected: {:?}", parsed);
        prop_assert_eq!(parsed.ok(), Some(record));
    }
}

#[test]
fn chart_dataset_keeps_the_newest_window() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let stats = dir.path().join("ops-per-second");
    for i in 0..(DRAW_WINDOW + 4) {
        history::append(&stats, &record(&format!("run-{i:02}"), i as f64, 1.0))?;
    }
    let history = history::load(&stats)?;

    let chart = dir.path().join("chart.tsv");
    history::export_window(&chart, &history)?;

    let contents = fs::read_to_string(&chart)?;
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), DRAW_WINDOW);
    assert!(lines[0].starts_with("run-04\t"));
    assert!(lines[DRAW_WINDOW - 1].starts_with("run-13\t"));
    Ok(())
}
