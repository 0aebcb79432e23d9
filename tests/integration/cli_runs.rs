#![allow(missing_docs)]

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use tempfile::TempDir;

#[test]
fn smoke_run_appends_one_record() {
    let dir = TempDir::new().expect("tempdir");
    let stats = dir.path().join("ops-per-second");
    let chart = dir.path().join("chart.tsv");

    cargo_bin_cmd!("graphsoak")
        .args(["--duration-mins", "0", "--seed", "7", "--name", "smoke-1"])
        .args(["--log", "warn"])
        .arg("--stats-file")
        .arg(&stats)
        .arg("--chart-file")
        .arg(&chart)
        .assert()
        .success();

    let contents = fs::read_to_string(&stats).expect("stats file written");
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 1);
    let fields: Vec<&str> = lines[0].split('\t').collect();
    assert_eq!(fields.len(), 7);
    assert_eq!(fields[0], "smoke-1");
    for field in &fields[1..] {
        field.parse::<f64>().expect("numeric field");
    }
    assert!(chart.exists(), "chart dataset should be written");
}

#[test]
fn json_summary_is_well_formed() {
    let dir = TempDir::new().expect("tempdir");
    let stats = dir.path().join("ops-per-second");
    let chart = dir.path().join("chart.tsv");

    let output = cargo_bin_cmd!("graphsoak")
        .args(["--duration-mins", "0", "--seed", "7", "--json"])
        .args(["--log", "warn"])
        .arg("--stats-file")
        .arg(&stats)
        .arg("--chart-file")
        .arg(&chart)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(json["totals"]["tasks_executed"], 1);
    assert!(json["record"]["avg_reads"].is_number());
    assert!(json["record"]["avg_writes"].is_number());
    assert!(json["pool_size"].is_number());
}

#[test]
fn regression_against_seeded_history_exits_nonzero() {
    let dir = TempDir::new().expect("tempdir");
    let stats = dir.path().join("ops-per-second");
    // An unbeatable baseline guarantees the fresh run lags it.
    fs::write(&stats, "00-baseline\t1000000\t1000000\t0\t0\t0\t0\n").expect("seed history");

    cargo_bin_cmd!("graphsoak")
        .args(["--duration-mins", "0", "--name", "99-now"])
        .args(["--log", "warn"])
        .arg("--stats-file")
        .arg(&stats)
        .arg("--chart-file")
        .arg(dir.path().join("chart.tsv"))
        .assert()
        .code(1);
}
