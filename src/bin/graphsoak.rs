//! Soak-run binary over the bundled in-memory store.
//!
//! Runs one mixed workload, appends the run's record to the stats history,
//! rewrites the chart dataset, and exits nonzero when the run's average
//! rates regress against an earlier recorded run.
//!
//! ```bash
//! # One-minute soak, default files
//! cargo run --release --bin graphsoak
//!
//! # Replayable five-minute soak with a named record
//! cargo run --release --bin graphsoak -- \
//!   --duration-mins 5 --seed 42 --name nightly
//! ```

use std::io::IsTerminal;
use std::path::PathBuf;

use chrono::Utc;
use clap::Parser;
use nu_ansi_term::Color;

use graphsoak::history::{self, Regression};
use graphsoak::logging::init_logging;
use graphsoak::stats::RunSummary;
use graphsoak::store::MemoryStore;
use graphsoak::{LoadDriver, RunConfig, WorkloadMix};

#[derive(Parser, Debug)]
#[command(
    name = "graphsoak",
    version,
    about = "Mixed-workload soak harness for the bundled graph store"
)]
struct Args {
    /// Run duration in minutes. Zero still seeds, drains, and records.
    #[arg(long, default_value_t = 1)]
    duration_mins: u64,

    /// Regression alarm threshold, as a fraction of an earlier run's rate.
    #[arg(long, default_value_t = 0.05)]
    threshold: f64,

    /// History file; one tab-separated record is appended per run.
    #[arg(long, default_value = "ops-per-second")]
    stats_file: PathBuf,

    /// TSV dataset of the most recent runs, for external plotting.
    #[arg(long, default_value = "chart.tsv")]
    chart_file: PathBuf,

    /// Dispatch RNG seed for a replayable run; defaults to OS entropy.
    #[arg(long)]
    seed: Option<u64>,

    /// Record name; defaults to the UTC start time as MM-dd-HH-mm.
    #[arg(long)]
    name: Option<String>,

    /// Emit the run summary as JSON instead of the table.
    #[arg(long)]
    json: bool,

    /// Log filter directive.
    #[arg(long, default_value = "info", env = "GRAPHSOAK_LOG")]
    log: String,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("graphsoak failed: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(&args.log)?;

    let name = args
        .name
        .clone()
        .unwrap_or_else(|| Utc::now().format("%m-%d-%H-%M").to_string());

    let run_config = RunConfig {
        rng_seed: args.seed,
        ..RunConfig::minutes(args.duration_mins)
    };

    let mut driver = LoadDriver::new(MemoryStore::new(), run_config, WorkloadMix::default());
    #[cfg(unix)]
    signal_hook::flag::register(signal_hook::consts::SIGUSR2, driver.dump_flag())?;

    let totals = driver.run()?;
    let summary = RunSummary::new(name, totals, driver.pool_size());

    history::append(&args.stats_file, &summary.record)?;
    let history = history::load(&args.stats_file)?;
    history::export_window(&args.chart_file, &history)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_report(&summary);
    }

    if let Some(regression) = history::detect_regression(&history, args.threshold) {
        report_regression(&regression, args.threshold, args.json);
        std::process::exit(1);
    }
    Ok(())
}

fn print_report(summary: &RunSummary) {
    let totals = &summary.totals;
    println!("\n=== Soak Run {} ===", summary.record.name);
    println!("Tasks Executed:       {}", totals.tasks_executed);
    println!("Tasks Failed:         {}", totals.tasks_failed);
    println!("Total Reads:          {}", totals.total_reads);
    println!("Total Writes:         {}", totals.total_writes);
    println!("Task Time (ms):       {}", totals.total_elapsed_ms);
    println!("Avg Reads/ms:         {:.3}", totals.avg_reads());
    println!("Avg Writes/ms:        {:.3}", totals.avg_writes());
    println!("Peak Reads/ms:        {:.3}", totals.peak_reads);
    println!("Peak Writes/ms:       {:.3}", totals.peak_writes);
    println!("Sustained Reads/ms:   {:.3}", totals.sustained_reads);
    println!("Sustained Writes/ms:  {:.3}", totals.sustained_writes);
    println!("Entity Pool Size:     {}", summary.pool_size);
}

fn report_regression(regression: &Regression, threshold: f64, json: bool) {
    let message = format!(
        "throughput regression: run {} (reads {:.3}/ms, writes {:.3}/ms) fell below run {} (reads {:.3}/ms, writes {:.3}/ms) plus the {:.0}% margin",
        regression.latest.name,
        regression.latest.avg_reads,
        regression.latest.avg_writes,
        regression.earlier.name,
        regression.earlier.avg_reads,
        regression.earlier.avg_writes,
        threshold * 100.0,
    );
    if json {
        eprintln!("{message}");
    } else if std::io::stdout().is_terminal() {
        println!("{}", Color::Red.bold().paint(&message));
    } else {
        println!("{message}");
    }
}
