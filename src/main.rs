use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cowork_sim::analysis::{self, CountDist, RunDistribution};
use cowork_sim::config::SimulationConfig;
use cowork_sim::events::{NdjsonSink, NullSink, SnapshotSink};
use cowork_sim::runner::{RunReport, TrialRunner};
use cowork_sim::scenario::ScenarioKind;

#[derive(Parser, Debug)]
#[command(name = "cowork-sim")]
#[command(about = "Simulate shared-workspace occupancy over many independent days", long_about = None)]
struct Args {
    /// JSON configuration file; flags below override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Demand scenario: capstone, rarely or normal
    #[arg(short, long)]
    scenario: Option<ScenarioKind>,

    /// Zone capacities, comma-separated (e.g. 45,20,10)
    #[arg(long, value_delimiter = ',')]
    zones: Option<Vec<u32>>,

    /// Opening hours per day (ticks per trial)
    #[arg(long)]
    hours: Option<u32>,

    /// Number of independent trials
    #[arg(short, long)]
    trials: Option<u64>,

    /// Base seed; trial i runs on seed + i
    #[arg(long)]
    seed: Option<u64>,

    /// Wall-clock hour of the first tick
    #[arg(long)]
    opening_hour: Option<u32>,

    /// Run trials on all cores
    #[arg(long)]
    parallel: bool,

    /// Write every per-tick snapshot to this NDJSON file
    #[arg(long)]
    snapshots: Option<PathBuf>,

    /// Only print the aggregate line
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn resolve_config(&self) -> anyhow::Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("failed to parse {}", path.display()))?
            }
            None => SimulationConfig::canonical(),
        };
        if let Some(s) = self.scenario {
            config.scenario = s;
        }
        if let Some(z) = &self.zones {
            config.zone_capacities = z.clone();
        }
        if let Some(h) = self.hours {
            config.horizon_ticks = h;
        }
        if let Some(t) = self.trials {
            config.num_trials = t;
        }
        if let Some(s) = self.seed {
            config.seed = Some(s);
        }
        if let Some(h) = self.opening_hour {
            config.opening_hour = h;
        }
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cowork_sim=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = args.resolve_config()?;
    let runner = TrialRunner::new(&config, config.scenario).context("invalid configuration")?;

    let report = match &args.snapshots {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let mut sink = NdjsonSink::new(BufWriter::new(file));
            let report = execute(&runner, args.parallel, &mut sink);
            let written = sink.written();
            let complete = close_snapshots(sink, path);
            if !args.quiet {
                let note = if complete { "" } else { " (incomplete)" };
                println!("Snapshots: {written} → {}{note}", path.display());
            }
            report
        }
        None => execute(&runner, args.parallel, &mut NullSink),
    };

    if args.quiet {
        println!(
            "avg_served={:.2} avg_unserved={:.2}",
            report.aggregate.avg_served, report.aggregate.avg_unserved
        );
    } else {
        print_report(&config, &report);
    }
    Ok(())
}

/// Flush the snapshot file. Returns whether every snapshot reached it; a
/// failure is logged and never touches the run's result.
fn close_snapshots<W: Write>(sink: NdjsonSink<W>, path: &Path) -> bool {
    let failed = sink.has_failed();
    match sink.finish() {
        Ok(_) if !failed => true,
        Ok(_) => {
            warn!(path = %path.display(), "snapshot output is incomplete");
            false
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to flush snapshot output");
            false
        }
    }
}

fn execute<S: SnapshotSink>(
    runner: &TrialRunner<'_, ScenarioKind>,
    parallel: bool,
    sink: &mut S,
) -> RunReport {
    if parallel { runner.run_parallel(sink) } else { runner.run(sink) }
}

fn print_report(config: &SimulationConfig, report: &RunReport) {
    println!("\n=== Configuration ===");
    println!("  Scenario:   {}", config.scenario);
    println!("  Zones:      {:?} (total {})", config.zone_capacities, config.total_capacity());
    println!(
        "  Hours:      {} ({} – {})",
        config.horizon_ticks,
        cowork_sim::types::Tick(0).hour_label(config.opening_hour),
        cowork_sim::types::Tick(config.horizon_ticks - 1).hour_label(config.opening_hour)
    );
    println!("  Trials:     {}", config.num_trials);
    println!("  Seed:       {}", report.seed);

    println!("\n=== Per-Trial Totals ===");
    println!(
        "{:>5} | {:>20} | {:>8} | {:>8} | {:>9} | {:>8}",
        "Trial", "Seed", "Arrived", "Served", "Unserved", "Service%"
    );
    println!("{}", "-".repeat(72));
    for t in &report.trials {
        println!(
            "{:>5} | {:>20} | {:>8} | {:>8} | {:>9} | {:>7.1}%",
            t.index.0,
            t.seed,
            t.totals.arrivals_total,
            t.totals.served_total,
            t.totals.unserved_total,
            t.totals.service_rate() * 100.0,
        );
    }

    if let Some(dist) = analysis::analyse_trials(&report.trials) {
        print_distribution(&dist, report.trials.len());
    }

    if let Some(last) = &report.last_trial {
        println!("\n=== Final Trial at Closing (diagnostic) ===");
        for (i, zone) in last.zones.zones().iter().enumerate() {
            println!("  Zone {}: {:>3}/{:<3}", i + 1, zone.occupancy, zone.capacity);
        }
        println!("  Still inside: {}", last.ledger.len());
    }

    println!("\n=== Aggregate ===");
    println!("  Average served:   {:.2}", report.aggregate.avg_served);
    println!("  Average unserved: {:.2}", report.aggregate.avg_unserved);
}

fn print_count_row(name: &str, ds: &CountDist) {
    println!(
        "{:>9} | {:>7} | {:>7} | {:>7} | {:>7} | {:>8.1}",
        name, ds.min, ds.p50, ds.p95, ds.max, ds.mean
    );
}

fn print_distribution(dist: &RunDistribution, n: usize) {
    println!("\n=== Cross-Trial Distribution (N={n}) ===");
    println!(
        "{:>9} | {:>7} | {:>7} | {:>7} | {:>7} | {:>8}",
        "Metric", "min", "p50", "p95", "max", "mean"
    );
    print_count_row("Served", &dist.served);
    print_count_row("Unserved", &dist.unserved);

    let r = &dist.service_rate;
    println!(
        "\n  Service rate: min {:.1}%  p5 {:.1}%  p50 {:.1}%  p95 {:.1}%  max {:.1}%  mean {:.1}% ± {:.1}",
        r.min * 100.0,
        r.p5 * 100.0,
        r.p50 * 100.0,
        r.p95 * 100.0,
        r.max * 100.0,
        r.mean * 100.0,
        r.std_dev * 100.0,
    );
    if n < 2 {
        eprintln!("Warning: Distribution requires >= 2 trials");
    }

    println!("\n--- Mean peak occupancy ---");
    for (i, peak) in dist.mean_peak_occupancy.iter().enumerate() {
        println!("  Zone {}: {peak:.1}", i + 1);
    }
}
