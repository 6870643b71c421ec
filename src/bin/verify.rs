//! Snapshot-stream checker for cowork-sim output.
//!
//! Reads an NDJSON snapshot file (default `snapshots.ndjson`), deserializes it
//! with the same `TickSnapshot` type the simulator writes, then prints:
//!   Tier 1 — PASS/FAIL per invariant
//!   Tier 2 — per-trial totals replayed from the stream

use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufRead, BufReader},
};

use anyhow::{Context, bail};
use cowork_sim::{
    analysis::{SnapshotViolation, verify_snapshots},
    events::TickSnapshot,
};

fn main() -> anyhow::Result<()> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "snapshots.ndjson".to_string());

    let file = File::open(&path).with_context(|| {
        format!("cannot open {path}; run `cowork-sim --snapshots {path}` first")
    })?;

    let mut snapshots: Vec<TickSnapshot> = Vec::new();
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("error reading line {}", line_no + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let snap = serde_json::from_str::<TickSnapshot>(&line)
            .with_context(|| format!("failed to deserialize line {}: {line}", line_no + 1))?;
        snapshots.push(snap);
    }

    // ── Tier 1: invariants ────────────────────────────────────────────────────
    let violations = verify_snapshots(&snapshots);
    let has = |f: fn(&SnapshotViolation) -> bool| violations.iter().any(f);

    fn status(fail: bool) -> &'static str {
        if fail { "FAIL" } else { "PASS" }
    }

    println!("=== Tier 1 — Snapshot Invariants ===");
    println!(
        "  [{}] Inv 1 — 0 ≤ occupancy ≤ capacity in every zone",
        status(has(|v| matches!(v, SnapshotViolation::OverCapacity { .. } | SnapshotViolation::ZoneShape { .. })))
    );
    println!(
        "  [{}] Inv 2 — served + unserved = arrivals, one stay per arrival",
        status(has(|v| matches!(v, SnapshotViolation::Conservation { .. })))
    );
    println!(
        "  [{}] Inv 3 — every stay ≥ 1 tick",
        status(has(|v| matches!(v, SnapshotViolation::ZeroStay { .. })))
    );
    println!(
        "  [{}] Inv 4 — ticks run 0, 1, 2, … within each trial",
        status(has(|v| matches!(v, SnapshotViolation::TickOrder { .. })))
    );
    println!(
        "  [{}] Inv 5 — cumulative counters match per-tick sums",
        status(has(|v| matches!(v, SnapshotViolation::CumulativeMismatch { .. })))
    );
    println!(
        "  [{}] Inv 6 — departures ≤ occupants present before the tick",
        status(has(|v| matches!(v, SnapshotViolation::DeparturesExceedOccupancy { .. })))
    );
    println!(
        "  [{}] Inv 7 — occupancy changes by exactly served − departures",
        status(has(|v| matches!(v, SnapshotViolation::OccupancyFlow { .. })))
    );

    if violations.is_empty() {
        println!("  All invariants PASS ({} snapshots checked)", snapshots.len());
    } else {
        println!("\n  {} violation(s) detected:", violations.len());
        for v in &violations {
            println!("    {v}");
        }
    }

    // ── Tier 2: per-trial totals ──────────────────────────────────────────────
    let mut per_trial: BTreeMap<u64, (u32, u64, u64)> = BTreeMap::new();
    for s in &snapshots {
        let entry = per_trial.entry(s.trial_index.0).or_default();
        entry.0 += 1;
        entry.1 = s.served_cumulative;
        entry.2 = s.unserved_cumulative;
    }

    println!("\n=== Tier 2 — Per-Trial Totals ===");
    println!("{:>5} | {:>5} | {:>8} | {:>9}", "Trial", "Ticks", "Served", "Unserved");
    println!("{}", "-".repeat(36));
    for (trial, (ticks, served, unserved)) in &per_trial {
        println!("{trial:>5} | {ticks:>5} | {served:>8} | {unserved:>9}");
    }
    if !per_trial.is_empty() {
        let n = per_trial.len() as f64;
        let avg_served = per_trial.values().map(|t| t.1).sum::<u64>() as f64 / n;
        let avg_unserved = per_trial.values().map(|t| t.2).sum::<u64>() as f64 / n;
        println!("\n  Average served:   {avg_served:.2}");
        println!("  Average unserved: {avg_unserved:.2}");
    }

    if !violations.is_empty() {
        bail!("{} invariant violation(s) in {path}", violations.len());
    }
    Ok(())
}
