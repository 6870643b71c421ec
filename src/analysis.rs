use std::fmt;

use crate::events::TickSnapshot;
use crate::simulation::TrialSummary;

/// Spread of a per-trial head count (served or unserved arrivals).
#[derive(Debug, Clone, PartialEq)]
pub struct CountDist {
    pub n: usize,
    pub min: u64,
    pub p50: u64,
    pub p95: u64,
    pub max: u64,
    pub mean: f64,
}

/// Spread of a per-trial fraction such as the service rate.
#[derive(Debug, Clone, PartialEq)]
pub struct RateDist {
    pub n: usize,
    pub min: f64,
    pub p5: f64,
    pub p50: f64,
    pub p95: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

/// Cross-trial spread of the per-trial totals.
#[derive(Debug, Clone, PartialEq)]
pub struct RunDistribution {
    pub served: CountDist,
    pub unserved: CountDist,
    pub service_rate: RateDist,
    /// Per zone: peak occupancy averaged over trials.
    pub mean_peak_occupancy: Vec<f64>,
}

/// Linear interpolation between closest ranks. `sorted` must be non-empty.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let h = p * (sorted.len() - 1) as f64;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    let frac = h - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Head counts summarised with percentiles rounded to whole arrivals.
pub fn count_dist(values: &[u64]) -> Option<CountDist> {
    let mut sorted: Vec<f64> = values.iter().map(|&v| v as f64).collect();
    sorted.sort_by(f64::total_cmp);
    let (&min, &max) = (values.iter().min()?, values.iter().max()?);
    Some(CountDist {
        n: values.len(),
        min,
        p50: percentile(&sorted, 0.50).round() as u64,
        p95: percentile(&sorted, 0.95).round() as u64,
        max,
        mean: sorted.iter().sum::<f64>() / sorted.len() as f64,
    })
}

/// Fractions summarised with sample standard deviation; NaNs sort last.
pub fn rate_dist(values: &[f64]) -> Option<RateDist> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    let mean = sorted.iter().sum::<f64>() / n as f64;
    let std_dev = if n > 1 {
        (sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64).sqrt()
    } else {
        0.0
    };
    Some(RateDist {
        n,
        min: sorted[0],
        p5: percentile(&sorted, 0.05),
        p50: percentile(&sorted, 0.50),
        p95: percentile(&sorted, 0.95),
        max: sorted[n - 1],
        mean,
        std_dev,
    })
}

/// Summarise a run's trials. `None` when there are no trials.
pub fn analyse_trials(trials: &[TrialSummary]) -> Option<RunDistribution> {
    let served: Vec<u64> = trials.iter().map(|t| t.totals.served_total).collect();
    let unserved: Vec<u64> = trials.iter().map(|t| t.totals.unserved_total).collect();
    let rate: Vec<f64> = trials.iter().map(|t| t.totals.service_rate()).collect();

    let zones = trials.iter().map(|t| t.peak_occupancy.len()).max().unwrap_or(0);
    let mean_peak_occupancy = (0..zones)
        .map(|z| {
            let sum: u64 = trials
                .iter()
                .map(|t| t.peak_occupancy.get(z).copied().unwrap_or(0) as u64)
                .sum();
            sum as f64 / trials.len() as f64
        })
        .collect();

    Some(RunDistribution {
        served: count_dist(&served)?,
        unserved: count_dist(&unserved)?,
        service_rate: rate_dist(&rate)?,
        mean_peak_occupancy,
    })
}

/// An inconsistency found while replaying a snapshot stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotViolation {
    /// Occupancy and capacity vectors disagree in length.
    ZoneShape { trial: u64, tick: u32 },
    OverCapacity { trial: u64, tick: u32, zone: usize, occupancy: u32, capacity: u32 },
    /// served + unserved ≠ arrivals, or one stay per arrival not respected.
    Conservation { trial: u64, tick: u32, detail: String },
    ZeroStay { trial: u64, tick: u32 },
    /// Ticks within a trial must run 0, 1, 2, … without gaps.
    TickOrder { trial: u64, expected: u32, actual: u32 },
    CumulativeMismatch { trial: u64, tick: u32, detail: String },
    /// More departures than occupants present at the start of the tick.
    DeparturesExceedOccupancy { trial: u64, tick: u32, departures: u32, present: u64 },
    /// Occupancy did not move by exactly served − departures.
    OccupancyFlow { trial: u64, tick: u32, expected: u64, actual: u64 },
}

impl fmt::Display for SnapshotViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZoneShape { trial, tick } => {
                write!(f, "ZoneShape trial={trial} tick={tick}")
            }
            Self::OverCapacity { trial, tick, zone, occupancy, capacity } => {
                write!(f, "OverCapacity trial={trial} tick={tick} zone={zone}: {occupancy}/{capacity}")
            }
            Self::Conservation { trial, tick, detail } => {
                write!(f, "Conservation trial={trial} tick={tick}: {detail}")
            }
            Self::ZeroStay { trial, tick } => write!(f, "ZeroStay trial={trial} tick={tick}"),
            Self::TickOrder { trial, expected, actual } => {
                write!(f, "TickOrder trial={trial}: expected={expected} actual={actual}")
            }
            Self::CumulativeMismatch { trial, tick, detail } => {
                write!(f, "CumulativeMismatch trial={trial} tick={tick}: {detail}")
            }
            Self::DeparturesExceedOccupancy { trial, tick, departures, present } => {
                write!(f, "DeparturesExceedOccupancy trial={trial} tick={tick}: departures={departures} present={present}")
            }
            Self::OccupancyFlow { trial, tick, expected, actual } => {
                write!(f, "OccupancyFlow trial={trial} tick={tick}: expected={expected} actual={actual}")
            }
        }
    }
}

/// Replay a snapshot stream (as written to NDJSON) and report every broken
/// invariant. A change of `trial_index` starts a fresh trial.
pub fn verify_snapshots(snapshots: &[TickSnapshot]) -> Vec<SnapshotViolation> {
    let mut violations = Vec::new();

    let mut current_trial: Option<u64> = None;
    let mut expected_tick = 0u32;
    let mut served_sum = 0u64;
    let mut unserved_sum = 0u64;
    let mut present = 0u64;

    for s in snapshots {
        let trial = s.trial_index.0;
        let tick = s.tick_index.0;

        if current_trial != Some(trial) {
            current_trial = Some(trial);
            expected_tick = 0;
            served_sum = 0;
            unserved_sum = 0;
            present = 0;
        }

        if tick != expected_tick {
            violations.push(SnapshotViolation::TickOrder { trial, expected: expected_tick, actual: tick });
        }
        expected_tick = tick.saturating_add(1);

        if s.zone_occupancies.len() != s.zone_capacities.len() {
            violations.push(SnapshotViolation::ZoneShape { trial, tick });
        }
        for (zone, (&occupancy, &capacity)) in
            s.zone_occupancies.iter().zip(&s.zone_capacities).enumerate()
        {
            if occupancy > capacity {
                violations.push(SnapshotViolation::OverCapacity { trial, tick, zone, occupancy, capacity });
            }
        }

        if s.served as u64 + s.unserved as u64 != s.arrivals as u64 {
            violations.push(SnapshotViolation::Conservation {
                trial,
                tick,
                detail: format!("served {} + unserved {} != arrivals {}", s.served, s.unserved, s.arrivals),
            });
        }
        if s.stay_durations.len() != s.arrivals as usize {
            violations.push(SnapshotViolation::Conservation {
                trial,
                tick,
                detail: format!("{} stays for {} arrivals", s.stay_durations.len(), s.arrivals),
            });
        }
        if s.stay_durations.contains(&0) {
            violations.push(SnapshotViolation::ZeroStay { trial, tick });
        }

        served_sum += s.served as u64;
        unserved_sum += s.unserved as u64;
        if s.served_cumulative != served_sum || s.unserved_cumulative != unserved_sum {
            violations.push(SnapshotViolation::CumulativeMismatch {
                trial,
                tick,
                detail: format!(
                    "served {}/{} unserved {}/{} (reported/replayed)",
                    s.served_cumulative, served_sum, s.unserved_cumulative, unserved_sum
                ),
            });
        }

        if s.departures as u64 > present {
            violations.push(SnapshotViolation::DeparturesExceedOccupancy {
                trial,
                tick,
                departures: s.departures,
                present,
            });
        }
        let actual: u64 = s.zone_occupancies.iter().map(|&o| o as u64).sum();
        let expected = (present + s.served as u64).saturating_sub(s.departures as u64);
        if actual != expected {
            violations.push(SnapshotViolation::OccupancyFlow { trial, tick, expected, actual });
        }
        present = actual;
    }

    violations
}
