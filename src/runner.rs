use rand::Rng;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::SimulationConfig;
use crate::error::ConfigError;
use crate::events::{SnapshotSink, TickSnapshot};
use crate::scenario::DemandModel;
use crate::simulation::{Trial, TrialOutcome, TrialSummary, TrialTotals};
use crate::types::TrialIndex;

/// Mean per-trial served and unserved counts: the headline result of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AggregateResult {
    pub avg_served: f64,
    pub avg_unserved: f64,
}

impl AggregateResult {
    /// Plain sum-then-divide, so trial order does not matter.
    pub fn from_totals<'a>(totals: impl IntoIterator<Item = &'a TrialTotals>) -> Self {
        let (mut served, mut unserved, mut n) = (0u64, 0u64, 0u64);
        for t in totals {
            served += t.served_total;
            unserved += t.unserved_total;
            n += 1;
        }
        if n == 0 {
            return AggregateResult::default();
        }
        AggregateResult {
            avg_served: served as f64 / n as f64,
            avg_unserved: unserved as f64 / n as f64,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Base seed actually used; trial `i` ran on `seed + i`.
    pub seed: u64,
    pub aggregate: AggregateResult,
    /// One entry per trial, in trial order.
    pub trials: Vec<TrialSummary>,
    /// Terminal state of the final trial. Diagnostic only.
    pub last_trial: Option<TrialOutcome>,
}

/// Repeats independent trials and averages them.
pub struct TrialRunner<'a, D> {
    config: &'a SimulationConfig,
    demand: D,
    seed: u64,
}

impl<'a, D: DemandModel> TrialRunner<'a, D> {
    /// Validates `config` and fixes the base seed, drawing one from OS entropy
    /// when the config has none.
    pub fn new(config: &'a SimulationConfig, demand: D) -> Result<Self, ConfigError> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        Ok(TrialRunner { config, demand, seed })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn trial(&self, i: u64) -> Trial {
        Trial::seeded(self.config, TrialIndex(i), self.seed)
    }

    /// Trials one after another, streaming every snapshot into `sink` as it happens.
    pub fn run<S: SnapshotSink + ?Sized>(&self, sink: &mut S) -> RunReport {
        let mut trials = Vec::with_capacity(trial_capacity_hint(self.config.num_trials));
        let mut last = None;
        for i in 0..self.config.num_trials {
            let outcome = self.trial(i).run(&self.demand, &mut *sink);
            log_trial(&outcome.summary);
            trials.push(outcome.summary.clone());
            last = Some(outcome);
        }
        self.report(trials, last)
    }

    /// Trials spread over the rayon pool. Each trial owns its zones, ledger and
    /// RNG; snapshots are buffered per trial and replayed into `sink` in trial
    /// order, so output matches [`TrialRunner::run`] exactly.
    pub fn run_parallel<S: SnapshotSink + ?Sized>(&self, sink: &mut S) -> RunReport
    where
        D: Sync,
    {
        let keep_snapshots = sink.is_enabled();
        let results: Vec<(TrialOutcome, Vec<TickSnapshot>)> = (0..self.config.num_trials)
            .into_par_iter()
            .map(|i| {
                let mut snaps: Vec<TickSnapshot> = Vec::new();
                let outcome = if keep_snapshots {
                    self.trial(i).run(&self.demand, &mut snaps)
                } else {
                    self.trial(i).run(&self.demand, &mut crate::events::NullSink)
                };
                (outcome, snaps)
            })
            .collect();

        let mut trials = Vec::with_capacity(results.len());
        let mut last = None;
        for (outcome, snaps) in results {
            for s in &snaps {
                sink.record(s);
            }
            log_trial(&outcome.summary);
            trials.push(outcome.summary.clone());
            last = Some(outcome);
        }
        self.report(trials, last)
    }

    fn report(&self, trials: Vec<TrialSummary>, last_trial: Option<TrialOutcome>) -> RunReport {
        let aggregate = AggregateResult::from_totals(trials.iter().map(|t| &t.totals));
        info!(
            seed = self.seed,
            trials = trials.len(),
            avg_served = aggregate.avg_served,
            avg_unserved = aggregate.avg_unserved,
            "run complete"
        );
        RunReport { seed: self.seed, aggregate, trials, last_trial }
    }
}

/// Upper bound on up-front allocation; larger runs grow the vector as they go.
const MAX_PREALLOCATED_TRIALS: u64 = 1 << 16;

fn trial_capacity_hint(num_trials: u64) -> usize {
    num_trials.min(MAX_PREALLOCATED_TRIALS) as usize
}

fn log_trial(summary: &TrialSummary) {
    debug!(
        trial = summary.index.0,
        seed = summary.seed,
        served = summary.totals.served_total,
        unserved = summary.totals.unserved_total,
        "trial finished"
    );
}

/// Run `config.scenario` for `config.num_trials` trials and return the averages.
pub fn simulate(config: &SimulationConfig) -> Result<AggregateResult, ConfigError> {
    let runner = TrialRunner::new(config, config.scenario)?;
    Ok(runner.run(&mut crate::events::NullSink).aggregate)
}
