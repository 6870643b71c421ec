use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::Serialize;

use crate::config::SimulationConfig;
use crate::events::{SnapshotSink, TickMetrics, TickSnapshot};
use crate::ledger::OccupancyLedger;
use crate::placement;
use crate::scenario::DemandModel;
use crate::types::{Tick, TrialIndex};
use crate::zones::ZonePool;

/// Running totals for one trial; start at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrialTotals {
    pub arrivals_total: u64,
    pub served_total: u64,
    pub unserved_total: u64,
    pub departures_total: u64,
}

impl TrialTotals {
    fn add(&mut self, m: &TickMetrics) {
        self.arrivals_total += m.arrivals as u64;
        self.served_total += m.served as u64;
        self.unserved_total += m.unserved as u64;
        self.departures_total += m.departures as u64;
    }

    /// Fraction of arrivals that found a seat. 1.0 when nobody came.
    pub fn service_rate(&self) -> f64 {
        if self.arrivals_total == 0 {
            1.0
        } else {
            self.served_total as f64 / self.arrivals_total as f64
        }
    }
}

/// The numbers from a finished trial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialSummary {
    pub index: TrialIndex,
    pub seed: u64,
    pub totals: TrialTotals,
    /// Highest occupancy seen in each zone, measured right after each tick's placements.
    pub peak_occupancy: Vec<u32>,
}

/// A finished trial with its terminal zone and ledger state. The state is for
/// inspection only; occupants still inside at closing are not accounted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialOutcome {
    pub summary: TrialSummary,
    pub zones: ZonePool,
    pub ledger: OccupancyLedger,
}

/// One day at the facility: a fixed number of hourly ticks over state that
/// belongs to this trial alone.
pub struct Trial<R: Rng = ChaCha20Rng> {
    index: TrialIndex,
    seed: u64,
    rng: R,
    zones: ZonePool,
    ledger: OccupancyLedger,
    tick: Tick,
    horizon: u32,
    opening_hour: u32,
    totals: TrialTotals,
    peak_occupancy: Vec<u32>,
}

impl Trial<ChaCha20Rng> {
    /// Trial `index` of a run with base seed `base_seed`; its RNG is seeded
    /// with `base_seed + index` so any trial can be replayed on its own.
    pub fn seeded(config: &SimulationConfig, index: TrialIndex, base_seed: u64) -> Self {
        let seed = base_seed.wrapping_add(index.0);
        Self::with_rng(config, index, seed, ChaCha20Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> Trial<R> {
    /// `seed` is recorded in the summary only; all draws come from `rng`.
    pub fn with_rng(config: &SimulationConfig, index: TrialIndex, seed: u64, rng: R) -> Self {
        let zones = ZonePool::new(&config.zone_capacities);
        let peak_occupancy = vec![0; zones.len()];
        Trial {
            index,
            seed,
            rng,
            zones,
            ledger: OccupancyLedger::new(),
            tick: Tick(0),
            horizon: config.horizon_ticks,
            opening_hour: config.opening_hour,
            totals: TrialTotals::default(),
            peak_occupancy,
        }
    }

    pub fn index(&self) -> TrialIndex {
        self.index
    }

    pub fn current_tick(&self) -> Tick {
        self.tick
    }

    pub fn is_finished(&self) -> bool {
        self.tick.0 >= self.horizon
    }

    pub fn zones(&self) -> &ZonePool {
        &self.zones
    }

    pub fn ledger(&self) -> &OccupancyLedger {
        &self.ledger
    }

    pub fn totals(&self) -> TrialTotals {
        self.totals
    }

    /// Advance one tick: sample demand, place arrivals, then age the occupants
    /// that were already inside. This tick's arrivals join the ledger last, so
    /// nobody is aged in the tick they arrive.
    ///
    /// # Panics
    /// If called after the horizon.
    pub fn step<D: DemandModel>(&mut self, demand: &D) -> TickMetrics {
        assert!(!self.is_finished(), "trial {} stepped past its horizon", self.index.0);
        let tick = self.tick;

        let demand = demand.sample(tick, &mut self.rng);
        let placed = placement::place(&demand.stays, &mut self.zones, &mut self.rng);
        for (peak, zone) in self.peak_occupancy.iter_mut().zip(self.zones.zones()) {
            *peak = (*peak).max(zone.occupancy);
        }
        let departures = self.ledger.tick(&mut self.zones);
        self.ledger.admit(placed.occupants);

        assert_eq!(
            self.zones.total_occupancy(),
            self.ledger.len() as u64,
            "zone occupancy out of step with ledger at tick {}",
            tick.0
        );

        let metrics = TickMetrics {
            tick,
            arrivals: demand.arrivals(),
            served: placed.served,
            unserved: placed.unserved,
            departures,
            stay_durations: demand.stays,
        };
        self.totals.add(&metrics);
        self.tick = tick.next();
        metrics
    }

    /// Snapshot of the state right after `metrics` was produced.
    pub fn snapshot(&self, metrics: &TickMetrics) -> TickSnapshot {
        TickSnapshot {
            trial_index: self.index,
            tick_index: metrics.tick,
            hour_label: metrics.tick.hour_label(self.opening_hour),
            zone_occupancies: self.zones.occupancies(),
            zone_capacities: self.zones.capacities(),
            arrivals: metrics.arrivals,
            served: metrics.served,
            unserved: metrics.unserved,
            departures: metrics.departures,
            stay_durations: metrics.stay_durations.clone(),
            served_cumulative: self.totals.served_total,
            unserved_cumulative: self.totals.unserved_total,
        }
    }

    /// Run the remaining ticks, feeding each snapshot to `sink`.
    pub fn run<D: DemandModel, S: SnapshotSink + ?Sized>(
        mut self,
        demand: &D,
        sink: &mut S,
    ) -> TrialOutcome {
        while !self.is_finished() {
            let metrics = self.step(demand);
            if sink.is_enabled() {
                sink.record(&self.snapshot(&metrics));
            }
        }
        self.finish()
    }

    pub fn finish(self) -> TrialOutcome {
        TrialOutcome {
            summary: TrialSummary {
                index: self.index,
                seed: self.seed,
                totals: self.totals,
                peak_occupancy: self.peak_occupancy,
            },
            zones: self.zones,
            ledger: self.ledger,
        }
    }
}
