use cowork_sim::config::SimulationConfig;
use cowork_sim::events::{NullSink, TickSnapshot};
use cowork_sim::ledger::{Occupant, OccupancyLedger};
use cowork_sim::placement;
use cowork_sim::runner::TrialRunner;
use cowork_sim::scenario::{ConstantDemand, Demand, ScenarioKind, ScriptedDemand};
use cowork_sim::simulation::Trial;
use cowork_sim::types::{TrialIndex, ZoneId};
use cowork_sim::zones::ZonePool;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

fn scenario() -> impl Strategy<Value = ScenarioKind> {
    prop_oneof![
        Just(ScenarioKind::Capstone),
        Just(ScenarioKind::Rarely),
        Just(ScenarioKind::Normal),
    ]
}

fn capacities() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(1u32..30, 1..6)
}

fn config(zones: Vec<u32>, horizon: u32, trials: u64, seed: u64) -> SimulationConfig {
    SimulationConfig {
        seed: Some(seed),
        zone_capacities: zones,
        horizon_ticks: horizon,
        num_trials: trials,
        ..SimulationConfig::canonical()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn capacity_and_conservation_hold_every_tick(
        zones in capacities(),
        kind in scenario(),
        horizon in 1u32..30,
        seed in any::<u64>(),
    ) {
        let cfg = config(zones.clone(), horizon, 1, seed);
        let mut trial = Trial::seeded(&cfg, TrialIndex(0), seed);
        while !trial.is_finished() {
            let m = trial.step(&kind);
            prop_assert_eq!(m.served + m.unserved, m.arrivals);
            prop_assert_eq!(m.stay_durations.len() as u32, m.arrivals);
            for (zone, &cap) in trial.zones().zones().iter().zip(&zones) {
                prop_assert!(zone.occupancy <= cap);
            }
            prop_assert!(trial.ledger().occupants().iter().all(|o| o.stay_remaining >= 1));
            prop_assert_eq!(trial.zones().total_occupancy(), trial.ledger().len() as u64);
        }
    }

    #[test]
    fn placement_serves_min_of_demand_and_free_room(
        zones in capacities(),
        arrivals in 0usize..200,
        seed in any::<u64>(),
    ) {
        let mut pool = ZonePool::new(&zones);
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let stays = vec![1u32; arrivals];
        let p = placement::place(&stays, &mut pool, &mut rng);
        let room = pool.total_capacity() as usize;
        prop_assert_eq!(p.served as usize, arrivals.min(room));
        prop_assert_eq!(p.unserved as usize, arrivals.saturating_sub(room));
        prop_assert_eq!(pool.total_occupancy(), p.served as u64);
    }

    #[test]
    fn ledger_drains_after_longest_stay(
        stays in prop::collection::vec(1u32..10, 0..40),
    ) {
        let mut pool = ZonePool::new(&[stays.len().max(1) as u32]);
        let mut ledger = OccupancyLedger::new();
        let occupants: Vec<Occupant> = stays
            .iter()
            .map(|&s| {
                assert!(pool.try_reserve(ZoneId(0)));
                Occupant::new(ZoneId(0), s)
            })
            .collect();
        ledger.admit(occupants);

        let longest = stays.iter().copied().max().unwrap_or(0);
        let mut departed = 0u32;
        for _ in 0..longest {
            departed += ledger.tick(&mut pool);
            prop_assert!(ledger.occupants().iter().all(|o| o.stay_remaining >= 1));
        }
        prop_assert_eq!(departed as usize, stays.len());
        prop_assert!(ledger.is_empty());
        prop_assert_eq!(pool.total_occupancy(), 0);
    }

    #[test]
    fn constant_unit_stay_demand_is_fully_served(
        k in 0u32..20,
        horizon in 1u32..25,
        trials in 1u64..6,
    ) {
        // Unit stays mean at most 2k seats are ever in use at once.
        let cfg = config(vec![20, 10, 10], horizon, trials, 1);
        let runner = TrialRunner::new(&cfg, ConstantDemand { arrivals: k, stay: 1 }).unwrap();
        let report = runner.run(&mut NullSink);
        prop_assert_eq!(report.aggregate.avg_served, (k * horizon) as f64);
        prop_assert_eq!(report.aggregate.avg_unserved, 0.0);
    }

    #[test]
    fn saturation_serves_exactly_capacity(zones in capacities()) {
        let total: u32 = zones.iter().sum();
        let cfg = config(zones.clone(), 2, 1, 0);
        let script = ScriptedDemand { ticks: vec![Demand::uniform(total + 5, 1)] };
        let mut trial = Trial::seeded(&cfg, TrialIndex(0), 0);

        let first = trial.step(&script);
        prop_assert_eq!(first.served, total);
        prop_assert_eq!(first.unserved, 5);

        let second = trial.step(&script);
        prop_assert_eq!(second.departures, total);
        prop_assert_eq!(trial.zones().occupancies(), vec![0; zones.len()]);
    }

    #[test]
    fn zero_demand_is_idle_throughout(zones in capacities(), horizon in 1u32..30) {
        let cfg = config(zones, horizon, 1, 9);
        let mut snaps: Vec<TickSnapshot> = Vec::new();
        let outcome = Trial::seeded(&cfg, TrialIndex(0), 9)
            .run(&ConstantDemand { arrivals: 0, stay: 1 }, &mut snaps);
        prop_assert!(snaps.iter().all(|s| s.arrivals == 0 && s.departures == 0));
        prop_assert!(outcome.ledger.is_empty());
        prop_assert_eq!(outcome.summary.totals.served_total, 0);
    }

    #[test]
    fn parallel_and_sequential_agree(kind in scenario(), seed in any::<u64>(), trials in 1u64..8) {
        let cfg = config(vec![45, 20, 10], 17, trials, seed);
        let runner = TrialRunner::new(&cfg, kind).unwrap();
        let seq = runner.run(&mut NullSink);
        let par = runner.run_parallel(&mut NullSink);
        prop_assert_eq!(seq.aggregate, par.aggregate);
        prop_assert_eq!(seq.trials, par.trials);
    }
}
