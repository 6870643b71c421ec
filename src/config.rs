use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::scenario::ScenarioKind;
use crate::types::Tick;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Base seed; trial `i` runs on `seed + i`. `None` draws one from OS entropy.
    pub seed: Option<u64>,
    pub scenario: ScenarioKind,
    /// One entry per zone, in zone-index order.
    pub zone_capacities: Vec<u32>,
    pub horizon_ticks: u32,
    pub num_trials: u64,
    /// Wall-clock hour of tick 0; only affects snapshot labels.
    pub opening_hour: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::canonical()
    }
}

impl SimulationConfig {
    /// Reference facility: three zones of 45/20/10 seats, open 06:00–22:00
    /// (17 hourly ticks), 15 trials of the normal-demand scenario.
    pub fn canonical() -> Self {
        SimulationConfig {
            seed: None,
            scenario: ScenarioKind::Normal,
            zone_capacities: vec![45, 20, 10],
            horizon_ticks: 17,
            num_trials: 15,
            opening_hour: 6,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.zone_capacities.is_empty() {
            return Err(ConfigError::NoZones);
        }
        if let Some(zone) = self.zone_capacities.iter().position(|&c| c == 0) {
            return Err(ConfigError::ZeroCapacity { zone });
        }
        if self.horizon_ticks == 0 {
            return Err(ConfigError::ZeroHorizon);
        }
        if self.num_trials == 0 {
            return Err(ConfigError::ZeroTrials);
        }
        if self.opening_hour >= Tick::HOURS_PER_DAY {
            return Err(ConfigError::OpeningHour(self.opening_hour));
        }
        Ok(())
    }

    pub fn total_capacity(&self) -> u64 {
        self.zone_capacities.iter().map(|&c| c as u64).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_is_valid() {
        let config = SimulationConfig::canonical();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.total_capacity(), 75);
    }

    #[test]
    fn rejects_empty_zone_list() {
        let mut config = SimulationConfig::canonical();
        config.zone_capacities.clear();
        assert_eq!(config.validate(), Err(ConfigError::NoZones));
    }

    #[test]
    fn rejects_zero_capacity_and_names_the_zone() {
        let mut config = SimulationConfig::canonical();
        config.zone_capacities = vec![3, 0, 1];
        assert_eq!(config.validate(), Err(ConfigError::ZeroCapacity { zone: 1 }));
    }

    #[test]
    fn rejects_zero_horizon_and_zero_trials() {
        let mut config = SimulationConfig::canonical();
        config.horizon_ticks = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroHorizon));

        let mut config = SimulationConfig::canonical();
        config.num_trials = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroTrials));
    }

    #[test]
    fn rejects_opening_hour_past_midnight() {
        let mut config = SimulationConfig::canonical();
        config.opening_hour = 24;
        assert_eq!(config.validate(), Err(ConfigError::OpeningHour(24)));
    }

    #[test]
    fn partial_json_falls_back_to_canonical_fields() {
        let config: SimulationConfig =
            serde_json::from_str(r#"{"scenario":"capstone","zone_capacities":[2,1,1],"seed":7}"#)
                .unwrap();
        assert_eq!(config.scenario, ScenarioKind::Capstone);
        assert_eq!(config.zone_capacities, vec![2, 1, 1]);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.horizon_ticks, 17);
        assert_eq!(config.num_trials, 15);
    }

    #[test]
    fn unknown_scenario_in_json_is_rejected() {
        let parsed = serde_json::from_str::<SimulationConfig>(r#"{"scenario":"weekend"}"#);
        assert!(parsed.is_err());
    }
}
