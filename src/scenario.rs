use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand_distr::{Beta, Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::Tick;

/// Named demand profile for a whole trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioKind {
    /// Left-skewed, high-demand period (project deadlines): many arrivals, longer stays.
    Capstone,
    /// Right-skewed, low-demand period: few arrivals, short stays.
    Rarely,
    /// Symmetric demand around 10 arrivals/hour, ~4 hour stays.
    Normal,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 3] =
        [ScenarioKind::Capstone, ScenarioKind::Rarely, ScenarioKind::Normal];

    pub fn profile(self) -> ScenarioProfile {
        match self {
            ScenarioKind::Capstone => ScenarioProfile {
                arrivals: DrawModel::Beta { alpha: 5.0, beta: 2.0, scale: 20.0, offset: 0.0 },
                stay: DrawModel::Beta { alpha: 5.0, beta: 2.0, scale: 7.0, offset: 1.0 },
            },
            ScenarioKind::Rarely => ScenarioProfile {
                arrivals: DrawModel::Beta { alpha: 2.0, beta: 5.0, scale: 20.0, offset: 0.0 },
                stay: DrawModel::Beta { alpha: 2.0, beta: 5.0, scale: 7.0, offset: 1.0 },
            },
            ScenarioKind::Normal => ScenarioProfile {
                arrivals: DrawModel::AbsNormal { mean: 10.0, std_dev: 4.0 },
                stay: DrawModel::AbsNormal { mean: 4.0, std_dev: 1.0 },
            },
        }
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScenarioKind::Capstone => "capstone",
            ScenarioKind::Rarely => "rarely",
            ScenarioKind::Normal => "normal",
        };
        f.write_str(name)
    }
}

impl FromStr for ScenarioKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "capstone" => Ok(ScenarioKind::Capstone),
            "rarely" => Ok(ScenarioKind::Rarely),
            "normal" => Ok(ScenarioKind::Normal),
            _ => Err(ConfigError::UnknownScenario(s.to_string())),
        }
    }
}

/// A continuous draw, before flooring to whole arrivals or hours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawModel {
    /// `Beta(alpha, beta) * scale + offset`.
    Beta { alpha: f64, beta: f64, scale: f64, offset: f64 },
    /// `|Normal(mean, std_dev)|`.
    AbsNormal { mean: f64, std_dev: f64 },
}

impl DrawModel {
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            DrawModel::Beta { alpha, beta, scale, offset } => {
                let dist = Beta::new(*alpha, *beta).expect("invalid Beta params");
                dist.sample(rng) * scale + offset
            }
            DrawModel::AbsNormal { mean, std_dev } => {
                let dist = Normal::new(*mean, *std_dev).expect("invalid Normal params");
                dist.sample(rng).abs()
            }
        }
    }
}

/// One tick's demand. `stays[i]` is the stay length in ticks of arrival `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Demand {
    pub stays: Vec<u32>,
}

impl Demand {
    pub fn arrivals(&self) -> u32 {
        self.stays.len() as u32
    }

    pub fn uniform(arrivals: u32, stay: u32) -> Self {
        Demand { stays: vec![stay.max(1); arrivals as usize] }
    }
}

/// Source of per-tick arrivals. All randomness must come from `rng`.
pub trait DemandModel {
    fn sample<R: Rng + ?Sized>(&self, tick: Tick, rng: &mut R) -> Demand;
}

/// Floors a draw to a whole arrival count; negative or non-finite draws give 0.
pub fn arrival_count(draw: f64) -> u32 {
    if draw.is_finite() && draw > 0.0 { draw.floor() as u32 } else { 0 }
}

/// Floors a draw to a stay length in ticks. Never below 1.
pub fn stay_ticks(draw: f64) -> u32 {
    arrival_count(draw).max(1)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenarioProfile {
    pub arrivals: DrawModel,
    pub stay: DrawModel,
}

impl DemandModel for ScenarioProfile {
    fn sample<R: Rng + ?Sized>(&self, _tick: Tick, rng: &mut R) -> Demand {
        let n = arrival_count(self.arrivals.draw(rng));
        let stays = (0..n).map(|_| stay_ticks(self.stay.draw(rng))).collect();
        Demand { stays }
    }
}

impl DemandModel for ScenarioKind {
    fn sample<R: Rng + ?Sized>(&self, tick: Tick, rng: &mut R) -> Demand {
        self.profile().sample(tick, rng)
    }
}

/// Same demand every tick; consumes no randomness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantDemand {
    pub arrivals: u32,
    pub stay: u32,
}

impl DemandModel for ConstantDemand {
    fn sample<R: Rng + ?Sized>(&self, _tick: Tick, _rng: &mut R) -> Demand {
        Demand::uniform(self.arrivals, self.stay)
    }
}

/// Fixed per-tick demand script; ticks past the end of the script see no arrivals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptedDemand {
    pub ticks: Vec<Demand>,
}

impl DemandModel for ScriptedDemand {
    fn sample<R: Rng + ?Sized>(&self, tick: Tick, _rng: &mut R) -> Demand {
        self.ticks.get(tick.0 as usize).cloned().unwrap_or_default()
    }
}
