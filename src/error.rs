use thiserror::Error;

/// Rejected configuration. Surfaced before any trial runs; never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("at least one zone is required")]
    NoZones,

    #[error("zone {zone} has capacity 0; capacities must be positive")]
    ZeroCapacity { zone: usize },

    #[error("horizon must be at least one tick")]
    ZeroHorizon,

    #[error("number of trials must be positive")]
    ZeroTrials,

    #[error("opening hour {0} is outside 0..24")]
    OpeningHour(u32),

    #[error("unknown scenario '{0}' (expected capstone, rarely or normal)")]
    UnknownScenario(String),
}
