use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ZoneId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TrialIndex(pub u64);

/// Simulation time in hours (1 unit = 1 simulated hour, counted from opening).
/// Time advances in whole ticks only; there are no sub-hour events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tick(pub u32);

impl Tick {
    pub const HOURS_PER_DAY: u32 = 24;

    /// Wall-clock label for this tick, e.g. `Tick(0)` with opening hour 6 → `"06:00"`.
    pub fn hour_label(self, opening_hour: u32) -> String {
        let hour = (u64::from(opening_hour) + u64::from(self.0)) % u64::from(Self::HOURS_PER_DAY);
        format!("{hour:02}:00")
    }

    pub fn next(self) -> Self {
        Tick(self.0 + 1)
    }
}
