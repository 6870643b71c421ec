use serde::Serialize;

use crate::types::ZoneId;
use crate::zones::ZonePool;

/// A placed arrival, bound to its zone by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Occupant {
    pub zone_id: ZoneId,
    /// Ticks left before departure; always ≥ 1 while held by the ledger.
    pub stay_remaining: u32,
}

impl Occupant {
    pub fn new(zone_id: ZoneId, stay: u32) -> Self {
        assert!(stay >= 1, "occupant stay must be at least one tick");
        Occupant { zone_id, stay_remaining: stay }
    }
}

/// Everyone currently inside the facility.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OccupancyLedger {
    occupants: Vec<Occupant>,
}

impl OccupancyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.occupants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occupants.is_empty()
    }

    pub fn occupants(&self) -> &[Occupant] {
        &self.occupants
    }

    /// Add freshly placed occupants. They are first aged by the next `tick`.
    ///
    /// Panics if any occupant has no stay left.
    pub fn admit(&mut self, occupants: impl IntoIterator<Item = Occupant>) {
        for o in occupants {
            assert!(o.stay_remaining >= 1, "occupant stay must be at least one tick");
            self.occupants.push(o);
        }
    }

    /// Age every occupant by one tick; those whose stay runs out leave and
    /// free their seat. Returns the number of departures.
    pub fn tick(&mut self, zones: &mut ZonePool) -> u32 {
        let mut departures = 0;
        self.occupants.retain_mut(|o| {
            o.stay_remaining = o
                .stay_remaining
                .checked_sub(1)
                .expect("expired occupant in ledger");
            if o.stay_remaining == 0 {
                zones.release(o.zone_id);
                departures += 1;
                false
            } else {
                true
            }
        });
        assert!(
            self.occupants.iter().all(|o| o.stay_remaining >= 1),
            "expired occupant retained after tick"
        );
        departures
    }
}
