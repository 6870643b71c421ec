use rand::Rng;
use rand::seq::SliceRandom;

use crate::ledger::Occupant;
use crate::types::ZoneId;
use crate::zones::ZonePool;

/// Result of placing one tick's arrivals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placement {
    pub served: u32,
    pub unserved: u32,
    pub occupants: Vec<Occupant>,
}

/// Randomized first-fit: each arrival walks a fresh uniform permutation of the
/// zones and takes the first one with room. Arrivals that find no room are
/// dropped, not queued.
///
/// `stays[i]` is the stay length of arrival `i`; the arrival count is `stays.len()`.
pub fn place<R: Rng + ?Sized>(stays: &[u32], zones: &mut ZonePool, rng: &mut R) -> Placement {
    let mut out = Placement { occupants: Vec::with_capacity(stays.len()), ..Placement::default() };
    let mut order: Vec<ZoneId> = (0..zones.len()).map(ZoneId).collect();

    for &stay in stays {
        order.shuffle(rng);
        match order.iter().copied().find(|&id| zones.try_reserve(id)) {
            Some(zone_id) => {
                out.served += 1;
                out.occupants.push(Occupant::new(zone_id, stay));
            }
            None => out.unserved += 1,
        }
    }

    debug_assert_eq!(out.served + out.unserved, stays.len() as u32);
    out
}
