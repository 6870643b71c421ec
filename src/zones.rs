use serde::Serialize;

use crate::types::ZoneId;

/// One physical area with a hard cap on simultaneous occupants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Zone {
    pub capacity: u32,
    pub occupancy: u32,
}

impl Zone {
    pub fn new(capacity: u32) -> Self {
        assert!(capacity > 0, "zone capacity must be positive");
        Zone { capacity, occupancy: 0 }
    }

    pub fn has_room(&self) -> bool {
        self.occupancy < self.capacity
    }
}

/// Ordered zones, indexed by `ZoneId`. Only placement and the ledger mutate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZonePool {
    zones: Vec<Zone>,
}

impl ZonePool {
    /// Fresh pool with zero occupancy. Capacities are validated by `SimulationConfig`.
    pub fn new(capacities: &[u32]) -> Self {
        ZonePool { zones: capacities.iter().map(|&c| Zone::new(c)).collect() }
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn zone(&self, id: ZoneId) -> &Zone {
        &self.zones[id.0]
    }

    /// Take one seat in `id` if it has room. Returns whether the seat was taken.
    pub fn try_reserve(&mut self, id: ZoneId) -> bool {
        let zone = &mut self.zones[id.0];
        if !zone.has_room() {
            return false;
        }
        zone.occupancy += 1;
        self.check(id);
        true
    }

    /// Give back one seat in `id`.
    ///
    /// # Panics
    /// If the zone is already empty: every release must pair with a reservation.
    pub fn release(&mut self, id: ZoneId) {
        let zone = &mut self.zones[id.0];
        assert!(zone.occupancy > 0, "release on empty zone {}", id.0);
        zone.occupancy -= 1;
        self.check(id);
    }

    pub fn occupancies(&self) -> Vec<u32> {
        self.zones.iter().map(|z| z.occupancy).collect()
    }

    pub fn capacities(&self) -> Vec<u32> {
        self.zones.iter().map(|z| z.capacity).collect()
    }

    pub fn total_occupancy(&self) -> u64 {
        self.zones.iter().map(|z| z.occupancy as u64).sum()
    }

    pub fn total_capacity(&self) -> u64 {
        self.zones.iter().map(|z| z.capacity as u64).sum()
    }

    fn check(&self, id: ZoneId) {
        let zone = &self.zones[id.0];
        assert!(
            zone.occupancy <= zone.capacity,
            "zone {} over capacity: {}/{}",
            id.0,
            zone.occupancy,
            zone.capacity
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_pool_is_empty_with_given_capacities() {
        let pool = ZonePool::new(&[45, 20, 10]);
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.capacities(), vec![45, 20, 10]);
        assert_eq!(pool.occupancies(), vec![0, 0, 0]);
        assert_eq!(pool.total_capacity(), 75);
    }

    #[test]
    fn try_reserve_fills_to_capacity_then_refuses() {
        let mut pool = ZonePool::new(&[2]);
        assert!(pool.try_reserve(ZoneId(0)));
        assert!(pool.try_reserve(ZoneId(0)));
        assert!(!pool.try_reserve(ZoneId(0)));
        assert_eq!(pool.zone(ZoneId(0)).occupancy, 2);
    }

    #[test]
    fn reserve_in_one_zone_leaves_others_untouched() {
        let mut pool = ZonePool::new(&[1, 1]);
        assert!(pool.try_reserve(ZoneId(1)));
        assert_eq!(pool.occupancies(), vec![0, 1]);
    }

    #[test]
    fn release_frees_a_seat() {
        let mut pool = ZonePool::new(&[1]);
        assert!(pool.try_reserve(ZoneId(0)));
        pool.release(ZoneId(0));
        assert_eq!(pool.total_occupancy(), 0);
        assert!(pool.try_reserve(ZoneId(0)));
    }

    #[test]
    #[should_panic(expected = "release on empty zone")]
    fn release_on_empty_zone_panics() {
        let mut pool = ZonePool::new(&[3]);
        pool.release(ZoneId(0));
    }

    #[test]
    #[should_panic(expected = "zone capacity must be positive")]
    fn zero_capacity_zone_panics() {
        ZonePool::new(&[3, 0]);
    }
}
