//! Bus address decoding.

use crate::region::Region;

/// An address decoder over a set of regions.
///
/// Entries are kept sorted by `start` descending; resolution picks the first
/// entry whose `start` is at or below the address. Overlapping regions
/// therefore resolve in favor of the highest base address, which is how a
/// bus distinguishes e.g. controller ports at `$4016` from the APU block
/// starting at `$4000`. Regions enforce their own upper bounds and
/// mirroring; the decoder does not check `end`.
#[derive(Debug, Clone, Default)]
pub struct AddressMap<S: Copy> {
    entries: Vec<(Region, S)>,
}

impl<S: Copy> AddressMap<S> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a region. Keeps the decode order current.
    pub fn insert(&mut self, region: Region, slot: S) {
        self.entries.push((region, slot));
        self.reset();
    }

    /// Re-sort entries by start address, descending.
    pub fn reset(&mut self) {
        self.entries.sort_by(|a, b| b.0.start.cmp(&a.0.start));
    }

    /// The slot answering for `addr`, if any region claims it.
    #[must_use]
    pub fn resolve(&self, addr: u16) -> Option<S> {
        self.entries
            .iter()
            .find(|(region, _)| region.start <= addr)
            .map(|&(_, slot)| slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Slot {
        Low,
        Mid,
        High,
    }

    fn sample_map() -> AddressMap<Slot> {
        let mut map = AddressMap::new();
        // Insertion order is deliberately scrambled; decode must not care.
        map.insert(Region::new(0x4000, 0x5FFF), Slot::Mid);
        map.insert(Region::new(0x0000, 0x1FFF), Slot::Low);
        map.insert(Region::new(0x8000, 0xFFFF), Slot::High);
        map
    }

    #[test]
    fn resolves_to_highest_base_at_or_below() {
        let map = sample_map();
        assert_eq!(map.resolve(0x0000), Some(Slot::Low));
        assert_eq!(map.resolve(0x3FFF), Some(Slot::Low));
        assert_eq!(map.resolve(0x4000), Some(Slot::Mid));
        assert_eq!(map.resolve(0x7FFF), Some(Slot::Mid));
        assert_eq!(map.resolve(0x8000), Some(Slot::High));
        assert_eq!(map.resolve(0xFFFF), Some(Slot::High));
    }

    #[test]
    fn overlap_resolves_to_higher_start() {
        let mut map = AddressMap::new();
        map.insert(Region::new(0x4000, 0x4017), Slot::Mid);
        map.insert(Region::new(0x4016, 0x4017), Slot::High);
        assert_eq!(map.resolve(0x4015), Some(Slot::Mid));
        assert_eq!(map.resolve(0x4016), Some(Slot::High));
        assert_eq!(map.resolve(0x4017), Some(Slot::High));
    }

    #[test]
    fn miss_below_lowest_region() {
        let mut map = AddressMap::new();
        map.insert(Region::new(0x8000, 0xFFFF), Slot::High);
        assert_eq!(map.resolve(0x7FFF), None);
    }
}
