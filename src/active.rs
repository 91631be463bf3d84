use crate::sector::{Sector, Side};

/// Which boundaries of a sector were laid down in the current distance ring
///
/// Cover from a fresh boundary is not credited: tiles at the same distance
/// cannot shadow each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Freshness(u8);

impl Freshness {
    pub const STALE: Freshness = Freshness(0);
    pub const BOTH: Freshness = Freshness(3);

    /// Whether any boundary in `bits` is fresh
    pub fn covers(self, bits: u8) -> bool {
        self.0 & bits != 0
    }

    pub fn mark(&mut self, side: Side) {
        self.0 |= side.bit();
    }

    pub fn union(self, other: Freshness) -> Freshness {
        Freshness(self.0 | other.0)
    }

    /// Cover credited through the boundaries in `bits`
    pub fn credit(self, value: f64, bits: u8) -> f64 {
        if self.covers(bits) {
            0.0
        } else {
            value.max(0.0)
        }
    }
}

/// A shadow in the active set
#[derive(Debug, Clone)]
pub struct ActiveSector {
    /// Stable identity, used in logs and to follow a sector across re-sorts
    pub id: u32,
    pub sector: Sector,
    pub fresh: Freshness,
}

/// Shadow sectors, sorted clockwise by right boundary whenever one is added
/// or two are joined. Widening a single boundary does not re-sort.
///
/// Treated as a ring: every index handed to it wraps with Euclidean
/// remainder, so `-1` is the last sector and `len()` is the first.
#[derive(Debug, Default)]
pub struct ActiveSectors {
    entries: Vec<ActiveSector>,
    next_id: u32,
}

impl ActiveSectors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Wrap a signed index onto the ring; the ring must not be empty
    pub fn wrap(&self, index: isize) -> usize {
        assert!(!self.entries.is_empty(), "wrapping an index on an empty sector ring");
        index.rem_euclid(self.entries.len() as isize) as usize
    }

    pub fn get(&self, index: usize) -> &ActiveSector {
        &self.entries[index]
    }

    pub fn get_mut(&mut self, index: usize) -> &mut ActiveSector {
        &mut self.entries[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveSector> {
        self.entries.iter()
    }

    /// Add a new sector and restore the clockwise order; returns its id
    pub fn insert(&mut self, sector: Sector, fresh: Freshness) -> u32 {
        let id = self.allocate_id();
        self.entries.push(ActiveSector { id, sector, fresh });
        self.sort();
        id
    }

    /// Replace the sector at `index` with a new one; returns the new id
    pub fn replace(&mut self, index: usize, sector: Sector, fresh: Freshness) -> u32 {
        let id = self.allocate_id();
        self.entries[index] = ActiveSector { id, sector, fresh };
        id
    }

    pub fn remove(&mut self, index: usize) -> ActiveSector {
        self.entries.remove(index)
    }

    /// Restore the clockwise order, returning where the sector with `id` ended up
    pub fn sort_tracking(&mut self, id: u32) -> Option<usize> {
        self.sort();
        self.position(id)
    }

    pub fn position(&self, id: u32) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    /// Mark every boundary stale
    pub fn stale_all(&mut self) {
        for entry in &mut self.entries {
            entry.fresh = Freshness::STALE;
        }
    }

    /// Whether no two sectors share a right-boundary key
    pub fn has_distinct_keys(&self) -> bool {
        self.entries.iter().enumerate().all(|(i, a)| {
            self.entries[i + 1..]
                .iter()
                .all(|b| a.sector.compare(&b.sector).is_ne())
        })
    }

    pub fn reflex_count(&self) -> usize {
        self.entries.iter().filter(|e| e.sector.reflex).count()
    }

    pub fn has_world(&self) -> bool {
        self.entries.iter().any(|e| e.sector.world)
    }

    fn sort(&mut self) {
        // Stable, so sectors with equal keys keep their insertion order
        self.entries.sort_by(|a, b| a.sector.compare(&b.sector));
    }

    fn allocate_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

/// Scan state that lives for one distance ring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingScan {
    /// Squared distance of the ring being swept
    pub d2: i32,
    /// Index of the sector the next scan starts from
    pub cursor: usize,
}

impl RingScan {
    pub fn new() -> Self {
        RingScan { d2: 1, cursor: 0 }
    }

    /// Move on to the ring at `d2`
    ///
    /// Crossing into a farther ring restarts the scan at the first sector and
    /// makes every boundary stale. Staying in the same ring keeps the state.
    pub fn enter(self, d2: i32, active: &mut ActiveSectors) -> RingScan {
        if d2 > self.d2 {
            active.stale_all();
            RingScan { d2, cursor: 0 }
        } else {
            self
        }
    }
}

impl Default for RingScan {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locus::Locus;

    fn shadow(x: i32, y: i32) -> Sector {
        Locus::new(x, y, true).to_sector()
    }

    #[test]
    fn test_freshness_credit() {
        let mut fresh = Freshness::STALE;
        assert_eq!(fresh.credit(0.5, Side::Left.bit()), 0.5);
        assert_eq!(fresh.credit(-0.5, Side::Left.bit()), 0.0);
        fresh.mark(Side::Left);
        assert_eq!(fresh.credit(0.5, Side::Left.bit()), 0.0);
        assert_eq!(fresh.credit(0.5, Side::Right.bit()), 0.5);
        // No boundary at all is never fresh
        assert_eq!(Freshness::BOTH.credit(0.5, 0), 0.5);
    }

    #[test]
    fn test_insert_keeps_clockwise_order() {
        let mut active = ActiveSectors::new();
        for (x, y) in [(1, 0), (0, 1), (-1, 0), (0, -1), (1, 1), (-1, -1)] {
            active.insert(shadow(x, y), Freshness::BOTH);
        }
        assert_eq!(active.len(), 6);
        let sectors: Vec<Sector> = active.iter().map(|e| e.sector).collect();
        assert!(sectors.windows(2).all(|w| w[0].compare(&w[1]).is_lt()));
        assert!(active.has_distinct_keys());
    }

    #[test]
    fn test_wrap_is_euclidean() {
        let mut active = ActiveSectors::new();
        active.insert(shadow(1, 0), Freshness::BOTH);
        active.insert(shadow(-1, 0), Freshness::BOTH);
        active.insert(shadow(0, 1), Freshness::BOTH);
        assert_eq!(active.wrap(-1), 2);
        assert_eq!(active.wrap(3), 0);
        assert_eq!(active.wrap(1), 1);
    }

    #[test]
    fn test_sort_tracking_follows_identity() {
        let mut active = ActiveSectors::new();
        active.insert(shadow(1, 0), Freshness::BOTH);
        active.insert(shadow(-1, 0), Freshness::BOTH);
        active.insert(shadow(0, 1), Freshness::BOTH);
        let last = active.len() - 1;
        let first = active.get(0).sector;
        let second_id = active.get(1).id;
        // Give the last slot the smallest key; it must move to the front
        let id = active.replace(last, first, Freshness::STALE);
        active.remove(0);
        assert_eq!(active.sort_tracking(id), Some(0));
        assert_eq!(active.position(second_id), Some(1));
    }

    #[test]
    fn test_entering_farther_ring_stales_everything() {
        let mut active = ActiveSectors::new();
        active.insert(shadow(1, 0), Freshness::BOTH);
        let ring = RingScan { d2: 1, cursor: 0 };
        let same = ring.enter(1, &mut active);
        assert_eq!(same, ring);
        assert_eq!(active.get(0).fresh, Freshness::BOTH);

        let next = RingScan { d2: 1, cursor: 0 }.enter(3, &mut active);
        assert_eq!(next, RingScan { d2: 3, cursor: 0 });
        assert_eq!(active.get(0).fresh, Freshness::STALE);
    }
}
