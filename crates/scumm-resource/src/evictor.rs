//! Soft memory budget enforcement
//!
//! The evictor runs before every allocation. Below the high-water mark it
//! does nothing; above it, it frees the oldest evictable slots until the
//! requested size fits under the low-water mark.

use crate::table::ResourceTable;
use crate::types::ResourceType;
use tracing::debug;

/// Lowest counter a slot must reach before it can be evicted
const MIN_EVICTION_AGE: u8 = 2;

/// High/low water marks and the pending-age flag
#[derive(Debug, Clone)]
pub struct Evictor {
    max_heap_threshold: usize,
    min_heap_threshold: usize,
    age_pending: bool,
}

impl Evictor {
    /// Create an evictor with the given water marks
    pub const fn new(max_heap_threshold: usize, min_heap_threshold: usize) -> Self {
        Self {
            max_heap_threshold,
            min_heap_threshold,
            age_pending: true,
        }
    }

    /// High-water mark
    pub const fn max_heap_threshold(&self) -> usize {
        self.max_heap_threshold
    }

    /// Low-water mark
    pub const fn min_heap_threshold(&self) -> usize {
        self.min_heap_threshold
    }

    /// Note that one interpreter tick has passed
    ///
    /// The next reservation ages every counter once before testing the
    /// budget.
    pub fn tick(&mut self) {
        self.age_pending = true;
    }

    /// Make room for `size` more bytes
    ///
    /// `in_use` reports slots the interpreter is actively referencing; those
    /// are never freed. Returns the number of slots freed.
    pub fn reserve<F>(&mut self, table: &mut ResourceTable, size: usize, in_use: F) -> usize
    where
        F: Fn(ResourceType, usize) -> bool,
    {
        if self.age_pending {
            self.age_pending = false;
            table.age_all();
        }

        if size + table.allocated_size() < self.max_heap_threshold {
            return 0;
        }

        let before = table.allocated_size();
        let mut freed = 0;
        loop {
            let Some((ty, index)) = Self::select(table, &in_use) else {
                break;
            };
            table.nuke(ty, index);
            freed += 1;
            if size + table.allocated_size() <= self.min_heap_threshold {
                break;
            }
        }

        table.age_all();
        debug!(
            "Expired resources, mem {} -> {}",
            before,
            table.allocated_size()
        );
        freed
    }

    /// Oldest evictable slot; ties go to the lowest type id, then index
    fn select<F>(table: &ResourceTable, in_use: &F) -> Option<(ResourceType, usize)>
    where
        F: Fn(ResourceType, usize) -> bool,
    {
        let mut best: Option<(ResourceType, usize, u8)> = None;
        for (ty, index, counter) in table.eviction_candidates() {
            if counter < MIN_EVICTION_AGE {
                continue;
            }
            if best.is_some_and(|(_, _, c)| counter <= c) {
                continue;
            }
            if in_use(ty, index) {
                continue;
            }
            best = Some((ty, index, counter));
        }
        best.map(|(ty, index, _)| (ty, index))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::ResourceMode;
    use scumm_formats::Tag;

    fn table() -> ResourceTable {
        let mut table = ResourceTable::new();
        table
            .allocate(
                ResourceType::Script,
                Tag::SCRP,
                8,
                "script",
                ResourceMode::RoomAddressed,
            )
            .unwrap();
        table
            .allocate(
                ResourceType::Costume,
                Tag::COST,
                8,
                "costume",
                ResourceMode::RoomAddressed,
            )
            .unwrap();
        table
    }

    #[test]
    fn test_under_budget_only_ages() {
        let mut table = table();
        table.install(ResourceType::Script, 0, vec![0; 10]).unwrap();
        let mut evictor = Evictor::new(100, 50);

        assert_eq!(evictor.reserve(&mut table, 10, |_, _| false), 0);
        assert_eq!(table.flags(ResourceType::Script, 0).unwrap().counter(), 2);

        // Aging happens once per tick
        evictor.reserve(&mut table, 10, |_, _| false);
        assert_eq!(table.flags(ResourceType::Script, 0).unwrap().counter(), 2);
        evictor.tick();
        evictor.reserve(&mut table, 10, |_, _| false);
        assert_eq!(table.flags(ResourceType::Script, 0).unwrap().counter(), 3);
    }

    #[test]
    fn test_evicts_oldest_first() {
        let mut table = table();
        table.install(ResourceType::Script, 0, vec![0; 40]).unwrap();
        table.age_all();
        table.age_all();
        table.install(ResourceType::Costume, 3, vec![0; 40]).unwrap();

        let mut evictor = Evictor::new(100, 70);
        // After the pending age script 0 sits at 4, costume 3 at 2
        let freed = evictor.reserve(&mut table, 30, |_, _| false);
        assert_eq!(freed, 1);
        assert!(!table.is_loaded(ResourceType::Script, 0));
        assert!(table.is_loaded(ResourceType::Costume, 3));
        assert_eq!(table.allocated_size(), 40);
    }

    #[test]
    fn test_ties_prefer_lowest_type_then_index() {
        let mut table = table();
        table.install(ResourceType::Costume, 0, vec![0; 30]).unwrap();
        table.install(ResourceType::Script, 5, vec![0; 30]).unwrap();
        table.install(ResourceType::Script, 2, vec![0; 30]).unwrap();

        let mut evictor = Evictor::new(90, 80);
        evictor.reserve(&mut table, 10, |_, _| false);
        assert!(!table.is_loaded(ResourceType::Script, 2));
        assert!(table.is_loaded(ResourceType::Script, 5));
        assert!(table.is_loaded(ResourceType::Costume, 0));
    }

    #[test]
    fn test_in_use_and_fresh_slots_survive() {
        let mut table = table();
        table.install(ResourceType::Script, 0, vec![0; 60]).unwrap();
        let mut evictor = Evictor::new(50, 10);

        let freed = evictor.reserve(&mut table, 10, |ty, i| ty == ResourceType::Script && i == 0);
        assert_eq!(freed, 0);
        assert_eq!(table.allocated_size(), 60);

        // Freshly touched slots (counter 1) are not candidates either
        let mut evictor = Evictor::new(50, 10);
        evictor.age_pending = false;
        table.touch(ResourceType::Script, 0);
        assert_eq!(evictor.reserve(&mut table, 10, |_, _| false), 0);
    }
}
