//! Resource table: per-type slots, directory entries and usage flags
//!
//! Every resource type owns a vector of slots indexed by resource number.
//! A slot holds the loaded block (the on-disk chunk, header included) and a
//! usage byte combining a lock bit with a 7-bit age counter. Room-addressed
//! types also carry the directory entry giving the owning room and offset.

use crate::error::{ResourceError, Result};
use crate::types::{ResourceMode, ResourceType};
use scumm_formats::Tag;
use scumm_formats::index::{ABSENT_OFFSET, ResourceDirectory};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Hard ceiling on the cardinality of one type
pub const MAX_RESOURCES_PER_TYPE: usize = 8000;

/// Usage byte of one slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct UsageFlags {
    /// Raw flag byte
    pub value: u8,
}

impl UsageFlags {
    /// Slot is protected from eviction
    pub const LOCK: u8 = 0x80;
    /// Mask of the age counter
    pub const USAGE_MASK: u8 = 0x7F;
    /// Saturation point of the age counter
    pub const USAGE_MAX: u8 = 0x7F;
    /// Counter value set by an access
    pub const JUST_TOUCHED: u8 = 1;

    /// Age counter without the lock bit
    pub const fn counter(self) -> u8 {
        self.value & Self::USAGE_MASK
    }

    /// Whether the lock bit is set
    pub const fn is_locked(self) -> bool {
        self.value & Self::LOCK != 0
    }

    /// Replace the counter, keeping the lock bit
    pub fn set_counter(&mut self, counter: u8) {
        self.value = (self.value & Self::LOCK) | (counter & Self::USAGE_MASK);
    }

    /// Mark as just accessed
    pub fn touch(&mut self) {
        self.set_counter(Self::JUST_TOUCHED);
    }

    /// Set or clear the lock bit
    pub fn set_locked(&mut self, locked: bool) {
        if locked {
            self.value |= Self::LOCK;
        } else {
            self.value &= !Self::LOCK;
        }
    }

    /// Advance the counter by one tick
    ///
    /// Counters at zero (never loaded) and at the saturation point stay put,
    /// as do locked slots.
    pub fn age(&mut self) {
        let counter = self.counter();
        if !self.is_locked() && counter != 0 && counter < Self::USAGE_MAX {
            self.set_counter(counter + 1);
        }
    }
}

/// Directory entry of a room-addressed resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirEntry {
    /// Room whose archive holds the resource (0 = current room)
    pub room: u8,
    /// Offset inside the room, [`ABSENT_OFFSET`] if permanently absent
    pub offset: u32,
    /// Uncompressed size recorded by Humongous directories
    pub global_size: u32,
}

impl DirEntry {
    /// Whether the resource is declared but permanently absent
    pub const fn is_absent(&self) -> bool {
        self.offset == ABSENT_OFFSET
    }
}

/// One `(type, index)` cell
#[derive(Debug, Clone, Default)]
pub struct Slot {
    /// Loaded block, `None` when not resident
    pub data: Option<Vec<u8>>,
    /// Lock bit and age counter
    pub flags: UsageFlags,
}

impl Slot {
    /// Resident size in bytes
    pub fn size(&self) -> usize {
        self.data.as_ref().map_or(0, Vec::len)
    }
}

/// All slots of one resource type
#[derive(Debug, Clone)]
pub struct TypeTable {
    /// Tag of the type's chunks
    pub tag: Tag,
    /// Diagnostic name
    pub name: &'static str,
    /// How instances are created
    pub mode: ResourceMode,
    /// Slots indexed by resource number
    pub slots: Vec<Slot>,
    /// Directory entries (room-addressed types only)
    pub entries: Vec<DirEntry>,
}

/// Memory accounting snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceStats {
    /// Bytes held by resident slots
    pub allocated: usize,
    /// Bytes held by locked resident slots
    pub locked_size: usize,
    /// Number of locked resident slots
    pub locked_count: usize,
}

/// Owner of every resource slot and the running byte total
#[derive(Debug, Clone)]
pub struct ResourceTable {
    types: Vec<Option<TypeTable>>,
    allocated_size: usize,
}

impl Default for ResourceTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceTable {
    /// Create a table with no type allocated
    pub fn new() -> Self {
        Self {
            types: vec![None; usize::from(ResourceType::MAX_ID)],
            allocated_size: 0,
        }
    }

    fn slot_of(ty: ResourceType) -> usize {
        usize::from(ty.id()) - 1
    }

    /// (Re)initialize a type with `count` empty slots
    ///
    /// Resident blocks of a previous allocation are freed first so the byte
    /// total stays exact.
    pub fn allocate(
        &mut self,
        ty: ResourceType,
        tag: Tag,
        count: usize,
        name: &'static str,
        mode: ResourceMode,
    ) -> Result<()> {
        debug!(
            "allocResTypeData({}/{},{},{},{:?})",
            ty, name, tag, count, mode
        );
        if count >= MAX_RESOURCES_PER_TYPE {
            return Err(ResourceError::TooManyResources { name, count });
        }

        if let Some(old) = self.types[Self::slot_of(ty)].take() {
            let freed: usize = old.slots.iter().map(Slot::size).sum();
            self.allocated_size -= freed;
        }

        let entries = if mode.is_room_addressed() {
            vec![DirEntry::default(); count]
        } else {
            Vec::new()
        };
        self.types[Self::slot_of(ty)] = Some(TypeTable {
            tag,
            name,
            mode,
            slots: vec![Slot::default(); count],
            entries,
        });
        Ok(())
    }

    /// Type table, if allocated
    pub fn table(&self, ty: ResourceType) -> Option<&TypeTable> {
        self.types[Self::slot_of(ty)].as_ref()
    }

    fn table_mut(&mut self, ty: ResourceType) -> Option<&mut TypeTable> {
        self.types[Self::slot_of(ty)].as_mut()
    }

    /// Cardinality of a type (0 if not allocated)
    pub fn num(&self, ty: ResourceType) -> usize {
        self.table(ty).map_or(0, |t| t.slots.len())
    }

    /// Bounds-check `(ty, index)`, logging a warning on failure
    pub fn validate(&self, context: &str, ty: ResourceType, index: usize) -> bool {
        let num = self.num(ty);
        if index >= num {
            warn!(
                "{} Illegal Glob type {} ({}) num {} (of {})",
                context,
                ty,
                ty.id(),
                index,
                num
            );
            return false;
        }
        true
    }

    fn slot(&self, ty: ResourceType, index: usize) -> Option<&Slot> {
        self.table(ty)?.slots.get(index)
    }

    fn slot_mut(&mut self, ty: ResourceType, index: usize) -> Option<&mut Slot> {
        self.table_mut(ty)?.slots.get_mut(index)
    }

    /// Loaded block of a resident slot
    pub fn data(&self, ty: ResourceType, index: usize) -> Option<&[u8]> {
        self.slot(ty, index)?.data.as_deref()
    }

    /// Whether the slot is resident
    pub fn is_loaded(&self, ty: ResourceType, index: usize) -> bool {
        self.slot(ty, index).is_some_and(|s| s.data.is_some())
    }

    /// Usage flags of a slot
    pub fn flags(&self, ty: ResourceType, index: usize) -> Option<UsageFlags> {
        self.slot(ty, index).map(|s| s.flags)
    }

    /// Reset the age counter, keeping the lock bit
    pub fn touch(&mut self, ty: ResourceType, index: usize) {
        if let Some(slot) = self.slot_mut(ty, index) {
            slot.flags.touch();
        }
    }

    /// Protect a slot from eviction
    pub fn lock(&mut self, ty: ResourceType, index: usize) {
        if self.validate("Locking", ty, index)
            && let Some(slot) = self.slot_mut(ty, index)
        {
            slot.flags.set_locked(true);
        }
    }

    /// Make a slot evictable again
    pub fn unlock(&mut self, ty: ResourceType, index: usize) {
        if self.validate("Unlocking", ty, index)
            && let Some(slot) = self.slot_mut(ty, index)
        {
            slot.flags.set_locked(false);
        }
    }

    /// Store a block in a slot and mark it just touched
    ///
    /// Whatever the slot held before is freed, lock bit included.
    pub fn install(&mut self, ty: ResourceType, index: usize, data: Vec<u8>) -> Result<()> {
        self.nuke(ty, index);
        let size = data.len();
        let slot = self
            .slot_mut(ty, index)
            .ok_or(ResourceError::TypeNotAllocated(ty.name()))?;
        slot.data = Some(data);
        slot.flags = UsageFlags::default();
        slot.flags.touch();
        self.allocated_size += size;
        Ok(())
    }

    /// Free a slot, returning the bytes released
    pub fn nuke(&mut self, ty: ResourceType, index: usize) -> usize {
        let Some(slot) = self.slot_mut(ty, index) else {
            return 0;
        };
        let Some(data) = slot.data.take() else {
            return 0;
        };
        slot.flags = UsageFlags::default();
        debug!("nukeResource({},{})", ty, index);
        self.allocated_size -= data.len();
        data.len()
    }

    /// Age every slot by one tick
    pub fn age_all(&mut self) {
        for table in self.types.iter_mut().flatten() {
            for slot in &mut table.slots {
                slot.flags.age();
            }
        }
    }

    /// Bytes held by resident slots
    pub const fn allocated_size(&self) -> usize {
        self.allocated_size
    }

    /// Memory accounting snapshot
    pub fn stats(&self) -> ResourceStats {
        let mut stats = ResourceStats {
            allocated: self.allocated_size,
            ..ResourceStats::default()
        };
        for table in self.types.iter().flatten() {
            for slot in &table.slots {
                if slot.data.is_some() && slot.flags.is_locked() {
                    stats.locked_size += slot.size();
                    stats.locked_count += 1;
                }
            }
        }
        stats
    }

    /// Directory entry of a room-addressed resource
    pub fn entry(&self, ty: ResourceType, index: usize) -> Option<DirEntry> {
        self.table(ty)?.entries.get(index).copied()
    }

    /// Mutable directory entries of a type (empty for unallocated types)
    pub fn entries_mut(&mut self, ty: ResourceType) -> &mut [DirEntry] {
        match self.table_mut(ty) {
            Some(table) => table.entries.as_mut_slice(),
            None => &mut [],
        }
    }

    /// Mark a resource permanently absent
    pub fn mark_absent(&mut self, ty: ResourceType, index: usize) {
        if let Some(entry) = self.entries_mut(ty).get_mut(index) {
            entry.offset = ABSENT_OFFSET;
        }
    }

    /// Copy a parsed directory into a type's entries
    pub fn set_directory(&mut self, ty: ResourceType, dir: &ResourceDirectory) {
        let entries = self.entries_mut(ty);
        for (i, entry) in entries.iter_mut().enumerate() {
            *entry = DirEntry {
                room: dir.rooms.get(i).copied().unwrap_or(0),
                offset: dir.offsets.get(i).copied().unwrap_or(0),
                global_size: dir.global_sizes.get(i).copied().unwrap_or(0),
            };
        }
    }

    /// Resident slots eligible for eviction, in type then index order
    ///
    /// Yields `(type, index, counter)` for unlocked resident slots of
    /// room-addressed types.
    pub fn eviction_candidates(&self) -> impl Iterator<Item = (ResourceType, usize, u8)> + '_ {
        ResourceType::ALL
            .into_iter()
            .filter_map(|ty| self.table(ty).map(|table| (ty, table)))
            .filter(|(_, table)| table.mode.is_room_addressed())
            .flat_map(|(ty, table)| {
                table
                    .slots
                    .iter()
                    .enumerate()
                    .filter(|(_, slot)| slot.data.is_some() && !slot.flags.is_locked())
                    .map(move |(index, slot)| (ty, index, slot.flags.counter()))
            })
    }

    /// Free every resident slot of every type
    pub fn free_all(&mut self) {
        for ty in ResourceType::ALL {
            for index in 0..self.num(ty) {
                self.nuke(ty, index);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table() -> ResourceTable {
        let mut table = ResourceTable::new();
        table
            .allocate(
                ResourceType::Script,
                Tag::SCRP,
                4,
                "script",
                ResourceMode::RoomAddressed,
            )
            .unwrap();
        table
            .allocate(
                ResourceType::Buffer,
                Tag::NONE,
                2,
                "buffer",
                ResourceMode::Local,
            )
            .unwrap();
        table
    }

    #[test]
    fn test_usage_flags() {
        let mut flags = UsageFlags::default();
        flags.age();
        assert_eq!(flags.counter(), 0);

        flags.touch();
        flags.set_locked(true);
        assert_eq!(flags.value, 0x81);
        flags.age();
        assert_eq!(flags.counter(), 1);

        flags.set_locked(false);
        for _ in 0..300 {
            flags.age();
        }
        assert_eq!(flags.counter(), UsageFlags::USAGE_MAX);

        flags.set_locked(true);
        flags.touch();
        assert!(flags.is_locked());
        assert_eq!(flags.counter(), 1);
    }

    #[test]
    fn test_install_and_nuke_track_size() {
        let mut table = table();
        table.install(ResourceType::Script, 1, vec![0; 10]).unwrap();
        table.install(ResourceType::Buffer, 0, vec![0; 5]).unwrap();
        assert_eq!(table.allocated_size(), 15);
        assert!(table.is_loaded(ResourceType::Script, 1));

        // Replacing a block frees the old one
        table.install(ResourceType::Script, 1, vec![0; 3]).unwrap();
        assert_eq!(table.allocated_size(), 8);

        assert_eq!(table.nuke(ResourceType::Script, 1), 3);
        assert_eq!(table.nuke(ResourceType::Script, 1), 0);
        assert_eq!(table.allocated_size(), 5);
        assert_eq!(table.flags(ResourceType::Script, 1), Some(UsageFlags::default()));
    }

    #[test]
    fn test_validate_bounds() {
        let table = table();
        assert!(table.validate("test", ResourceType::Script, 3));
        assert!(!table.validate("test", ResourceType::Script, 4));
        assert!(!table.validate("test", ResourceType::Costume, 0));
    }

    #[test]
    fn test_allocate_ceiling() {
        let mut table = ResourceTable::new();
        let err = table
            .allocate(
                ResourceType::Sound,
                Tag::SOUN,
                8000,
                "sound",
                ResourceMode::Sound,
            )
            .unwrap_err();
        assert!(matches!(err, ResourceError::TooManyResources { count: 8000, .. }));
    }

    #[test]
    fn test_reallocate_frees_resident() {
        let mut table = table();
        table.install(ResourceType::Script, 0, vec![0; 7]).unwrap();
        table
            .allocate(
                ResourceType::Script,
                Tag::SCRP,
                2,
                "script",
                ResourceMode::RoomAddressed,
            )
            .unwrap();
        assert_eq!(table.allocated_size(), 0);
        assert_eq!(table.num(ResourceType::Script), 2);
    }

    #[test]
    fn test_candidates_skip_locked_and_local() {
        let mut table = table();
        table.install(ResourceType::Script, 0, vec![0; 1]).unwrap();
        table.install(ResourceType::Script, 2, vec![0; 1]).unwrap();
        table.install(ResourceType::Buffer, 1, vec![0; 1]).unwrap();
        table.lock(ResourceType::Script, 0);
        table.age_all();

        let found: Vec<_> = table.eviction_candidates().collect();
        assert_eq!(found, vec![(ResourceType::Script, 2, 2)]);

        let stats = table.stats();
        assert_eq!(stats.locked_count, 1);
        assert_eq!(stats.locked_size, 1);
        assert_eq!(stats.allocated, 3);
    }

    #[test]
    fn test_directory_entries() {
        let mut table = table();
        table.set_directory(
            ResourceType::Script,
            &ResourceDirectory {
                rooms: vec![1, 2, 3, 4],
                offsets: vec![10, 20, ABSENT_OFFSET, 40],
                global_sizes: Vec::new(),
            },
        );
        assert_eq!(table.entry(ResourceType::Script, 1).unwrap().room, 2);
        assert!(table.entry(ResourceType::Script, 2).unwrap().is_absent());
        table.mark_absent(ResourceType::Script, 3);
        assert!(table.entry(ResourceType::Script, 3).unwrap().is_absent());
        assert!(table.entries_mut(ResourceType::Buffer).is_empty());
    }
}
