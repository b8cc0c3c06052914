//! Resource manager session
//!
//! [`ResourceManager`] owns every piece of resource state for one game
//! session: the archive locator, the resource table, the evictor and the
//! index data. Consumers go through it for every resource access.

use crate::config::ResourceConfig;
use crate::error::Result;
use crate::evictor::Evictor;
use crate::index_reader::{IndexData, IndexReader};
use crate::liveness::LivenessRegistry;
use crate::loader::{Loader, dump_block};
use crate::locator::{ArchiveLocator, MissingArchiveHandler};
use crate::table::{ResourceStats, ResourceTable};
use crate::types::ResourceType;
use crate::vfs::FileProvider;
use scumm_formats::chunk::{ChunkHeader, data_size};
use scumm_formats::scan::{find_tag, find_tag_small};
use scumm_formats::{FormatError, FormatProfile, HeaderDialect, Tag};
use std::path::PathBuf;
use tracing::{debug, info};

/// One game session's resources
pub struct ResourceManager {
    profile: FormatProfile,
    config: ResourceConfig,
    locator: ArchiveLocator,
    table: ResourceTable,
    evictor: Evictor,
    liveness: LivenessRegistry,
    index: IndexData,
    current_room: Option<u16>,
}

impl ResourceManager {
    /// Create a session reading archives through `provider`
    ///
    /// The configuration is validated; nothing is read until
    /// [`read_index`](Self::read_index).
    pub fn new(
        provider: Box<dyn FileProvider>,
        profile: FormatProfile,
        config: ResourceConfig,
    ) -> Result<Self> {
        config.validate()?;
        let locator = ArchiveLocator::new(
            provider,
            profile,
            &config.game_name,
            config.filename_pattern.as_ref(),
        );
        debug!(
            "resource manager for '{}' (version {}, he {}), naming {:?}",
            config.game_name,
            profile.version,
            profile.he_version,
            locator.naming()
        );
        Ok(Self {
            profile,
            evictor: Evictor::new(config.max_heap_threshold, config.min_heap_threshold),
            config,
            locator,
            table: ResourceTable::new(),
            liveness: LivenessRegistry::new(),
            index: IndexData::default(),
            current_room: None,
        })
    }

    /// Read the index file and allocate every resource type
    pub fn read_index(&mut self) -> Result<&IndexData> {
        self.table.free_all();
        self.index =
            IndexReader::new(&self.profile, &self.config, &mut self.locator, &mut self.table)
                .read()?;
        Ok(&self.index)
    }

    /// Format profile of the session
    pub const fn profile(&self) -> &FormatProfile {
        &self.profile
    }

    /// Configuration of the session
    pub const fn config(&self) -> &ResourceConfig {
        &self.config
    }

    /// Data read from the index
    pub const fn index_data(&self) -> &IndexData {
        &self.index
    }

    /// The resource table
    pub const fn table(&self) -> &ResourceTable {
        &self.table
    }

    /// The archive locator
    pub const fn locator(&self) -> &ArchiveLocator {
        &self.locator
    }

    /// Liveness callbacks, for the subsystems to register with
    pub fn liveness_mut(&mut self) -> &mut LivenessRegistry {
        &mut self.liveness
    }

    /// Replace the missing-archive handler
    pub fn set_missing_archive_handler(&mut self, handler: Box<dyn MissingArchiveHandler>) {
        self.locator.set_handler(handler);
    }

    /// Make the archive holding `room` current
    pub fn open_room(&mut self, room: u16) -> Result<()> {
        self.locator
            .open_room(room, self.table.entries_mut(ResourceType::Room))
    }

    /// Close the current archive
    pub fn close_room(&mut self) {
        self.locator
            .close_room(self.table.entries_mut(ResourceType::Room));
    }

    /// Room the game is in; directory room 0 resolves to it
    pub const fn current_room(&self) -> Option<u16> {
        self.current_room
    }

    /// Enter `room`
    pub fn set_current_room(&mut self, room: u16) {
        self.current_room = Some(room);
    }

    /// Resident block of `(ty, index)`, loading it on a miss
    ///
    /// `Ok(None)` when the index is out of range, the resource is marked
    /// absent, or a locally synthesized slot is empty.
    pub fn get_address(&mut self, ty: ResourceType, index: usize) -> Result<Option<&[u8]>> {
        if !self.table.validate("getResourceAddress", ty, index) {
            return Ok(None);
        }

        if !self.table.is_loaded(ty, index) {
            let room_addressed = self
                .table
                .table(ty)
                .is_some_and(|table| table.mode.is_room_addressed());
            if !room_addressed || !self.loader().load(ty, index)? {
                return Ok(None);
            }
        }

        self.table.touch(ty, index);
        Ok(self.table.data(ty, index))
    }

    fn loader(&mut self) -> Loader<'_> {
        Loader {
            profile: &self.profile,
            config: &self.config,
            locator: &mut self.locator,
            table: &mut self.table,
            evictor: &mut self.evictor,
            liveness: &self.liveness,
            current_room: self.current_room,
            he_room_internal_offsets: &self.index.he_room_internal_offsets,
        }
    }

    /// Bytes held for `(ty, index)`, 0 when not resident
    pub fn get_resource_size(&self, ty: ResourceType, index: usize) -> usize {
        self.table.data(ty, index).map_or(0, <[u8]>::len)
    }

    /// Whether `(ty, index)` is resident
    pub fn is_loaded(&self, ty: ResourceType, index: usize) -> bool {
        self.table.is_loaded(ty, index)
    }

    /// Protect `(ty, index)` from eviction
    pub fn lock(&mut self, ty: ResourceType, index: usize) {
        self.table.lock(ty, index);
    }

    /// Make `(ty, index)` evictable again
    pub fn unlock(&mut self, ty: ResourceType, index: usize) {
        self.table.unlock(ty, index);
    }

    /// Whether the game currently references `(ty, index)`
    pub fn is_in_use(&self, ty: ResourceType, index: usize) -> bool {
        self.table.validate("isResourceInUse", ty, index)
            && self.liveness.is_in_use(ty, index, self.current_room)
    }

    /// Drop `(ty, index)` from the cache
    pub fn nuke(&mut self, ty: ResourceType, index: usize) {
        if self.table.validate("nukeResource", ty, index) {
            self.table.nuke(ty, index);
        }
    }

    /// Store a locally built block in `(ty, index)`
    ///
    /// Whatever the slot held is freed first and the budget is enforced
    /// before the new block is counted. Returns false for an invalid index.
    pub fn create_local(&mut self, ty: ResourceType, index: usize, data: Vec<u8>) -> Result<bool> {
        debug!("createResource({},{},{})", ty, index, data.len());
        if !self.table.validate("createResource", ty, index) {
            return Ok(false);
        }
        self.table.nuke(ty, index);
        self.expire(data.len());
        self.table.install(ty, index, data)?;
        Ok(true)
    }

    /// Note that one interpreter tick has passed
    pub fn increase_age(&mut self) {
        self.evictor.tick();
    }

    /// Enforce the memory budget for an allocation of `size` bytes
    ///
    /// Returns the number of slots freed.
    pub fn expire(&mut self, size: usize) -> usize {
        let liveness = &self.liveness;
        let current_room = self.current_room;
        self.evictor.reserve(&mut self.table, size, |ty, index| {
            liveness.is_in_use(ty, index, current_room)
        })
    }

    /// Bytes held by resident slots
    pub const fn allocated_size(&self) -> usize {
        self.table.allocated_size()
    }

    /// Memory accounting snapshot
    pub fn resource_stats(&self) -> ResourceStats {
        let stats = self.table.stats();
        debug!(
            "Total allocated size={}, locked={}({})",
            stats.allocated, stats.locked_size, stats.locked_count
        );
        stats
    }

    /// Free every resident slot
    pub fn free_resources(&mut self) {
        self.table.free_all();
        info!("all resources freed");
    }

    /// First sub-chunk tagged `tag` inside a loaded block, past its header
    pub fn find_resource_data<'b>(&self, tag: Tag, block: &'b [u8]) -> Result<Option<&'b [u8]>> {
        let dialect = self.profile.header_dialect();
        let found = match dialect {
            HeaderDialect::OldBundle => {
                return Err(FormatError::UnsupportedDialect(dialect.name()).into());
            }
            HeaderDialect::SmallHeader => find_tag_small(tag, block)?,
            HeaderDialect::Standard => find_tag(tag, block)?,
        };
        Ok(found.map(|chunk| chunk.get(dialect.header_size()..).unwrap_or_default()))
    }

    /// Payload size of a loaded block, read from its header
    pub fn get_resource_data_size(&self, block: &[u8]) -> u32 {
        data_size(block, self.profile.header_dialect())
    }

    /// Write `block` to `<dump_dir>/<prefix><index>.dmp`
    pub fn dump_resource(&self, prefix: &str, index: usize, block: &[u8]) -> Result<PathBuf> {
        let dialect = self.profile.header_dialect();
        ChunkHeader::parse(block, dialect)?;
        Ok(dump_block(&self.config.dump_dir, prefix, index, block, dialect)?)
    }
}

impl Drop for ResourceManager {
    fn drop(&mut self) {
        self.table.free_all();
    }
}

impl std::fmt::Debug for ResourceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceManager")
            .field("profile", &self.profile)
            .field("locator", &self.locator)
            .field("allocated", &self.table.allocated_size())
            .field("current_room", &self.current_room)
            .finish_non_exhaustive()
    }
}
