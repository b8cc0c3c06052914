//! Index file reader
//!
//! The index lives in room 0's archive: a flat run of tagged blocks, each
//! prefixed by a big-endian size that covers its own 8-byte header. The
//! reader dispatches on the tag, lets the block parsers in
//! [`scumm_formats::index`] consume what they understand, then seeks to the
//! end of the block regardless of how much was read.

use crate::config::ResourceConfig;
use crate::error::{ResourceError, Result};
use crate::locator::{ArchiveLocator, ArchiveStream};
use crate::table::ResourceTable;
use crate::types::{ResourceMode, ResourceType};
use scumm_formats::index::{
    ArrayDefinition, BlockHeader, GameCounts, HeRoomOffsets, IndexBlock, ObjectTable,
    ResourceDirectory, read_array_definitions, read_audio_names, read_block_header,
    read_sizing_block,
};
use scumm_formats::{DirectoryLayout, Features, FormatError, FormatProfile, MaxsLayout, Tag};
use std::io::{Read, Seek, SeekFrom};
use tracing::{debug, info, trace, warn};

/// Everything the index declares beyond the resource directories
#[derive(Debug, Clone, Default)]
pub struct IndexData {
    /// Cardinalities and derived globals
    pub counts: GameCounts,
    /// Global object directory
    pub objects: ObjectTable,
    /// Array variable definitions
    pub arrays: Vec<ArrayDefinition>,
    /// Audio names (`ANAM`)
    pub audio_names: Vec<String>,
    /// Humongous archive offset of every room (`DLFL`)
    pub he_room_offsets: Vec<u32>,
    /// Humongous offset of each room's container inside its archive
    pub he_room_internal_offsets: Vec<u32>,
    /// Shadow palette buffer sized by the sizing block
    pub shadow_palette: Vec<u8>,
    /// Layout the sizing block used, if one was present
    pub maxs_layout: Option<MaxsLayout>,
    /// Number of blocks read
    pub blocks_read: usize,
}

/// Reads the index file into the resource table
pub struct IndexReader<'a> {
    profile: &'a FormatProfile,
    config: &'a ResourceConfig,
    locator: &'a mut ArchiveLocator,
    table: &'a mut ResourceTable,
}

impl<'a> IndexReader<'a> {
    /// Borrow the pieces the reader fills in
    pub fn new(
        profile: &'a FormatProfile,
        config: &'a ResourceConfig,
        locator: &'a mut ArchiveLocator,
        table: &'a mut ResourceTable,
    ) -> Self {
        Self {
            profile,
            config,
            locator,
            table,
        }
    }

    /// Read the whole index from room 0's archive
    pub fn read(self) -> Result<IndexData> {
        debug!("readIndexFile()");
        self.locator
            .close_room(self.table.entries_mut(ResourceType::Room));
        self.locator
            .open_room(0, self.table.entries_mut(ResourceType::Room))?;

        let mut data = IndexData::default();
        let mut dynamic_room_offsets = false;
        {
            let stream = self.locator.stream()?;
            if self.profile.version <= 5 {
                prescan_counts(stream, &mut data.counts)?;
                stream.seek(SeekFrom::Start(0))?;
            }

            let mut ctx = BlockContext {
                profile: self.profile,
                config: self.config,
                table: &mut *self.table,
                data: &mut data,
                dynamic_room_offsets: &mut dynamic_room_offsets,
            };

            loop {
                let start = stream.stream_position()?;
                let Some(header) = read_block_header(stream)? else {
                    break;
                };
                if header.size < BlockHeader::SIZE {
                    return Err(FormatError::InvalidChunkSize {
                        tag: header.tag,
                        size: i64::from(header.size),
                    }
                    .into());
                }
                trace!("index block '{}' size {} at {}", header.tag, header.size, start);

                let block = IndexBlock::from_tag(header.tag)
                    .ok_or_else(|| ResourceError::unknown_block(header.tag))?;
                ctx.read_block(stream, block, header)?;
                ctx.data.blocks_read += 1;

                stream.seek(SeekFrom::Start(start + u64::from(header.size)))?;
            }
        }

        if dynamic_room_offsets {
            self.locator.set_dynamic_room_offsets(true);
        }
        self.locator
            .set_he_room_offsets(data.he_room_offsets.clone());
        self.locator
            .close_room(self.table.entries_mut(ResourceType::Room));

        info!(
            "index read: {} blocks, {} rooms, {} scripts, {} sounds, {} costumes, {} objects",
            data.blocks_read,
            self.table.num(ResourceType::Room),
            self.table.num(ResourceType::Script),
            self.table.num(ResourceType::Sound),
            self.table.num(ResourceType::Costume),
            data.objects.len()
        );
        Ok(data)
    }
}

/// Pre-pass for version 5 and earlier: directory counts ahead of the sizing block
fn prescan_counts(stream: &mut ArchiveStream, counts: &mut GameCounts) -> Result<()> {
    loop {
        let start = stream.stream_position()?;
        let Some(header) = read_block_header(stream)? else {
            break;
        };
        if header.size < BlockHeader::SIZE {
            break;
        }
        let target = match header.tag.as_bytes() {
            b"DOBJ" => Some(&mut counts.num_global_objects),
            b"DROO" => Some(&mut counts.num_rooms),
            b"DSCR" => Some(&mut counts.num_scripts),
            b"DCOS" => Some(&mut counts.num_costumes),
            b"DSOU" => Some(&mut counts.num_sounds),
            _ => None,
        };
        if let Some(count) = target {
            let mut raw = [0u8; 2];
            if stream.read_exact(&mut raw).is_err() {
                break;
            }
            *count = u32::from(u16::from_le_bytes(raw));
            trace!("prescan '{}' declares {}", header.tag, *count);
        }
        stream.seek(SeekFrom::Start(start + u64::from(header.size)))?;
    }
    Ok(())
}

struct BlockContext<'b> {
    profile: &'b FormatProfile,
    config: &'b ResourceConfig,
    table: &'b mut ResourceTable,
    data: &'b mut IndexData,
    dynamic_room_offsets: &'b mut bool,
}

impl BlockContext<'_> {
    fn read_block(
        &mut self,
        stream: &mut ArchiveStream,
        block: IndexBlock,
        header: BlockHeader,
    ) -> Result<()> {
        match block {
            IndexBlock::Charsets => {
                self.read_directory(stream, ResourceType::Charset, Tag::CHAR, "charset")?;
            }
            IndexBlock::Objects => {
                debug!("found DOBJ block, reading object table");
                let objects = ObjectTable::read(stream, self.profile.object_layout())?;
                let expected = self.data.counts.num_global_objects as usize;
                if objects.len() != expected {
                    return Err(ResourceError::CountMismatch {
                        name: "global object".to_string(),
                        expected,
                        found: objects.len(),
                    });
                }
                self.data.objects = objects;
            }
            IndexBlock::ServerVersion => {
                warn!("SVER index block not yet handled, skipping");
            }
            IndexBlock::RoomNames | IndexBlock::Disk | IndexBlock::Init => {
                debug!("{} index block skipped", header.tag);
            }
            IndexBlock::HeRoomOffsets => {
                self.data.he_room_offsets = HeRoomOffsets::read(stream)?.offsets;
            }
            IndexBlock::Images => {
                self.read_directory(stream, ResourceType::Image, Tag::AWIZ, "images")?;
            }
            IndexBlock::Talkies => {
                self.read_directory(stream, ResourceType::Talkie, Tag::TLKE, "talkie")?;
            }
            IndexBlock::RoomImages => {
                self.read_directory(stream, ResourceType::RoomImage, Tag::RMIM, "room image")?;
            }
            IndexBlock::AudioNames => {
                debug!("found ANAM block, reading audio names");
                self.data.audio_names = read_audio_names(stream)?;
            }
            IndexBlock::Rooms => {
                let dir = self.read_directory(stream, ResourceType::Room, Tag::ROOM, "room")?;
                if self.profile.is_he_windows() {
                    self.data.he_room_internal_offsets = dir.offsets;
                }
            }
            IndexBlock::RoomScripts => {
                self.read_directory(stream, ResourceType::RoomScripts, Tag::RMSC, "room script")?;
            }
            IndexBlock::Scripts => {
                self.read_directory(stream, ResourceType::Script, Tag::SCRP, "script")?;
            }
            IndexBlock::Costumes => {
                self.read_directory(stream, ResourceType::Costume, costume_tag(self.profile), "costume")?;
            }
            IndexBlock::Sizing => {
                let layout =
                    read_sizing_block(stream, self.profile, header.size, &mut self.data.counts)?;
                self.data.maxs_layout = Some(layout);
                self.data.shadow_palette = vec![0; self.data.counts.shadow_palette_size as usize];
                allocate_types(self.table, &self.data.counts, self.profile, self.config)?;
                *self.dynamic_room_offsets = true;
            }
            IndexBlock::Sounds => {
                self.read_directory(stream, ResourceType::Sound, Tag::SOUN, "sound")?;
            }
            IndexBlock::Arrays => {
                if !self.profile.supports_arrays() {
                    return Err(FormatError::ArraysUnsupported {
                        version: self.profile.version,
                    }
                    .into());
                }
                self.data.arrays = read_array_definitions(stream, self.profile)?;
                debug!("{} array definitions", self.data.arrays.len());
            }
        }
        Ok(())
    }

    fn read_directory(
        &mut self,
        stream: &mut ArchiveStream,
        ty: ResourceType,
        tag: Tag,
        name: &'static str,
    ) -> Result<ResourceDirectory> {
        trace!("readResTypeList({},{},{})", ty, tag, name);
        let layout = self.profile.directory_layout();
        let dir = ResourceDirectory::read(stream, layout, name, ty == ResourceType::Room)?;

        if layout == DirectoryLayout::OldBundle {
            if self.table.table(ty).is_none() {
                self.table.allocate(ty, tag, dir.len(), name, mode_of(ty))?;
            }
        } else if dir.len() != self.table.num(ty) {
            return Err(ResourceError::CountMismatch {
                name: name.to_string(),
                expected: self.table.num(ty),
                found: dir.len(),
            });
        }

        self.table.set_directory(ty, &dir);
        Ok(dir)
    }
}

fn mode_of(ty: ResourceType) -> ResourceMode {
    if ty == ResourceType::Sound {
        ResourceMode::Sound
    } else {
        ResourceMode::RoomAddressed
    }
}

fn costume_tag(profile: &FormatProfile) -> Tag {
    if profile.has(Features::NEW_COSTUMES) {
        Tag::AKOS
    } else {
        Tag::COST
    }
}

/// Allocate every resource type from the sizing block's counts
pub fn allocate_types(
    table: &mut ResourceTable,
    counts: &GameCounts,
    profile: &FormatProfile,
    config: &ResourceConfig,
) -> Result<()> {
    use ResourceMode::{Local, RoomAddressed, Sound};
    use ResourceType as T;

    let n = |count: u32| count as usize;
    let allocations: [(ResourceType, Tag, usize, &'static str, ResourceMode); 19] = [
        (T::Costume, costume_tag(profile), n(counts.num_costumes), "costume", RoomAddressed),
        (T::Room, Tag::ROOM, n(counts.num_rooms), "room", RoomAddressed),
        (T::RoomImage, Tag::RMIM, n(counts.num_rooms), "room image", RoomAddressed),
        (T::RoomScripts, Tag::RMSC, n(counts.num_rooms), "room script", RoomAddressed),
        (T::Sound, Tag::SOUN, n(counts.num_sounds), "sound", Sound),
        (T::Script, Tag::SCRP, n(counts.num_scripts), "script", RoomAddressed),
        (T::Charset, Tag::CHAR, n(counts.num_charsets), "charset", RoomAddressed),
        (T::ObjectName, Tag::NONE, n(counts.num_new_names), "new name", Local),
        (T::Inventory, Tag::NONE, n(counts.num_inventory), "inventory", Local),
        (T::Temp, Tag::NONE, 10, "temp", Local),
        (T::ScaleTable, Tag::NONE, 5, "scale table", Local),
        (T::ActorName, Tag::NONE, config.num_actors, "actor name", Local),
        (T::Buffer, Tag::NONE, 10, "buffer", Local),
        (T::Verb, Tag::NONE, n(counts.num_verbs), "verb", Local),
        (T::String, Tag::NONE, n(counts.num_array), "array", Local),
        (T::FlObject, Tag::NONE, n(counts.num_fl_object), "flobject", Local),
        (T::Matrix, Tag::NONE, 10, "boxes", Local),
        (T::Image, Tag::AWIZ, n(counts.num_images), "images", RoomAddressed),
        (T::Talkie, Tag::TLKE, n(counts.num_talkies), "talkie", RoomAddressed),
    ];

    for (ty, tag, count, name, mode) in allocations {
        table.allocate(ty, tag, count, name, mode)?;
    }
    Ok(())
}
