//! Cache-miss path: archive bytes into a resident slot
//!
//! The loader maps a resource to its owning room, asks the locator for that
//! room's archive, decodes the chunk header in the profile's dialect and
//! reads the whole chunk (header included) into the slot. Sounds are a
//! container of alternative encodings; the first sub-block with an
//! accepted tag is what gets cached. Standard sound sub-blocks declare
//! their size without the 8-byte header.

use crate::config::ResourceConfig;
use crate::error::{ResourceError, Result};
use crate::evictor::Evictor;
use crate::liveness::LivenessRegistry;
use crate::locator::{ArchiveLocator, ArchiveStream};
use crate::table::ResourceTable;
use crate::types::ResourceType;
use scumm_formats::chunk::ChunkHeader;
use scumm_formats::{
    ChunkTag, Features, FormatError, FormatProfile, HeaderDialect, SmallTag, Tag,
};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Offset of a room's own chunk inside its archive for version 8
const V8_ROOM_OFFSET: u32 = 8;

/// Bytes some small-header revisions keep in front of every resource
const SMALL_HEADER_PREFIX: i64 = 8;

/// Version 3 sound encodings, in the order they follow each other on disk
const OLD_SPEAKER: SmallTag = SmallTag(*b"WA");
const OLD_ADLIB: SmallTag = SmallTag(*b"AD");

/// Borrowed view of the manager state one load needs
pub(crate) struct Loader<'a> {
    pub(crate) profile: &'a FormatProfile,
    pub(crate) config: &'a ResourceConfig,
    pub(crate) locator: &'a mut ArchiveLocator,
    pub(crate) table: &'a mut ResourceTable,
    pub(crate) evictor: &'a mut Evictor,
    pub(crate) liveness: &'a LivenessRegistry,
    pub(crate) current_room: Option<u16>,
    pub(crate) he_room_internal_offsets: &'a [u32],
}

/// Where a resource's chunk starts
struct Placement {
    room: u16,
    offset: u32,
}

impl Loader<'_> {
    /// Load `(ty, index)` into its slot
    ///
    /// `Ok(false)` means the resource is absent: out of range, marked with
    /// the sentinel offset, or a sound with no playable encoding.
    pub(crate) fn load(&mut self, ty: ResourceType, index: usize) -> Result<bool> {
        debug!("loadResource({},{})", ty, index);
        if self.table.table(ty).is_none() {
            return Err(ResourceError::TypeNotAllocated(ty.name()));
        }
        if !self.table.validate("loadResource", ty, index) {
            return Ok(false);
        }

        let Some(placement) = self.placement(ty, index) else {
            trace!("{} {} is marked absent", ty, index);
            return Ok(false);
        };

        self.locator
            .open_room(placement.room, self.table.entries_mut(ResourceType::Room))?;
        let base = self.locator.file_offset();
        let start = u64::from(base) + u64::from(placement.offset);
        trace!(
            "{} {} in room {} at {}+{} in {}",
            ty,
            index,
            placement.room,
            base,
            placement.offset,
            self.locator.current_file()
        );

        let dialect = self.profile.header_dialect();
        let stream = self.locator.stream()?;
        stream.seek(SeekFrom::Start(start))?;

        let size = match dialect {
            HeaderDialect::OldBundle => {
                if ty == ResourceType::Sound
                    && self.profile.version == 3
                    && !self.profile.has(Features::AMIGA)
                {
                    return self.load_old_bundle_sound(ty, index);
                }
                peek_header(stream, dialect)?.size
            }
            HeaderDialect::SmallHeader => {
                if !self.profile.has(Features::SMALL_NAMES) {
                    stream.seek(SeekFrom::Current(SMALL_HEADER_PREFIX))?;
                }
                if ty == ResourceType::Sound
                    && !self.profile.has(Features::AMIGA)
                    && !self.profile.has(Features::FMTOWNS)
                {
                    return self.load_sound(ty, index, dialect);
                }
                peek_header(stream, dialect)?.size
            }
            HeaderDialect::Standard => {
                if ty == ResourceType::Sound {
                    return self.load_sound(ty, index, dialect);
                }
                let header = peek_header(stream, dialect)?;
                if self.profile.has_tag_check() {
                    let expected = self
                        .table
                        .table(ty)
                        .map_or(Tag::NONE, |table| table.tag);
                    if let ChunkTag::Standard(found) = header.tag
                        && found != expected
                    {
                        return Err(ResourceError::TagMismatch {
                            type_name: ty.name(),
                            index,
                            room: placement.room,
                            expected,
                            found,
                            archive: self.locator.current_file().to_string(),
                            archive_offset: base,
                            offset: placement.offset,
                        });
                    }
                }
                header.size
            }
        };

        self.read_into_slot(ty, index, size as usize, dialect)?;
        Ok(true)
    }

    /// Owning room and chunk offset, `None` for absent resources
    fn placement(&self, ty: ResourceType, index: usize) -> Option<Placement> {
        let entry = self.table.entry(ty, index).unwrap_or_default();

        if ty == ResourceType::Room {
            let offset = if self.profile.version == 8 {
                V8_ROOM_OFFSET
            } else if self.profile.is_he_windows() {
                self.he_room_internal_offsets
                    .get(index)
                    .copied()
                    .unwrap_or(0)
            } else {
                0
            };
            let room = if self.profile.version == 8 || !self.profile.is_he_windows() {
                u16::try_from(index).unwrap_or(u16::MAX)
            } else {
                u16::from(entry.room)
            };
            return Some(Placement { room, offset });
        }

        if entry.is_absent() {
            return None;
        }

        let room = if entry.room == 0 {
            self.current_room.unwrap_or(0)
        } else {
            u16::from(entry.room)
        };
        Some(Placement {
            room,
            offset: entry.offset,
        })
    }

    /// Scan a sound container for the first sub-block with an accepted tag
    fn load_sound(&mut self, ty: ResourceType, index: usize, dialect: HeaderDialect) -> Result<bool> {
        let small = dialect == HeaderDialect::SmallHeader;
        let standard_tags = self.config.sound_tags();
        let small_tags = self.config.small_sound_tags();
        let stream = self.locator.stream()?;

        let outer_start = stream.stream_position()?;
        let outer = ChunkHeader::read(stream, dialect)?;
        let end = outer_start + u64::from(outer.size);
        let header_size = dialect.header_size() as u64;

        let mut pos = outer_start + header_size;
        let mut found = None;
        while pos + header_size <= end {
            stream.seek(SeekFrom::Start(pos))?;
            let child = ChunkHeader::read(stream, dialect)?;
            let span = if small {
                if u64::from(child.size) < header_size {
                    return Err(FormatError::InvalidChunkSize {
                        tag: chunk_tag_as_tag(child.tag),
                        size: i64::from(child.size),
                    }
                    .into());
                }
                u64::from(child.size)
            } else {
                u64::from(child.size) + header_size
            };
            let accepted = match child.tag {
                ChunkTag::Standard(tag) => !small && standard_tags.contains(&tag),
                ChunkTag::Small(tag) => small && small_tags.contains(&tag),
            };
            if accepted {
                trace!("sound {} uses '{}' sub-block", index, child.tag);
                found = Some((pos, span));
                break;
            }
            pos += span;
        }

        let Some((pos, size)) = found else {
            debug!("sound {} has no playable sub-block, marking absent", index);
            self.table.mark_absent(ty, index);
            return Ok(false);
        };

        stream.seek(SeekFrom::Start(pos))?;
        let size = usize::try_from(size).unwrap_or(usize::MAX);
        self.read_into_slot(ty, index, size, dialect)?;
        Ok(true)
    }

    /// Version 3 sound: a speaker block followed by an AdLib block
    ///
    /// Each block starts with a `u16le` size covering the whole block. The
    /// AdLib block is preferred when both are accepted.
    fn load_old_bundle_sound(&mut self, ty: ResourceType, index: usize) -> Result<bool> {
        let dialect = HeaderDialect::OldBundle;
        let accepted = self.config.small_sound_tags();
        let stream = self.locator.stream()?;

        let speaker_start = stream.stream_position()?;
        let speaker = ChunkHeader::read(stream, dialect)?;
        let mut encodings = Vec::with_capacity(2);

        let adlib_start = speaker_start + u64::from(speaker.size);
        if remaining(stream, adlib_start)? >= dialect.header_size() as u64 {
            stream.seek(SeekFrom::Start(adlib_start))?;
            let adlib = ChunkHeader::read(stream, dialect)?;
            if adlib.size > 0 {
                encodings.push((OLD_ADLIB, adlib_start, adlib.size));
            }
        }
        encodings.push((OLD_SPEAKER, speaker_start, speaker.size));

        let Some((tag, start, size)) = encodings
            .into_iter()
            .find(|(tag, ..)| accepted.contains(tag))
        else {
            debug!("sound {} has no playable encoding, marking absent", index);
            self.table.mark_absent(ty, index);
            return Ok(false);
        };

        trace!("sound {} uses the '{}' encoding", index, tag);
        let stream = self.locator.stream()?;
        stream.seek(SeekFrom::Start(start))?;
        self.read_into_slot(ty, index, size as usize, dialect)?;
        Ok(true)
    }

    /// Reserve, read `size` bytes at the stream position, install
    fn read_into_slot(
        &mut self,
        ty: ResourceType,
        index: usize,
        size: usize,
        dialect: HeaderDialect,
    ) -> Result<()> {
        if size < dialect.header_size() {
            return Err(FormatError::InvalidChunkSize {
                tag: self.table.table(ty).map_or(Tag::NONE, |table| table.tag),
                size: size as i64,
            }
            .into());
        }

        let stream = self.locator.stream()?;
        let position = stream.stream_position()?;
        let available = remaining(stream, position)?;
        if size as u64 > available {
            return Err(ResourceError::ReadFailed {
                type_name: ty.name(),
                index,
                source: std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!("block declares {size} bytes, {available} left in archive"),
                ),
            });
        }

        let liveness = self.liveness;
        let current_room = self.current_room;
        self.evictor.reserve(self.table, size, |t, i| {
            liveness.is_in_use(t, i, current_room)
        });

        let stream = self.locator.stream()?;
        let mut data = vec![0u8; size];
        stream
            .read_exact(&mut data)
            .map_err(|source| ResourceError::ReadFailed {
                type_name: ty.name(),
                index,
                source,
            })?;
        self.table.install(ty, index, data)?;

        if self.config.dump_scripts
            && ty == ResourceType::Script
            && let Some(block) = self.table.data(ty, index)
        {
            if let Err(e) = dump_block(&self.config.dump_dir, "script-", index, block, dialect) {
                warn!("cannot dump script {}: {}", index, e);
            }
        }
        Ok(())
    }
}

/// Read a chunk header and rewind to its start
fn peek_header(stream: &mut ArchiveStream, dialect: HeaderDialect) -> Result<ChunkHeader> {
    let header = ChunkHeader::read(stream, dialect)?;
    stream.seek(SeekFrom::Current(-(dialect.header_size() as i64)))?;
    Ok(header)
}

/// Bytes from `from` to the end of the stream, leaving the position at `from`
fn remaining(stream: &mut ArchiveStream, from: u64) -> Result<u64> {
    let end = stream.seek(SeekFrom::End(0))?;
    stream.seek(SeekFrom::Start(from))?;
    Ok(end.saturating_sub(from))
}

fn chunk_tag_as_tag(tag: ChunkTag) -> Tag {
    match tag {
        ChunkTag::Standard(tag) => tag,
        ChunkTag::Small(SmallTag([a, b])) => Tag::new([a, b, b' ', b' ']),
    }
}

/// Write a loaded block to `<dir>/<prefix><index>.dmp`
///
/// The size comes from the block's own header, clamped to what is held.
pub(crate) fn dump_block(
    dir: &Path,
    prefix: &str,
    index: usize,
    block: &[u8],
    dialect: HeaderDialect,
) -> std::io::Result<PathBuf> {
    let size = ChunkHeader::parse(block, dialect)
        .map_or(block.len(), |header| header.size as usize)
        .min(block.len());
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{prefix}{index}.dmp"));
    std::fs::write(&path, &block[..size])?;
    debug!("dumped {} bytes to {}", size, path.display());
    Ok(path)
}
