//! Index file blocks
//!
//! The index file is a flat sequence of `[tag][size: u32be][payload]` blocks.
//! This module recognizes the block tags and parses each payload kind; the
//! order of blocks and what to do with them is up to the caller.

mod arrays;
mod directory;
mod maxs;
mod objects;
mod rooms;

pub use arrays::{ArrayDefinition, ArrayKind, read_array_definitions, write_array_definitions};
pub use directory::{ABSENT_OFFSET, ResourceDirectory};
pub use maxs::{
    GameCounts, MaxsClassic, MaxsHe9x, MaxsHe72, MaxsHeCpp, MaxsV6, MaxsV7, MaxsV8,
    NUM_SHADOW_PALETTE, read_sizing_block,
};
pub use objects::{NO_OWNER, ObjectTable};
pub use rooms::{HeRoomOffsets, RoomOffsetTable, read_audio_names, write_audio_names};

use crate::error::{FormatError, Result};
use crate::tag::Tag;
use binrw::{BinRead, BinReaderExt, BinWrite};
use std::io::{Read, Seek, SeekFrom};

/// Most entries a resource directory may declare
pub const MAX_DIRECTORY_ENTRIES: usize = 8000;

/// Reject a declared count whose records cannot fit in what is left of `reader`
///
/// Runs before any per-entry allocation, so a corrupt count never reaches
/// the allocator.
pub(crate) fn check_declared_count<R: Seek>(
    reader: &mut R,
    count: usize,
    entry_width: usize,
) -> Result<()> {
    let pos = reader.stream_position()?;
    let end = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(pos))?;

    let available = usize::try_from(end.saturating_sub(pos)).unwrap_or(usize::MAX);
    let needed = count.saturating_mul(entry_width);
    if needed > available {
        return Err(FormatError::Truncated {
            offset: usize::try_from(pos).unwrap_or(usize::MAX),
            needed,
            available,
        });
    }
    Ok(())
}

/// Header in front of every index block
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(big)]
pub struct BlockHeader {
    /// Block tag
    pub tag: Tag,
    /// Block size including this header
    pub size: u32,
}

impl BlockHeader {
    /// Encoded size of the header
    pub const SIZE: u32 = 8;

    /// Payload bytes behind the header
    pub const fn payload_size(&self) -> u32 {
        self.size.saturating_sub(Self::SIZE)
    }
}

/// Read the next block header, or `None` at the end of the stream
///
/// A partial header at the end of the file also counts as the end.
pub fn read_block_header<R: Read + Seek>(reader: &mut R) -> Result<Option<BlockHeader>> {
    match reader.read_be::<BlockHeader>() {
        Ok(header) => Ok(Some(header)),
        Err(e) if e.is_eof() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Build an index block around `payload`
pub fn build_index_block(tag: Tag, payload: &[u8]) -> Vec<u8> {
    crate::chunk::build_block(tag, payload)
}

/// Every block kind an index file may contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexBlock {
    /// `DCHR` / `DIRF`: charset directory
    Charsets,
    /// `DOBJ`: global object directory
    Objects,
    /// `RNAM`: room names
    RoomNames,
    /// `DLFL`: Humongous room offsets
    HeRoomOffsets,
    /// `DIRM`: image directory
    Images,
    /// `DIRT`: talkie directory
    Talkies,
    /// `SVER`: server version
    ServerVersion,
    /// `DISK`: disk table
    Disk,
    /// `INIB`: init block
    Init,
    /// `DIRI`: room image directory
    RoomImages,
    /// `ANAM`: audio names
    AudioNames,
    /// `DIRR` / `DROO`: room directory
    Rooms,
    /// `DRSC`: room script directory
    RoomScripts,
    /// `DSCR` / `DIRS`: script directory
    Scripts,
    /// `DCOS` / `DIRC`: costume directory
    Costumes,
    /// `MAXS`: sizing block
    Sizing,
    /// `DIRN` / `DSOU`: sound directory
    Sounds,
    /// `AARY`: array definitions
    Arrays,
}

impl IndexBlock {
    /// Recognize a block tag
    pub fn from_tag(tag: Tag) -> Option<Self> {
        let block = match tag.as_bytes() {
            b"DCHR" | b"DIRF" => Self::Charsets,
            b"DOBJ" => Self::Objects,
            b"RNAM" => Self::RoomNames,
            b"DLFL" => Self::HeRoomOffsets,
            b"DIRM" => Self::Images,
            b"DIRT" => Self::Talkies,
            b"SVER" => Self::ServerVersion,
            b"DISK" => Self::Disk,
            b"INIB" => Self::Init,
            b"DIRI" => Self::RoomImages,
            b"ANAM" => Self::AudioNames,
            b"DIRR" | b"DROO" => Self::Rooms,
            b"DRSC" => Self::RoomScripts,
            b"DSCR" | b"DIRS" => Self::Scripts,
            b"DCOS" | b"DIRC" => Self::Costumes,
            b"MAXS" => Self::Sizing,
            b"DIRN" | b"DSOU" => Self::Sounds,
            b"AARY" => Self::Arrays,
            _ => return None,
        };
        Some(block)
    }

    /// Whether the block is skipped without interpretation
    pub const fn is_skipped(self) -> bool {
        matches!(
            self,
            Self::RoomNames | Self::ServerVersion | Self::Disk | Self::Init
        )
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_block_header_eof() {
        let mut data = build_index_block(Tag::new(*b"RNAM"), &[0; 3]);
        data.extend_from_slice(b"DRO");
        let mut cursor = Cursor::new(data);

        let header = read_block_header(&mut cursor).unwrap().unwrap();
        assert_eq!(header.tag, Tag::new(*b"RNAM"));
        assert_eq!(header.size, 11);
        assert_eq!(header.payload_size(), 3);

        cursor.set_position(11);
        assert!(read_block_header(&mut cursor).unwrap().is_none());
    }

    #[test]
    fn test_block_tags() {
        assert_eq!(
            IndexBlock::from_tag(Tag::new(*b"DROO")),
            Some(IndexBlock::Rooms)
        );
        assert_eq!(
            IndexBlock::from_tag(Tag::new(*b"DIRR")),
            Some(IndexBlock::Rooms)
        );
        assert_eq!(
            IndexBlock::from_tag(Tag::new(*b"MAXS")),
            Some(IndexBlock::Sizing)
        );
        assert!(IndexBlock::Disk.is_skipped());
        assert!(!IndexBlock::Scripts.is_skipped());
        assert_eq!(IndexBlock::from_tag(Tag::new(*b"XXXX")), None);
    }
}
