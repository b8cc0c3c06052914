//! Chunk headers in every dialect
//!
//! A chunk's declared size always covers its own header. The header is the
//! only source of a resource's on-disk size; consumers of a loaded block use
//! [`data_size`] to find the payload length behind it.

use crate::error::{FormatError, Result};
use crate::profile::HeaderDialect;
use crate::tag::{SmallTag, Tag};
use binrw::{BinRead, BinReaderExt, BinWrite};
use std::io::{Read, Seek};

/// Tag carried by a chunk header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkTag {
    /// Standard 4-byte tag
    Standard(Tag),
    /// Small-header or old-bundle 2-byte tag
    Small(SmallTag),
}

impl ChunkTag {
    /// Whether this chunk tag is the dialect form of `tag`
    pub fn matches(&self, tag: Tag) -> bool {
        match self {
            Self::Standard(found) => *found == tag,
            Self::Small(found) => tag.to_small() == Some(*found),
        }
    }
}

impl std::fmt::Display for ChunkTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standard(tag) => tag.fmt(f),
            Self::Small(tag) => tag.fmt(f),
        }
    }
}

/// Standard chunk header: `[tag][size: u32be]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(big)]
pub struct StandardHeader {
    /// Chunk tag
    pub tag: Tag,
    /// Chunk size including this header
    pub size: u32,
}

/// Small-header chunk header: `[size: u32le][tag]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct SmallHeader {
    /// Chunk size including this header
    pub size: u32,
    /// Chunk tag
    pub tag: SmallTag,
}

/// Old-bundle chunk header: `[size: u16le][tag]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct OldBundleHeader {
    /// Chunk size including this header
    pub size: u16,
    /// Chunk tag
    pub tag: SmallTag,
}

/// A chunk header decoded in any dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    /// Chunk tag
    pub tag: ChunkTag,
    /// Chunk size including the header
    pub size: u32,
    /// Dialect the header was decoded with
    pub dialect: HeaderDialect,
}

impl ChunkHeader {
    /// Read a header from a stream
    pub fn read<R: Read + Seek>(reader: &mut R, dialect: HeaderDialect) -> Result<Self> {
        let (tag, size) = match dialect {
            HeaderDialect::Standard => {
                let header: StandardHeader = reader.read_be()?;
                (ChunkTag::Standard(header.tag), header.size)
            }
            HeaderDialect::SmallHeader => {
                let header: SmallHeader = reader.read_le()?;
                (ChunkTag::Small(header.tag), header.size)
            }
            HeaderDialect::OldBundle => {
                let header: OldBundleHeader = reader.read_le()?;
                (ChunkTag::Small(header.tag), u32::from(header.size))
            }
        };
        Ok(Self { tag, size, dialect })
    }

    /// Decode a header at the start of `data`
    pub fn parse(data: &[u8], dialect: HeaderDialect) -> Result<Self> {
        let needed = dialect.header_size();
        if data.len() < needed {
            return Err(FormatError::Truncated {
                offset: 0,
                needed,
                available: data.len(),
            });
        }
        let mut cursor = std::io::Cursor::new(&data[..needed]);
        Self::read(&mut cursor, dialect)
    }

    /// Size of the header itself
    pub const fn header_size(&self) -> usize {
        self.dialect.header_size()
    }

    /// Payload size behind the header
    pub const fn data_size(&self) -> u32 {
        self.size.saturating_sub(self.dialect.header_size() as u32)
    }
}

/// Payload size of a loaded block, read from its own header
///
/// Old bundles store the size as `u16le`, small headers as `u32le`, and
/// standard chunks as `u32be` after the tag. A block too short to hold its
/// header has no payload.
pub fn data_size(block: &[u8], dialect: HeaderDialect) -> u32 {
    ChunkHeader::parse(block, dialect).map_or(0, |header| header.data_size())
}

/// Build a standard chunk around `payload`
pub fn build_block(tag: Tag, payload: &[u8]) -> Vec<u8> {
    let size = (payload.len() + 8) as u32;
    let mut out = Vec::with_capacity(payload.len() + 8);
    out.extend_from_slice(tag.as_bytes());
    out.extend_from_slice(&size.to_be_bytes());
    out.extend_from_slice(payload);
    out
}

/// Build a small-header chunk around `payload`
pub fn build_small_block(tag: SmallTag, payload: &[u8]) -> Vec<u8> {
    let size = (payload.len() + 6) as u32;
    let mut out = Vec::with_capacity(payload.len() + 6);
    out.extend_from_slice(&size.to_le_bytes());
    out.extend_from_slice(&tag.0);
    out.extend_from_slice(payload);
    out
}

/// Build an old-bundle chunk around `payload`
///
/// Payloads that do not fit a 16-bit size are truncated to fit.
pub fn build_old_block(tag: SmallTag, payload: &[u8]) -> Vec<u8> {
    let len = payload.len().min(usize::from(u16::MAX) - 4);
    let size = (len + 4) as u16;
    let mut out = Vec::with_capacity(len + 4);
    out.extend_from_slice(&size.to_le_bytes());
    out.extend_from_slice(&tag.0);
    out.extend_from_slice(&payload[..len]);
    out
}
