//! Tag scanner for chunked blocks
//!
//! A loaded block is one chunk whose payload is a sequence of child chunks.
//! The scanner walks the children of a block looking for a tag and returns
//! the matching child, header included. Every read is bounds-checked against
//! the buffer, so a truncated or lying block yields an error rather than an
//! out-of-range access.

use crate::error::{FormatError, Result};
use crate::tag::Tag;
use tracing::trace;

fn read_u32_be(data: &[u8], offset: usize) -> Result<u32> {
    data.get(offset..offset + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(FormatError::Truncated {
            offset,
            needed: 4,
            available: data.len().saturating_sub(offset),
        })
}

fn read_u32_le(data: &[u8], offset: usize) -> Result<u32> {
    data.get(offset..offset + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(FormatError::Truncated {
            offset,
            needed: 4,
            available: data.len().saturating_sub(offset),
        })
}

fn read_tag(data: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    data.get(offset..offset + len).ok_or(FormatError::Truncated {
        offset,
        needed: len,
        available: data.len().saturating_sub(offset),
    })
}

/// Child chunk starting at `start` with declared `size`, clamped to the buffer
fn child(data: &[u8], start: usize, size: u32) -> &[u8] {
    let end = start.saturating_add(size as usize).min(data.len());
    &data[start..end]
}

/// Find the first child chunk tagged `tag` in a standard block
///
/// The outer block's size (`u32be` at offset 4) bounds the walk. A child
/// with a non-positive size is reported as [`FormatError::InvalidChunkSize`].
pub fn find_tag(tag: Tag, block: &[u8]) -> Result<Option<&[u8]>> {
    let total = read_u32_be(block, 4)? as usize;
    let mut pos = 8usize;

    while pos < total {
        if read_tag(block, pos, 4)? == tag.as_bytes() {
            let size = read_u32_be(block, pos + 4)?;
            trace!("found '{}' at offset {}", tag, pos);
            return Ok(Some(child(block, pos, size)));
        }

        let size = read_u32_be(block, pos + 4)?;
        if size as i32 <= 0 {
            return Err(FormatError::InvalidChunkSize {
                tag,
                size: i64::from(size as i32),
            });
        }
        pos += size as usize;
    }

    Ok(None)
}

/// Find the first child chunk whose 2-byte tag maps from `tag` in a small-header block
///
/// Tags without a small-header form are never found.
pub fn find_tag_small(tag: Tag, block: &[u8]) -> Result<Option<&[u8]>> {
    let Some(small) = tag.to_small() else {
        return Ok(None);
    };

    let total = read_u32_le(block, 0)? as usize;
    let mut pos = 6usize;

    while pos < total {
        let size = read_u32_le(block, pos)?;
        if read_tag(block, pos + 4, 2)? == small.0 {
            trace!("found '{}' at offset {}", small, pos);
            return Ok(Some(child(block, pos, size)));
        }

        if size as i32 <= 0 {
            return Err(FormatError::InvalidChunkSize {
                tag,
                size: i64::from(size as i32),
            });
        }
        pos += size as usize;
    }

    Ok(None)
}

/// Resumable search over the children of one block
///
/// Unlike [`find_tag`], a child with a non-positive size ends the walk
/// quietly, and truncated children end it as well.
#[derive(Debug, Clone)]
pub struct ChunkIter<'a> {
    data: &'a [u8],
    total: usize,
    pos: usize,
    small: bool,
}

impl<'a> ChunkIter<'a> {
    /// Start iterating the children of `block`
    pub fn new(block: &'a [u8], small: bool) -> Self {
        let (total, pos) = if small {
            (read_u32_le(block, 0).unwrap_or(0) as usize, 6)
        } else {
            (read_u32_be(block, 4).unwrap_or(0) as usize, 8)
        };
        Self {
            data: block,
            total,
            pos,
            small,
        }
    }

    /// Advance to the next child tagged `tag`
    pub fn find_next(&mut self, tag: Tag) -> Option<&'a [u8]> {
        let small = if self.small {
            Some(tag.to_small()?)
        } else {
            None
        };

        loop {
            let (start, size) = self.step()?;
            let matched = match small {
                Some(small) => self.data.get(start + 4..start + 6) == Some(&small.0[..]),
                None => self.data.get(start..start + 4) == Some(&tag.as_bytes()[..]),
            };
            if matched {
                return Some(child(self.data, start, size));
            }
        }
    }

    fn step(&mut self) -> Option<(usize, u32)> {
        if self.pos >= self.total {
            return None;
        }
        let start = self.pos;
        let size = if self.small {
            read_u32_le(self.data, start).ok()?
        } else {
            read_u32_be(self.data, start + 4).ok()?
        };
        if size as i32 <= 0 {
            return None;
        }
        self.pos += size as usize;
        Some((start, size))
    }
}

impl<'a> Iterator for ChunkIter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let (start, size) = self.step()?;
        Some(child(self.data, start, size))
    }
}
