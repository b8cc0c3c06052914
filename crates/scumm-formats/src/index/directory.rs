//! Per-type resource directories

use super::{MAX_DIRECTORY_ENTRIES, check_declared_count};
use crate::error::{FormatError, Result};
use crate::profile::DirectoryLayout;
use binrw::BinReaderExt;
use std::io::{Read, Seek, SeekFrom, Write};
use tracing::trace;

/// Offset marking a resource that is declared but permanently absent
pub const ABSENT_OFFSET: u32 = 0xFFFF_FFFF;

/// Old-bundle form of [`ABSENT_OFFSET`]
const ABSENT_OFFSET_16: u16 = 0xFFFF;

/// Owning room and offset of every resource of one type
///
/// The three vectors are parallel and indexed by resource number.
/// `global_sizes` is only filled by Humongous Windows directories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceDirectory {
    /// Room whose archive holds each resource
    pub rooms: Vec<u8>,
    /// Offset of each resource inside its room
    pub offsets: Vec<u32>,
    /// Uncompressed global size of each resource
    pub global_sizes: Vec<u32>,
}

impl ResourceDirectory {
    /// Number of entries
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Whether the directory has no entries
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Read a directory payload
    ///
    /// `room_type` selects the room directory quirk of old bundles, where
    /// room `i` always lives in archive `i` and the stored room bytes are
    /// skipped.
    pub fn read<R: Read + Seek>(
        reader: &mut R,
        layout: DirectoryLayout,
        name: &str,
        room_type: bool,
    ) -> Result<Self> {
        let count = match layout {
            DirectoryLayout::Wide => reader.read_le::<u32>()? as usize,
            DirectoryLayout::OldBundle => usize::from(reader.read_le::<u8>()?),
            DirectoryLayout::Standard { .. } | DirectoryLayout::SmallHeader => {
                usize::from(reader.read_le::<u16>()?)
            }
        };
        trace!("{} directory: {} entries ({:?})", name, count, layout);

        let limit = if layout == DirectoryLayout::OldBundle {
            0xFF
        } else {
            MAX_DIRECTORY_ENTRIES
        };
        if count >= limit {
            return Err(FormatError::TooManyEntries {
                name: name.to_string(),
                count,
            });
        }
        check_declared_count(reader, count, entry_width(layout))?;

        let mut dir = Self {
            rooms: vec![0; count],
            offsets: vec![0; count],
            global_sizes: Vec::new(),
        };

        match layout {
            DirectoryLayout::OldBundle => {
                if room_type {
                    for (i, room) in dir.rooms.iter_mut().enumerate() {
                        *room = i as u8;
                    }
                    reader.seek(SeekFrom::Current(count as i64))?;
                } else {
                    reader.read_exact(&mut dir.rooms)?;
                }
                for offset in &mut dir.offsets {
                    let raw: u16 = reader.read_le()?;
                    *offset = if raw == ABSENT_OFFSET_16 {
                        ABSENT_OFFSET
                    } else {
                        u32::from(raw)
                    };
                }
            }
            DirectoryLayout::SmallHeader => {
                for i in 0..count {
                    dir.rooms[i] = reader.read_le()?;
                    dir.offsets[i] = reader.read_le()?;
                }
            }
            DirectoryLayout::Standard { with_sizes } => {
                reader.read_exact(&mut dir.rooms)?;
                for offset in &mut dir.offsets {
                    *offset = reader.read_le()?;
                }
                if with_sizes {
                    dir.global_sizes = (0..count)
                        .map(|_| reader.read_le::<u32>())
                        .collect::<binrw::BinResult<_>>()?;
                }
            }
            DirectoryLayout::Wide => {
                reader.read_exact(&mut dir.rooms)?;
                for offset in &mut dir.offsets {
                    *offset = reader.read_le()?;
                }
            }
        }

        Ok(dir)
    }

    /// Write a directory payload in `layout`
    pub fn write<W: Write>(&self, writer: &mut W, layout: DirectoryLayout) -> Result<()> {
        let count = self.len();
        match layout {
            DirectoryLayout::Wide => writer.write_all(&(count as u32).to_le_bytes())?,
            DirectoryLayout::OldBundle => writer.write_all(&[count as u8])?,
            DirectoryLayout::Standard { .. } | DirectoryLayout::SmallHeader => {
                writer.write_all(&(count as u16).to_le_bytes())?;
            }
        }

        match layout {
            DirectoryLayout::OldBundle => {
                writer.write_all(&self.rooms)?;
                for &offset in &self.offsets {
                    let raw = if offset == ABSENT_OFFSET {
                        ABSENT_OFFSET_16
                    } else {
                        offset as u16
                    };
                    writer.write_all(&raw.to_le_bytes())?;
                }
            }
            DirectoryLayout::SmallHeader => {
                for (room, offset) in self.rooms.iter().zip(&self.offsets) {
                    writer.write_all(&[*room])?;
                    writer.write_all(&offset.to_le_bytes())?;
                }
            }
            DirectoryLayout::Standard { with_sizes } => {
                writer.write_all(&self.rooms)?;
                for offset in &self.offsets {
                    writer.write_all(&offset.to_le_bytes())?;
                }
                if with_sizes {
                    for i in 0..count {
                        let size = self.global_sizes.get(i).copied().unwrap_or(0);
                        writer.write_all(&size.to_le_bytes())?;
                    }
                }
            }
            DirectoryLayout::Wide => {
                writer.write_all(&self.rooms)?;
                for offset in &self.offsets {
                    writer.write_all(&offset.to_le_bytes())?;
                }
            }
        }
        Ok(())
    }

    /// Encode a directory payload in `layout`
    pub fn to_bytes(&self, layout: DirectoryLayout) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write(&mut out, layout)?;
        Ok(out)
    }
}

/// Bytes one entry occupies after the count
const fn entry_width(layout: DirectoryLayout) -> usize {
    match layout {
        DirectoryLayout::OldBundle => 3,
        DirectoryLayout::Standard { with_sizes: true } => 9,
        DirectoryLayout::Standard { with_sizes: false }
        | DirectoryLayout::SmallHeader
        | DirectoryLayout::Wide => 5,
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn sample() -> ResourceDirectory {
        ResourceDirectory {
            rooms: vec![0, 1, 2],
            offsets: vec![0, 0x1234, ABSENT_OFFSET],
            global_sizes: Vec::new(),
        }
    }

    #[test]
    fn test_standard_layout_bytes() {
        let bytes = sample()
            .to_bytes(DirectoryLayout::Standard { with_sizes: false })
            .unwrap();
        assert_eq!(
            bytes,
            vec![
                3, 0, // count
                0, 1, 2, // rooms
                0, 0, 0, 0, 0x34, 0x12, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF,
            ]
        );
        let dir = ResourceDirectory::read(
            &mut Cursor::new(bytes),
            DirectoryLayout::Standard { with_sizes: false },
            "script",
            false,
        )
        .unwrap();
        assert_eq!(dir, sample());
    }

    #[test]
    fn test_small_header_layout_is_interleaved() {
        let bytes = sample().to_bytes(DirectoryLayout::SmallHeader).unwrap();
        assert_eq!(&bytes[..2], &[3, 0]);
        assert_eq!(&bytes[2..7], &[0, 0, 0, 0, 0]);
        assert_eq!(&bytes[7..12], &[1, 0x34, 0x12, 0, 0]);
    }

    #[test]
    fn test_he_sizes() {
        let mut dir = sample();
        dir.global_sizes = vec![10, 20, 30];
        let layout = DirectoryLayout::Standard { with_sizes: true };
        let read =
            ResourceDirectory::read(&mut Cursor::new(dir.to_bytes(layout).unwrap()), layout, "image", false)
                .unwrap();
        assert_eq!(read.global_sizes, vec![10, 20, 30]);
    }

    #[test]
    fn test_old_bundle_rooms_and_sentinel() {
        let bytes = vec![
            2, // count
            7, 7, // room bytes, ignored for the room directory
            0x10, 0x00, 0xFF, 0xFF,
        ];
        let dir = ResourceDirectory::read(
            &mut Cursor::new(bytes.clone()),
            DirectoryLayout::OldBundle,
            "room",
            true,
        )
        .unwrap();
        assert_eq!(dir.rooms, vec![0, 1]);
        assert_eq!(dir.offsets, vec![0x10, ABSENT_OFFSET]);

        let dir = ResourceDirectory::read(
            &mut Cursor::new(bytes),
            DirectoryLayout::OldBundle,
            "script",
            false,
        )
        .unwrap();
        assert_eq!(dir.rooms, vec![7, 7]);
    }

    #[test]
    fn test_old_bundle_too_many() {
        let err = ResourceDirectory::read(
            &mut Cursor::new(vec![0xFF]),
            DirectoryLayout::OldBundle,
            "sound",
            false,
        )
        .unwrap_err();
        assert!(matches!(err, FormatError::TooManyEntries { count: 255, .. }));
    }

    #[test]
    fn test_wide_layout() {
        let layout = DirectoryLayout::Wide;
        let bytes = sample().to_bytes(layout).unwrap();
        assert_eq!(&bytes[..4], &[3, 0, 0, 0]);
        let dir = ResourceDirectory::read(&mut Cursor::new(bytes), layout, "costume", false)
            .unwrap();
        assert_eq!(dir, sample());
    }

    #[test]
    fn test_truncated_directory() {
        let err = ResourceDirectory::read(
            &mut Cursor::new(vec![5, 0, 1, 2]),
            DirectoryLayout::Standard { with_sizes: false },
            "script",
            false,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            FormatError::Truncated {
                needed: 25,
                available: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_wide_count_over_ceiling() {
        let mut bytes = 0xFFFF_FFF0u32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0; 4]);
        let err = ResourceDirectory::read(&mut Cursor::new(bytes), DirectoryLayout::Wide, "room", false)
            .unwrap_err();
        assert!(matches!(err, FormatError::TooManyEntries { .. }));
        assert!(err.is_corruption());
    }

    #[test]
    fn test_count_larger_than_payload() {
        // 4000 entries declared, room for one
        let mut bytes = 4000u32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0; 5]);
        let err = ResourceDirectory::read(&mut Cursor::new(bytes), DirectoryLayout::Wide, "sound", false)
            .unwrap_err();
        assert!(matches!(
            err,
            FormatError::Truncated {
                needed: 20_000,
                available: 5,
                ..
            }
        ));
    }
}
