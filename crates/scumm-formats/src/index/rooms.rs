//! Room offset tables and audio names

use crate::error::Result;
use binrw::BinReaderExt;
use std::io::{Read, Seek, Write};

/// Length of one audio name record
const AUDIO_NAME_LEN: usize = 9;

/// Room offset table stored inside a disk archive (`LOFF`)
///
/// Each entry gives the byte offset of a room's container within the
/// archive file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomOffsetTable {
    /// `(room, offset)` pairs in file order
    pub entries: Vec<(u8, u32)>,
}

impl RoomOffsetTable {
    /// Read `count: u8` followed by `room: u8, offset: u32le` pairs
    pub fn read<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let count: u8 = reader.read_le()?;
        let entries = (0..count)
            .map(|_| -> binrw::BinResult<(u8, u32)> { Ok((reader.read_le()?, reader.read_le()?)) })
            .collect::<binrw::BinResult<_>>()?;
        Ok(Self { entries })
    }

    /// Encode the table
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + self.entries.len() * 5);
        out.push(self.entries.len() as u8);
        for (room, offset) in &self.entries {
            out.push(*room);
            out.extend_from_slice(&offset.to_le_bytes());
        }
        out
    }
}

/// Humongous room offset table (`DLFL`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeRoomOffsets {
    /// Offset of every room, indexed by room number
    pub offsets: Vec<u32>,
}

impl HeRoomOffsets {
    /// Read `count: u16le` followed by `count` `u32le` offsets
    pub fn read<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let count: u16 = reader.read_le()?;
        let offsets = (0..count)
            .map(|_| reader.read_le::<u32>())
            .collect::<binrw::BinResult<_>>()?;
        Ok(Self { offsets })
    }

    /// Encode the table
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(2 + self.offsets.len() * 4);
        out.extend_from_slice(&(self.offsets.len() as u16).to_le_bytes());
        for offset in &self.offsets {
            out.extend_from_slice(&offset.to_le_bytes());
        }
        out
    }
}

/// Read the audio name table (`ANAM`): `count: u16le` then 9-byte names
pub fn read_audio_names<R: Read + Seek>(reader: &mut R) -> Result<Vec<String>> {
    let count: u16 = reader.read_le()?;
    let mut names = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        let mut raw = [0u8; AUDIO_NAME_LEN];
        reader.read_exact(&mut raw)?;
        let end = raw.iter().position(|&b| b == 0).unwrap_or(AUDIO_NAME_LEN);
        names.push(String::from_utf8_lossy(&raw[..end]).into_owned());
    }
    Ok(names)
}

/// Write an audio name table; names longer than 8 bytes are cut
pub fn write_audio_names<W: Write>(writer: &mut W, names: &[String]) -> Result<()> {
    writer.write_all(&(names.len() as u16).to_le_bytes())?;
    for name in names {
        let mut raw = [0u8; AUDIO_NAME_LEN];
        let len = name.len().min(AUDIO_NAME_LEN - 1);
        raw[..len].copy_from_slice(&name.as_bytes()[..len]);
        writer.write_all(&raw)?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_room_offset_table() {
        let table = RoomOffsetTable {
            entries: vec![(1, 0x20), (3, 0x1000)],
        };
        let bytes = table.to_bytes();
        assert_eq!(bytes, vec![2, 1, 0x20, 0, 0, 0, 3, 0, 0x10, 0, 0]);
        assert_eq!(RoomOffsetTable::read(&mut Cursor::new(bytes)).unwrap(), table);
    }

    #[test]
    fn test_he_room_offsets() {
        let table = HeRoomOffsets {
            offsets: vec![0, 100, 200],
        };
        let read = HeRoomOffsets::read(&mut Cursor::new(table.to_bytes())).unwrap();
        assert_eq!(read, table);
    }

    #[test]
    fn test_audio_names() {
        let names = vec!["BOOM".to_string(), "VOICE001".to_string()];
        let mut out = Vec::new();
        write_audio_names(&mut out, &names).unwrap();
        assert_eq!(out.len(), 2 + 18);
        assert_eq!(read_audio_names(&mut Cursor::new(out)).unwrap(), names);
    }
}
