//! Global object directory (`DOBJ`)

use super::check_declared_count;
use crate::error::Result;
use crate::profile::ObjectLayout;
use binrw::BinReaderExt;
use std::collections::HashMap;
use std::io::{Read, Seek, Write};

/// Object state lives in the high nibble of packed owner bytes
const STATE_SHIFT: u8 = 4;
const OWNER_MASK: u8 = 0x0F;

/// Owner value meaning "no owner" in layouts that do not store owners
pub const NO_OWNER: u8 = 0xFF;

/// Per-object tables from the object directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectTable {
    /// Object state
    pub states: Vec<u8>,
    /// Owning actor
    pub owners: Vec<u8>,
    /// Room holding each object; empty for layouts without it
    pub rooms: Vec<u8>,
    /// Class bits
    pub class_data: Vec<u32>,
    /// Object name to number (version 8 only)
    pub name_to_id: HashMap<String, u32>,
}

impl ObjectTable {
    /// Number of objects
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether the table has no objects
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Read an object directory payload
    pub fn read<R: Read + Seek>(reader: &mut R, layout: ObjectLayout) -> Result<Self> {
        let count = match layout {
            ObjectLayout::NamedV8 => reader.read_le::<u32>()? as usize,
            _ => usize::from(reader.read_le::<u16>()?),
        };
        check_declared_count(reader, count, record_width(layout))?;

        let mut table = Self {
            states: vec![0; count],
            owners: vec![0; count],
            rooms: Vec::new(),
            class_data: Vec::new(),
            name_to_id: HashMap::new(),
        };

        match layout {
            ObjectLayout::NamedV8 => {
                table.rooms = vec![0; count];
                table.class_data = vec![0; count];
                for i in 0..count {
                    let mut name = [0u8; 40];
                    reader.read_exact(&mut name)?;
                    if name[0] != 0 {
                        let end = name.iter().position(|&b| b == 0).unwrap_or(name.len());
                        let name = String::from_utf8_lossy(&name[..end]).into_owned();
                        table.name_to_id.insert(name, i as u32);
                    }
                    table.states[i] = reader.read_le()?;
                    table.rooms[i] = reader.read_le()?;
                    table.class_data[i] = reader.read_le()?;
                }
                table.owners.fill(NO_OWNER);
                return Ok(table);
            }
            ObjectLayout::V7 => {
                table.rooms = vec![0; count];
                reader.read_exact(&mut table.states)?;
                reader.read_exact(&mut table.rooms)?;
                table.owners.fill(NO_OWNER);
            }
            ObjectLayout::He => {
                table.rooms = vec![0; count];
                reader.read_exact(&mut table.states)?;
                reader.read_exact(&mut table.owners)?;
                reader.read_exact(&mut table.rooms)?;
            }
            ObjectLayout::Packed => {
                reader.read_exact(&mut table.owners)?;
                for (state, owner) in table.states.iter_mut().zip(table.owners.iter_mut()) {
                    *state = *owner >> STATE_SHIFT;
                    *owner &= OWNER_MASK;
                }
            }
        }

        table.class_data = (0..count)
            .map(|_| reader.read_le::<u32>())
            .collect::<binrw::BinResult<_>>()?;

        Ok(table)
    }

    /// Write the table in `layout`
    pub fn write<W: Write>(&self, writer: &mut W, layout: ObjectLayout) -> Result<()> {
        let count = self.len();
        let class = |i: usize| self.class_data.get(i).copied().unwrap_or(0);
        let room = |i: usize| self.rooms.get(i).copied().unwrap_or(0);

        match layout {
            ObjectLayout::NamedV8 => {
                writer.write_all(&(count as u32).to_le_bytes())?;
                let mut names: Vec<Option<&str>> = vec![None; count];
                for (name, &id) in &self.name_to_id {
                    if let Some(slot) = names.get_mut(id as usize) {
                        *slot = Some(name.as_str());
                    }
                }
                for (i, name) in names.into_iter().enumerate() {
                    let mut raw = [0u8; 40];
                    if let Some(name) = name {
                        let len = name.len().min(39);
                        raw[..len].copy_from_slice(&name.as_bytes()[..len]);
                    }
                    writer.write_all(&raw)?;
                    writer.write_all(&[self.states[i], room(i)])?;
                    writer.write_all(&class(i).to_le_bytes())?;
                }
                return Ok(());
            }
            ObjectLayout::V7 => {
                writer.write_all(&(count as u16).to_le_bytes())?;
                writer.write_all(&self.states)?;
                for i in 0..count {
                    writer.write_all(&[room(i)])?;
                }
            }
            ObjectLayout::He => {
                writer.write_all(&(count as u16).to_le_bytes())?;
                writer.write_all(&self.states)?;
                writer.write_all(&self.owners)?;
                for i in 0..count {
                    writer.write_all(&[room(i)])?;
                }
            }
            ObjectLayout::Packed => {
                writer.write_all(&(count as u16).to_le_bytes())?;
                for (state, owner) in self.states.iter().zip(&self.owners) {
                    writer.write_all(&[(state << STATE_SHIFT) | (owner & OWNER_MASK)])?;
                }
            }
        }

        for i in 0..count {
            writer.write_all(&class(i).to_le_bytes())?;
        }
        Ok(())
    }
}

/// Bytes one object occupies after the count
const fn record_width(layout: ObjectLayout) -> usize {
    match layout {
        ObjectLayout::NamedV8 => 40 + 1 + 1 + 4,
        ObjectLayout::V7 => 1 + 1 + 4,
        ObjectLayout::He => 1 + 1 + 1 + 4,
        ObjectLayout::Packed => 1 + 4,
    }
}
