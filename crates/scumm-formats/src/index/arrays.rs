//! Array definitions (`AARY`)

use crate::error::{FormatError, Result};
use crate::profile::FormatProfile;
use binrw::BinReaderExt;
use std::io::{Read, Seek, Write};

/// Element type of a predefined array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrayKind {
    /// One bit per element
    Bit,
    /// 16-bit elements
    Int,
    /// 32-bit elements (version 8)
    Dword,
}

impl ArrayKind {
    const BIT_CODE: u16 = 1;
    const INT_CODE: u16 = 5;
}

/// A global array the interpreter creates before the first script runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayDefinition {
    /// Variable that receives the array
    pub var: u32,
    /// First dimension
    pub dim_a: u32,
    /// Second dimension
    pub dim_b: u32,
    /// Element type
    pub kind: ArrayKind,
}

/// Read array definitions until the terminating zero variable
pub fn read_array_definitions<R: Read + Seek>(
    reader: &mut R,
    profile: &FormatProfile,
) -> Result<Vec<ArrayDefinition>> {
    if !profile.supports_arrays() {
        return Err(FormatError::ArraysUnsupported {
            version: profile.version,
        });
    }

    let mut defs = Vec::new();
    if profile.version == 8 {
        loop {
            let var: u32 = reader.read_le()?;
            if var == 0 {
                break;
            }
            let dim_a = reader.read_le()?;
            let dim_b = reader.read_le()?;
            defs.push(ArrayDefinition {
                var,
                dim_a,
                dim_b,
                kind: ArrayKind::Dword,
            });
        }
    } else {
        loop {
            let var: u16 = reader.read_le()?;
            if var == 0 {
                break;
            }
            let dim_a: u16 = reader.read_le()?;
            let dim_b: u16 = reader.read_le()?;
            let code: u16 = reader.read_le()?;
            defs.push(ArrayDefinition {
                var: var.into(),
                dim_a: dim_a.into(),
                dim_b: dim_b.into(),
                kind: if code == ArrayKind::BIT_CODE {
                    ArrayKind::Bit
                } else {
                    ArrayKind::Int
                },
            });
        }
    }
    Ok(defs)
}

/// Write array definitions followed by the terminator
pub fn write_array_definitions<W: Write>(
    writer: &mut W,
    profile: &FormatProfile,
    defs: &[ArrayDefinition],
) -> Result<()> {
    if profile.version == 8 {
        for def in defs {
            writer.write_all(&def.var.to_le_bytes())?;
            writer.write_all(&def.dim_a.to_le_bytes())?;
            writer.write_all(&def.dim_b.to_le_bytes())?;
        }
        writer.write_all(&0u32.to_le_bytes())?;
    } else {
        for def in defs {
            let code = match def.kind {
                ArrayKind::Bit => ArrayKind::BIT_CODE,
                ArrayKind::Int | ArrayKind::Dword => ArrayKind::INT_CODE,
            };
            for value in [def.var as u16, def.dim_a as u16, def.dim_b as u16, code] {
                writer.write_all(&value.to_le_bytes())?;
            }
        }
        writer.write_all(&0u16.to_le_bytes())?;
    }
    Ok(())
}
