//! Four-character block tags and their legacy two-character forms
//!
//! Standard archives identify every chunk by a 4-byte ASCII tag stored in
//! file order (`MKID` in the engine's terms). Small-header archives use a
//! 2-byte tag instead; only a fixed set of standard tags has a small
//! counterpart, so a search for any other tag can never succeed there.

use binrw::{BinRead, BinWrite};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 4-byte chunk tag in on-disk byte order
#[derive(
    BinRead, BinWrite, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Tag(pub [u8; 4]);

/// A 2-byte chunk tag used by small-header archives
#[derive(BinRead, BinWrite, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SmallTag(pub [u8; 2]);

impl Tag {
    // Resource containers
    /// Room container
    pub const ROOM: Self = Self(*b"ROOM");
    /// Global script
    pub const SCRP: Self = Self(*b"SCRP");
    /// Costume (classic renderer)
    pub const COST: Self = Self(*b"COST");
    /// Costume (AKOS renderer)
    pub const AKOS: Self = Self(*b"AKOS");
    /// Sound container
    pub const SOUN: Self = Self(*b"SOUN");
    /// Character set
    pub const CHAR: Self = Self(*b"CHAR");
    /// Room image
    pub const RMIM: Self = Self(*b"RMIM");
    /// Room scripts
    pub const RMSC: Self = Self(*b"RMSC");
    /// Humongous image
    pub const AWIZ: Self = Self(*b"AWIZ");
    /// Humongous talkie
    pub const TLKE: Self = Self(*b"TLKE");
    /// Placeholder for locally synthesized types
    pub const NONE: Self = Self(*b"NONE");

    // Archive framing
    /// Outer disk file container
    pub const LECF: Self = Self(*b"LECF");
    /// Room offset table inside a disk file
    pub const LOFF: Self = Self(*b"LOFF");
    /// Per-room file container
    pub const LFLF: Self = Self(*b"LFLF");

    // Room sub-blocks with small-header equivalents
    /// Room header
    pub const RMHD: Self = Self(*b"RMHD");
    /// Room image layer 0
    pub const IM00: Self = Self(*b"IM00");
    /// Exit script
    pub const EXCD: Self = Self(*b"EXCD");
    /// Entry script
    pub const ENCD: Self = Self(*b"ENCD");
    /// Scale slots
    pub const SCAL: Self = Self(*b"SCAL");
    /// Local script
    pub const LSCR: Self = Self(*b"LSCR");
    /// Object code
    pub const OBCD: Self = Self(*b"OBCD");
    /// Object image
    pub const OBIM: Self = Self(*b"OBIM");
    /// Strip map
    pub const SMAP: Self = Self(*b"SMAP");
    /// Palette
    pub const CLUT: Self = Self(*b"CLUT");
    /// Walk boxes
    pub const BOXD: Self = Self(*b"BOXD");
    /// Color cycling
    pub const CYCL: Self = Self(*b"CYCL");
    /// EGA palette
    pub const EPAL: Self = Self(*b"EPAL");

    /// Create a tag from its four ASCII bytes
    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Create a tag from a big-endian word (`'SCRP'` style constant)
    pub const fn from_u32_be(value: u32) -> Self {
        Self(value.to_be_bytes())
    }

    /// Tag as a big-endian word
    pub const fn to_u32_be(self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    /// Parse a tag from a 4-character string
    pub fn from_str_exact(s: &str) -> Option<Self> {
        let bytes: [u8; 4] = s.as_bytes().try_into().ok()?;
        Some(Self(bytes))
    }

    /// Raw tag bytes
    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Legacy 2-byte form of this tag for small-header archives
    ///
    /// Returns `None` for tags that have no small-header counterpart.
    pub const fn to_small(self) -> Option<SmallTag> {
        let small = match &self.0 {
            b"RMHD" => *b"HD",
            b"IM00" | b"SMAP" => *b"BM",
            b"EXCD" => *b"EX",
            b"ENCD" => *b"EN",
            b"SCAL" => *b"SA",
            b"LSCR" => *b"LS",
            b"OBCD" => *b"OC",
            b"OBIM" => *b"OI",
            b"CLUT" => *b"PA",
            b"BOXD" => *b"BX",
            b"CYCL" => *b"CC",
            b"EPAL" => *b"SP",
            _ => return None,
        };
        Some(SmallTag(small))
    }

    fn is_printable(&self) -> bool {
        self.0.iter().all(|b| b.is_ascii_graphic() || *b == b' ')
    }
}

impl SmallTag {
    /// Create a small tag from its two ASCII bytes
    pub const fn new(bytes: [u8; 2]) -> Self {
        Self(bytes)
    }

    /// Parse a small tag from a 2-character string
    pub fn from_str_exact(s: &str) -> Option<Self> {
        let bytes: [u8; 2] = s.as_bytes().try_into().ok()?;
        Some(Self(bytes))
    }

    /// Tag as the little-endian word the engine compares against
    pub const fn to_u16_le(self) -> u16 {
        u16::from_le_bytes(self.0)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_printable() {
            self.0.iter().try_for_each(|b| write!(f, "{}", char::from(*b)))
        } else {
            write!(f, "0x{}", hex::encode(self.0))
        }
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({self} / {:08X})", self.to_u32_be())
    }
}

impl fmt::Display for SmallTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.iter().all(u8::is_ascii_graphic) {
            self.0.iter().try_for_each(|b| write!(f, "{}", char::from(*b)))
        } else {
            write!(f, "0x{}", hex::encode(self.0))
        }
    }
}

impl fmt::Debug for SmallTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SmallTag({self})")
    }
}
