//! Format profile: the engine revision a set of archives was written for
//!
//! Every layout decision (chunk header shape, directory record layout,
//! object table layout, sizing block layout) is resolved here once, from the
//! engine version, the Humongous sub-version and the feature bits, and handed
//! to the parsers as a small strategy enum.

use crate::error::{FormatError, Result};
use serde::{Deserialize, Serialize};

/// Game feature bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Features {
    /// Raw flag value
    pub value: u32,
}

impl Features {
    /// No special features
    pub const NONE: u32 = 0;

    /// Single bundle archives with 2-byte block sizes
    pub const OLD_BUNDLE: u32 = 0x0001;

    /// 6-byte chunk headers with little-endian sizes and 2-byte tags
    pub const SMALL_HEADER: u32 = 0x0002;

    /// Two-digit `NN.lfl` archive names
    pub const SMALL_NAMES: u32 = 0x0004;

    /// Charsets stored in their own high-numbered room files
    pub const EXTERNAL_CHARSET: u32 = 0x0008;

    /// Archives are XOR-encoded
    pub const USE_KEY: u32 = 0x0010;

    /// Amiga release
    pub const AMIGA: u32 = 0x0020;

    /// FM-Towns release
    pub const FMTOWNS: u32 = 0x0040;

    /// Costumes use the `AKOS` container
    pub const NEW_COSTUMES: u32 = 0x0080;

    /// Humongous Entertainment title
    pub const HUMONGOUS: u32 = 0x0100;

    /// Demo release
    pub const DEMO: u32 = 0x0200;

    /// PC release
    pub const PC: u32 = 0x0400;

    /// Create features from a raw value
    pub const fn new(value: u32) -> Self {
        Self { value }
    }

    /// Check if flag is set
    pub const fn has(&self, flag: u32) -> bool {
        (self.value & flag) != 0
    }

    /// Set flag
    pub fn set(&mut self, flag: u32) {
        self.value |= flag;
    }

    /// Clear flag
    pub fn clear(&mut self, flag: u32) {
        self.value &= !flag;
    }
}

/// Per-title deviations that do not fit a feature bit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GameQuirk {
    /// No title-specific behavior
    #[default]
    None,
    /// Maniac Mansion: `.man` demo archives
    Maniac,
    /// Sam & Max: `.smN` alternate archive names
    SamNMax,
    /// Full Throttle: smaller script table in the PC demo
    FullThrottle,
    /// Freddi Fish 4: large script table with the 9x sizing block
    Freddi4,
}

/// Shape of the chunk header in front of every resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderDialect {
    /// `[size: u16le][tag: 2 bytes]`
    OldBundle,
    /// `[size: u32le][tag: 2 bytes]`
    SmallHeader,
    /// `[tag: 4 bytes][size: u32be]`
    Standard,
}

impl HeaderDialect {
    /// Size of the chunk header in bytes
    pub const fn header_size(self) -> usize {
        match self {
            Self::OldBundle => 4,
            Self::SmallHeader => 6,
            Self::Standard => 8,
        }
    }

    /// Human-readable dialect name
    pub const fn name(self) -> &'static str {
        match self {
            Self::OldBundle => "old bundle",
            Self::SmallHeader => "small header",
            Self::Standard => "standard",
        }
    }
}

/// Record layout of a per-type resource directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectoryLayout {
    /// `u8` count, room bytes, `u16le` offsets
    OldBundle,
    /// `u16le` count, interleaved `room: u8, offset: u32le`
    SmallHeader,
    /// `u16le` count, room bytes, then `u32le` offsets
    Standard {
        /// A `u32le` global size per entry follows the offsets
        with_sizes: bool,
    },
    /// `u32le` count, room bytes, then `u32le` offsets
    Wide,
}

/// Record layout of the global object directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectLayout {
    /// `u32le` count, 40-byte name + state + room + class per record
    NamedV8,
    /// State table, room table, class data
    V7,
    /// State table, owner table, room table, class data
    He,
    /// Owner table with the state packed in the high nibble, class data
    Packed,
}

/// Field layout of the sizing block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaxsLayout {
    /// Version 8: 100 bytes of text then `u32le` counts
    V8,
    /// Version 7: 100 bytes of text then `u16le` counts
    V7,
    /// Humongous C++ engine (52 byte block)
    HeCpp,
    /// Humongous Scummsys.9x engine (46 byte block)
    He9x,
    /// Humongous sputm7.2 engine (40 byte block)
    He72,
    /// Version 6 (38 byte block)
    V6,
    /// Version 5 and earlier, counts partly come from the directories
    Classic,
}

/// The resolved description of one archive format revision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatProfile {
    /// Engine version (3 to 8)
    pub version: u8,
    /// Humongous sub-version (0 for Lucasfilm titles)
    pub he_version: u8,
    /// Feature bits
    pub features: Features,
    /// Title-specific quirks
    pub quirk: GameQuirk,
}

impl Default for FormatProfile {
    fn default() -> Self {
        Self::new(6)
    }
}

impl FormatProfile {
    /// Create a profile for the given engine version with no features
    pub const fn new(version: u8) -> Self {
        Self {
            version,
            he_version: 0,
            features: Features::new(Features::NONE),
            quirk: GameQuirk::None,
        }
    }

    /// Set the Humongous sub-version
    #[must_use]
    pub const fn with_he_version(mut self, he_version: u8) -> Self {
        self.he_version = he_version;
        self
    }

    /// Add feature bits
    #[must_use]
    pub const fn with_features(mut self, flags: u32) -> Self {
        self.features = Features::new(self.features.value | flags);
        self
    }

    /// Set the title quirk
    #[must_use]
    pub const fn with_quirk(mut self, quirk: GameQuirk) -> Self {
        self.quirk = quirk;
        self
    }

    /// Check a feature bit
    pub const fn has(&self, flag: u32) -> bool {
        self.features.has(flag)
    }

    /// Resource chunk header dialect
    pub const fn header_dialect(&self) -> HeaderDialect {
        if self.has(Features::OLD_BUNDLE) {
            HeaderDialect::OldBundle
        } else if self.has(Features::SMALL_HEADER) {
            HeaderDialect::SmallHeader
        } else {
            HeaderDialect::Standard
        }
    }

    /// Chunk header size in bytes
    pub const fn header_size(&self) -> usize {
        self.header_dialect().header_size()
    }

    /// Resource directory record layout
    pub const fn directory_layout(&self) -> DirectoryLayout {
        if self.version == 8 {
            DirectoryLayout::Wide
        } else if self.has(Features::OLD_BUNDLE) {
            DirectoryLayout::OldBundle
        } else if self.has(Features::SMALL_HEADER) {
            DirectoryLayout::SmallHeader
        } else {
            DirectoryLayout::Standard {
                with_sizes: self.is_he_windows(),
            }
        }
    }

    /// Object directory record layout
    pub const fn object_layout(&self) -> ObjectLayout {
        if self.version == 8 {
            ObjectLayout::NamedV8
        } else if self.version == 7 {
            ObjectLayout::V7
        } else if self.is_he_windows() {
            ObjectLayout::He
        } else {
            ObjectLayout::Packed
        }
    }

    /// Sizing block layout for a block of `block_size` bytes (header included)
    pub fn maxs_layout(&self, block_size: u32) -> Result<MaxsLayout> {
        let layout = if self.version == 8 {
            MaxsLayout::V8
        } else if self.version == 7 {
            MaxsLayout::V7
        } else if self.is_he_windows() && block_size == 44 + 8 {
            MaxsLayout::HeCpp
        } else if self.is_he_windows() && block_size == 38 + 8 {
            MaxsLayout::He9x
        } else if self.is_he_windows() && block_size > 38 {
            if block_size != 32 + 8 {
                return Err(self.unsupported_maxs(block_size));
            }
            MaxsLayout::He72
        } else if self.version == 6 {
            if block_size != 30 + 8 {
                return Err(self.unsupported_maxs(block_size));
            }
            MaxsLayout::V6
        } else {
            MaxsLayout::Classic
        };
        Ok(layout)
    }

    fn unsupported_maxs(&self, block_size: u32) -> FormatError {
        FormatError::UnsupportedMaxs {
            version: self.version,
            he_version: self.he_version,
            block_size,
        }
    }

    /// Humongous Windows titles (sub-version 70 and later)
    pub const fn is_he_windows(&self) -> bool {
        self.he_version >= 70
    }

    /// Array definition blocks exist from version 6 on
    pub const fn supports_arrays(&self) -> bool {
        self.version >= 6
    }

    /// Loaded standard chunks are checked against the type tag
    pub const fn has_tag_check(&self) -> bool {
        self.he_version < 70
    }

    /// Position of the room offset count inside a disk archive
    ///
    /// Standard archives start with `LECF` and `LOFF` headers (16 bytes),
    /// small-header archives with their 6-byte equivalents.
    pub const fn room_offset_table_position(&self) -> u64 {
        if self.has(Features::SMALL_HEADER) { 12 } else { 16 }
    }

    /// Rooms at or above this number live in their own files
    pub const fn room_limit(&self) -> u32 {
        if self.has(Features::SMALL_NAMES) { 98 } else { 900 }
    }

    /// Number of global script slots the interpreter reserves
    pub const fn num_global_scripts(&self, layout: MaxsLayout) -> u32 {
        match layout {
            MaxsLayout::V8 => 2000,
            MaxsLayout::HeCpp => 2048,
            MaxsLayout::V7 => {
                if matches!(self.quirk, GameQuirk::FullThrottle)
                    && self.has(Features::DEMO)
                    && self.has(Features::PC)
                {
                    300
                } else {
                    2000
                }
            }
            MaxsLayout::He9x => {
                if matches!(self.quirk, GameQuirk::Freddi4) { 2048 } else { 200 }
            }
            MaxsLayout::He72 | MaxsLayout::V6 | MaxsLayout::Classic => 200,
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_header_dialect_precedence() {
        let old = FormatProfile::new(3).with_features(Features::OLD_BUNDLE | Features::SMALL_HEADER);
        assert_eq!(old.header_dialect(), HeaderDialect::OldBundle);
        assert_eq!(old.header_size(), 4);

        let small = FormatProfile::new(4).with_features(Features::SMALL_HEADER);
        assert_eq!(small.header_dialect(), HeaderDialect::SmallHeader);
        assert_eq!(small.header_size(), 6);
        assert_eq!(small.room_offset_table_position(), 12);

        let standard = FormatProfile::new(5);
        assert_eq!(standard.header_dialect(), HeaderDialect::Standard);
        assert_eq!(standard.header_size(), 8);
        assert_eq!(standard.room_offset_table_position(), 16);
    }

    #[test]
    fn test_directory_layout() {
        assert_eq!(FormatProfile::new(8).directory_layout(), DirectoryLayout::Wide);
        assert_eq!(
            FormatProfile::new(6).with_he_version(72).directory_layout(),
            DirectoryLayout::Standard { with_sizes: true }
        );
        assert_eq!(
            FormatProfile::new(5).directory_layout(),
            DirectoryLayout::Standard { with_sizes: false }
        );
        assert_eq!(
            FormatProfile::new(3)
                .with_features(Features::OLD_BUNDLE)
                .directory_layout(),
            DirectoryLayout::OldBundle
        );
    }

    #[test]
    fn test_maxs_layout_selection() {
        let v6 = FormatProfile::new(6);
        assert_eq!(v6.maxs_layout(38).unwrap(), MaxsLayout::V6);
        assert!(matches!(
            v6.maxs_layout(40),
            Err(FormatError::UnsupportedMaxs { block_size: 40, .. })
        ));

        let he = FormatProfile::new(6).with_he_version(80);
        assert_eq!(he.maxs_layout(52).unwrap(), MaxsLayout::HeCpp);
        assert_eq!(he.maxs_layout(46).unwrap(), MaxsLayout::He9x);
        assert_eq!(he.maxs_layout(40).unwrap(), MaxsLayout::He72);
        assert!(he.maxs_layout(44).is_err());
        // Small HE blocks fall through to the plain version 6 layout
        assert_eq!(he.maxs_layout(38).unwrap(), MaxsLayout::V6);

        assert_eq!(FormatProfile::new(7).maxs_layout(0).unwrap(), MaxsLayout::V7);
        assert_eq!(FormatProfile::new(8).maxs_layout(0).unwrap(), MaxsLayout::V8);
        assert_eq!(FormatProfile::new(5).maxs_layout(28).unwrap(), MaxsLayout::Classic);
    }

    #[test]
    fn test_global_script_counts() {
        let ft_demo = FormatProfile::new(7)
            .with_quirk(GameQuirk::FullThrottle)
            .with_features(Features::DEMO | Features::PC);
        assert_eq!(ft_demo.num_global_scripts(MaxsLayout::V7), 300);
        assert_eq!(FormatProfile::new(7).num_global_scripts(MaxsLayout::V7), 2000);

        let freddi = FormatProfile::new(6)
            .with_he_version(90)
            .with_quirk(GameQuirk::Freddi4);
        assert_eq!(freddi.num_global_scripts(MaxsLayout::He9x), 2048);
        assert_eq!(FormatProfile::new(6).num_global_scripts(MaxsLayout::V6), 200);
    }
}
