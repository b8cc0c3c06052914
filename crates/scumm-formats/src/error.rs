//! Error types for SCUMM format parsing and building

use crate::tag::Tag;
use thiserror::Error;

/// Result type for format operations
pub type Result<T> = std::result::Result<T, FormatError>;

/// Errors that can occur while parsing or building SCUMM binary data
#[derive(Debug, Error)]
pub enum FormatError {
    /// Input ended before a structure was complete
    #[error("Truncated data: needed {needed} bytes at offset {offset}, {available} available")]
    Truncated {
        /// Offset where the read started
        offset: usize,
        /// Bytes the structure required
        needed: usize,
        /// Bytes actually present
        available: usize,
    },

    /// A chunk declared a size that cannot advance the walk
    #[error("Illegal block length {size} for chunk '{tag}' while searching")]
    InvalidChunkSize {
        /// Tag of the offending chunk (or the searched tag when unknown)
        tag: Tag,
        /// Declared size, reinterpreted as signed
        size: i64,
    },

    /// The sizing block has a size no known layout uses
    #[error("MAXS block of size {block_size} not supported for version {version} (HE {he_version})")]
    UnsupportedMaxs {
        /// Engine version of the profile
        version: u8,
        /// Humongous sub-version of the profile
        he_version: u8,
        /// Declared block size including the 8-byte header
        block_size: u32,
    },

    /// A directory declared more entries than its dialect can hold
    #[error("Too many {name}s ({count}) in directory")]
    TooManyEntries {
        /// Directory name ("room", "script", ...)
        name: String,
        /// Declared count
        count: usize,
    },

    /// Array definitions in a dialect that predates arrays
    #[error("Array definition block not supported in pre-V6 games (version {version})")]
    ArraysUnsupported {
        /// Engine version of the profile
        version: u8,
    },

    /// Tag lookup is meaningless in this dialect
    #[error("Tag search is not supported by the {0} dialect")]
    UnsupportedDialect(&'static str),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Binary read/write error
    #[error("Binary format error: {0}")]
    BinRw(#[from] binrw::Error),
}

impl FormatError {
    /// Whether the error reports data that does not match the expected layout
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::Truncated { .. }
                | Self::InvalidChunkSize { .. }
                | Self::UnsupportedMaxs { .. }
                | Self::TooManyEntries { .. }
                | Self::ArraysUnsupported { .. }
        )
    }
}
