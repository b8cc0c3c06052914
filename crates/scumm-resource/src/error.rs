//! Error types for the resource manager

use scumm_formats::{FormatError, Tag};
use thiserror::Error;

/// Result type for resource manager operations
pub type Result<T> = std::result::Result<T, ResourceError>;

/// Errors raised while locating, indexing or loading resources
///
/// Out-of-range indices and resources marked absent are not errors; those
/// paths return `Ok(None)` or `Ok(false)`.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// Binary format error
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A loaded chunk carries a different tag than its type expects
    #[error(
        "{type_name} {index} not in room {room} at {archive_offset}+{offset} in file {archive} (found '{found}', expected '{expected}')"
    )]
    TagMismatch {
        /// Type name
        type_name: &'static str,
        /// Resource index
        index: usize,
        /// Room that was opened
        room: u16,
        /// Tag the type expects
        expected: Tag,
        /// Tag found in the archive
        found: Tag,
        /// Archive file name
        archive: String,
        /// Offset of the room inside the archive
        archive_offset: u32,
        /// Offset of the resource inside the room
        offset: u32,
    },

    /// The index file contains a block nobody knows
    #[error("Bad ID {hex}('{tag}') found in index file directory")]
    UnknownIndexBlock {
        /// Raw tag
        tag: Tag,
        /// Tag bytes as hex
        hex: String,
    },

    /// A strict directory disagrees with the sizing block
    #[error("Invalid number of {name}s ({found}) in directory, expected {expected}")]
    CountMismatch {
        /// Directory name
        name: String,
        /// Count allocated from the sizing block
        expected: usize,
        /// Count the directory declared
        found: usize,
    },

    /// A type was allocated with more slots than any archive holds
    #[error("Too many {name}s ({count}) in directory")]
    TooManyResources {
        /// Type name
        name: &'static str,
        /// Requested count
        count: usize,
    },

    /// Reading a resource body failed; the slot was discarded
    #[error("Cannot read resource {type_name} {index}: {source}")]
    ReadFailed {
        /// Type name
        type_name: &'static str,
        /// Resource index
        index: usize,
        /// Underlying failure
        source: std::io::Error,
    },

    /// The missing-archive handler gave up
    #[error("Cannot find file: '{file}' (disk {disk})")]
    ArchiveMissing {
        /// Primary candidate name
        file: String,
        /// Disk number
        disk: u8,
    },

    /// An archive was opened but its offset table has no entry for the room
    #[error("Room {room} not in {file}")]
    RoomNotInArchive {
        /// Room number
        room: u16,
        /// Archive file name
        file: String,
    },

    /// A type was used before the index allocated it
    #[error("Resource type {0} has not been allocated")]
    TypeNotAllocated(&'static str),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ResourceError {
    /// Build an [`ResourceError::UnknownIndexBlock`] from the raw tag
    pub fn unknown_block(tag: Tag) -> Self {
        Self::UnknownIndexBlock {
            tag,
            hex: hex::encode_upper(tag.as_bytes()),
        }
    }

    /// Whether the error means the archive does not match its format profile
    ///
    /// Embedders normally stop the session on these.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Format(e) => e.is_corruption(),
            Self::TagMismatch { .. }
            | Self::UnknownIndexBlock { .. }
            | Self::CountMismatch { .. }
            | Self::TooManyResources { .. }
            | Self::ReadFailed { .. }
            | Self::RoomNotInArchive { .. } => true,
            Self::Io(_)
            | Self::ArchiveMissing { .. }
            | Self::TypeNotAllocated(_)
            | Self::Config(_) => false,
        }
    }
}
