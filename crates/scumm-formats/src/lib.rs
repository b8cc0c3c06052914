//! Binary format parsers and builders for SCUMM game archives
//!
#![allow(clippy::cast_possible_truncation)] // Intentional for binary format parsing
#![allow(clippy::cast_possible_wrap)] // Signed reinterpretation of chunk sizes
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::uninlined_format_args)] // Backwards compatibility
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::similar_names)] // Domain-specific naming patterns
//! The archives of the SCUMM engine family are sequences of tagged,
//! length-prefixed chunks. Over the engine's lifetime the chunk header
//! shrank and grew, directories changed their record layout, and the
//! sizing block was rearranged several times. This crate covers those
//! revisions without doing any I/O of its own beyond reading from a
//! caller-supplied `Read + Seek`.
//!
//! # Modules
//!
//! - **Tags**: 4-byte chunk tags and their 2-byte small-header forms
//! - **Profile**: resolves engine version and feature bits into layout strategies
//! - **Chunks**: headers in the old-bundle, small-header and standard dialects
//! - **Scanner**: bounds-checked search for child chunks inside a loaded block
//! - **Index**: the index file's directory, object, sizing, array and room blocks
//!
//! # Example
//!
//! ```rust
//! use scumm_formats::{Tag, chunk::build_block, scan::find_tag};
//!
//! let mut payload = build_block(Tag::RMHD, &[0; 6]);
//! payload.extend(build_block(Tag::BOXD, &[1, 2, 3]));
//! let room = build_block(Tag::ROOM, &payload);
//!
//! let boxes = find_tag(Tag::BOXD, &room).unwrap().unwrap();
//! assert_eq!(&boxes[8..], &[1, 2, 3]);
//! ```

#![warn(missing_docs)]

pub mod chunk;
pub mod error;
pub mod index;
pub mod profile;
pub mod scan;
pub mod tag;

pub use chunk::{ChunkHeader, ChunkTag};
pub use error::{FormatError, Result};
pub use profile::{
    DirectoryLayout, Features, FormatProfile, GameQuirk, HeaderDialect, MaxsLayout, ObjectLayout,
};
pub use tag::{SmallTag, Tag};
