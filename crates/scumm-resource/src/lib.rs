//! Resource manager for SCUMM game archives
//!
#![allow(clippy::cast_possible_truncation)] // Intentional for binary format parsing
#![allow(clippy::cast_possible_wrap)] // Signed seeks and chunk sizes
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::uninlined_format_args)] // Backwards compatibility
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::similar_names)] // Domain-specific naming patterns
//! A game's resources (rooms, scripts, costumes, sounds, charsets and the
//! rest) live in a handful of archive files. An index file, read once per
//! session, says how many resources of each type exist and which room's
//! archive holds each one. Resources are then loaded on first access and
//! kept in a cache with a soft memory budget.
//!
//! # Components
//!
//! - **Locator**: maps a room number to an archive file and opens it
//! - **Index reader**: fills the resource table from the index blocks
//! - **Resource table**: per-type slots, usage counters and directory entries
//! - **Loader**: reads a resource's chunk into its slot on a cache miss
//! - **Evictor**: frees the least recently used slots above the high-water mark
//! - **File providers**: plain directories, in-memory files and container bundles
//!
//! # Example
//!
//! ```rust
//! use scumm_formats::{FormatProfile, Tag, chunk::build_block};
//! use scumm_formats::index::{GameCounts, MaxsV6, ResourceDirectory, build_index_block};
//! use scumm_formats::DirectoryLayout;
//! use scumm_resource::{FilenamePattern, MemoryProvider, ResourceConfig, ResourceManager, ResourceType};
//!
//! let counts = GameCounts { num_rooms: 2, num_scripts: 1, ..GameCounts::default() };
//! let scripts = ResourceDirectory { rooms: vec![1], offsets: vec![17], global_sizes: vec![] };
//! let rooms = ResourceDirectory { rooms: vec![0, 1], offsets: vec![0, 0], global_sizes: vec![] };
//! let layout = DirectoryLayout::Standard { with_sizes: false };
//!
//! let mut index = build_index_block(Tag::new(*b"MAXS"), &MaxsV6::from_counts(&counts).to_bytes()?);
//! index.extend(build_index_block(Tag::new(*b"DROO"), &rooms.to_bytes(layout)?));
//! index.extend(build_index_block(Tag::new(*b"DSCR"), &scripts.to_bytes(layout)?));
//!
//! // Room 1's archive: an empty offset table at 16, then the script at 17
//! let mut room1 = vec![0u8; 17];
//! room1.extend(build_block(Tag::SCRP, b"hi"));
//!
//! let provider = MemoryProvider::new()
//!     .with_file("000.lfl", index)
//!     .with_file("001.lfl", room1);
//! let config = ResourceConfig::new("demo")
//!     .with_filename_pattern(FilenamePattern::new("", 3, ".lfl"));
//!
//! let mut manager = ResourceManager::new(Box::new(provider), FormatProfile::new(6), config)?;
//! manager.read_index()?;
//!
//! let script = manager.get_address(ResourceType::Script, 0)?.unwrap();
//! assert_eq!(script, build_block(Tag::SCRP, b"hi").as_slice());
//! assert_eq!(manager.allocated_size(), 10);
//! # Ok::<(), scumm_resource::ResourceError>(())
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod evictor;
pub mod index_reader;
pub mod liveness;
mod loader;
pub mod locator;
pub mod manager;
pub mod table;
pub mod types;
pub mod vfs;
pub mod xor;

pub use config::{FilenamePattern, PatternNumbering, ResourceConfig};
pub use error::{ResourceError, Result};
pub use evictor::Evictor;
pub use index_reader::{IndexData, IndexReader};
pub use liveness::LivenessRegistry;
pub use locator::{
    AbortOnMissing, ArchiveCandidates, ArchiveLocator, ArchiveNaming, MissingArchiveHandler,
    Recovery,
};
pub use manager::ResourceManager;
pub use table::{DirEntry, ResourceStats, ResourceTable, UsageFlags};
pub use types::{ResourceMode, ResourceType};
pub use vfs::{ContainerProvider, DirectoryProvider, FileProvider, MemoryProvider};
