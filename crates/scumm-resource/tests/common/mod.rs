//! Synthetic version 6 games for the integration tests
//!
//! Room 0's archive `000.lfl` holds the index. Every other room `r` gets
//! its own `NNN.lfl` laid out as a disk archive:
//! `LECF { LOFF { 1, (r, offset) }, LFLF { ROOM, resource chunks... } }`.

#![allow(dead_code)]

use scumm_formats::chunk::build_block;
use scumm_formats::index::{
    ABSENT_OFFSET, GameCounts, MaxsV6, ResourceDirectory, RoomOffsetTable, build_index_block,
};
use scumm_formats::{DirectoryLayout, FormatProfile, Tag};
use scumm_resource::vfs::{ArchiveSource, FileProvider};
use scumm_resource::{FilenamePattern, MemoryProvider, ResourceConfig, ResourceManager};
use std::cell::Cell;
use std::io;
use std::rc::Rc;

const LAYOUT: DirectoryLayout = DirectoryLayout::Standard { with_sizes: false };

/// A resource placed in a room, or declared absent
#[derive(Debug, Clone)]
pub enum Placed {
    /// Chunk bytes stored in `room`
    In(u8, Vec<u8>),
    /// Directory entry carries the sentinel offset
    Absent,
}

/// Builds the archives of a synthetic game
#[derive(Debug, Clone, Default)]
pub struct GameBuilder {
    pub num_rooms: u8,
    pub scripts: Vec<Placed>,
    pub costumes: Vec<Placed>,
    pub sounds: Vec<Placed>,
}

impl GameBuilder {
    pub fn new(num_rooms: u8) -> Self {
        Self {
            num_rooms,
            ..Self::default()
        }
    }

    pub fn script(mut self, room: u8, chunk: Vec<u8>) -> Self {
        self.scripts.push(Placed::In(room, chunk));
        self
    }

    pub fn absent_script(mut self) -> Self {
        self.scripts.push(Placed::Absent);
        self
    }

    pub fn costume(mut self, room: u8, chunk: Vec<u8>) -> Self {
        self.costumes.push(Placed::In(room, chunk));
        self
    }

    pub fn sound(mut self, room: u8, chunk: Vec<u8>) -> Self {
        self.sounds.push(Placed::In(room, chunk));
        self
    }

    /// Every archive as `(name, bytes)`
    pub fn files(&self) -> Vec<(String, Vec<u8>)> {
        let mut scripts = directory(self.scripts.len());
        let mut costumes = directory(self.costumes.len());
        let mut sounds = directory(self.sounds.len());

        let mut files = Vec::new();
        for room in 1..self.num_rooms {
            let room_block = build_block(Tag::ROOM, &build_block(Tag::RMHD, &[0; 6]));
            let mut content = room_block.clone();
            for (placed, dir) in [
                (&self.scripts, &mut scripts),
                (&self.costumes, &mut costumes),
                (&self.sounds, &mut sounds),
            ] {
                for (i, entry) in placed.iter().enumerate() {
                    if let Placed::In(r, chunk) = entry
                        && *r == room
                    {
                        dir.rooms[i] = room;
                        dir.offsets[i] = content.len() as u32;
                        content.extend_from_slice(chunk);
                    }
                }
            }
            files.push((format!("{room:03}.lfl"), disk_archive(room, &content)));
        }

        for (placed, dir) in [
            (&self.scripts, &mut scripts),
            (&self.costumes, &mut costumes),
            (&self.sounds, &mut sounds),
        ] {
            for (i, entry) in placed.iter().enumerate() {
                if matches!(entry, Placed::Absent) {
                    dir.offsets[i] = ABSENT_OFFSET;
                }
            }
        }

        let counts = GameCounts {
            num_rooms: u32::from(self.num_rooms),
            num_scripts: self.scripts.len() as u32,
            num_costumes: self.costumes.len() as u32,
            num_sounds: self.sounds.len() as u32,
            num_verbs: 10,
            num_inventory: 4,
            num_array: 8,
            num_fl_object: 4,
            ..GameCounts::default()
        };
        let rooms = ResourceDirectory {
            rooms: (0..self.num_rooms).collect(),
            offsets: vec![0; usize::from(self.num_rooms)],
            global_sizes: Vec::new(),
        };

        let mut index = build_index_block(Tag::new(*b"RNAM"), &[0]);
        index.extend(build_index_block(
            Tag::new(*b"MAXS"),
            &MaxsV6::from_counts(&counts).to_bytes().unwrap(),
        ));
        index.extend(build_index_block(Tag::new(*b"DROO"), &rooms.to_bytes(LAYOUT).unwrap()));
        index.extend(build_index_block(Tag::new(*b"DSCR"), &scripts.to_bytes(LAYOUT).unwrap()));
        index.extend(build_index_block(Tag::new(*b"DSOU"), &sounds.to_bytes(LAYOUT).unwrap()));
        index.extend(build_index_block(Tag::new(*b"DCOS"), &costumes.to_bytes(LAYOUT).unwrap()));
        index.extend(build_index_block(Tag::new(*b"DCHR"), &directory(0).to_bytes(LAYOUT).unwrap()));
        index.extend(build_index_block(Tag::new(*b"DOBJ"), &[0, 0]));
        index.extend(build_index_block(Tag::new(*b"AARY"), &[0, 0]));
        files.insert(0, ("000.lfl".to_string(), index));
        files
    }

    pub fn provider(&self) -> MemoryProvider {
        let mut provider = MemoryProvider::new();
        for (name, data) in self.files() {
            provider.insert(name, data);
        }
        provider
    }
}

fn directory(count: usize) -> ResourceDirectory {
    ResourceDirectory {
        rooms: vec![0; count],
        offsets: vec![0; count],
        global_sizes: Vec::new(),
    }
}

/// `LECF { LOFF { (room, offset) }, LFLF { content } }`; offset points at `content`
fn disk_archive(room: u8, content: &[u8]) -> Vec<u8> {
    // LECF header + LOFF header + count + one entry + LFLF header
    let offset = 8 + 8 + 1 + 5 + 8;
    let table = RoomOffsetTable {
        entries: vec![(room, offset)],
    };
    let mut payload = build_block(Tag::LOFF, &table.to_bytes());
    payload.extend(build_block(Tag::LFLF, content));
    build_block(Tag::LECF, &payload)
}

/// A standard chunk declaring `total` bytes, header included
pub fn chunk(tag: Tag, total: usize) -> Vec<u8> {
    let payload: Vec<u8> = (0..total.saturating_sub(8)).map(|i| i as u8).collect();
    build_block(tag, &payload)
}

/// Configuration naming archives `NNN.lfl`
pub fn config() -> ResourceConfig {
    ResourceConfig::new("synthetic").with_filename_pattern(FilenamePattern::new("", 3, ".lfl"))
}

/// A version 6 session over `provider` with the index read
pub fn manager<P: FileProvider + 'static>(provider: P, config: ResourceConfig) -> ResourceManager {
    let mut manager = ResourceManager::new(Box::new(provider), FormatProfile::new(6), config)
        .expect("valid configuration");
    manager.read_index().expect("index reads");
    manager
}

/// Provider that counts every open
#[derive(Debug)]
pub struct CountingProvider {
    inner: MemoryProvider,
    opens: Rc<Cell<usize>>,
}

impl CountingProvider {
    pub fn new(inner: MemoryProvider) -> (Self, Rc<Cell<usize>>) {
        let opens = Rc::new(Cell::new(0));
        (
            Self {
                inner,
                opens: Rc::clone(&opens),
            },
            opens,
        )
    }
}

impl FileProvider for CountingProvider {
    fn open(&self, name: &str) -> io::Result<Box<dyn ArchiveSource>> {
        self.opens.set(self.opens.get() + 1);
        self.inner.open(name)
    }
}
