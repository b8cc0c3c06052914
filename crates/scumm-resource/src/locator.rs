//! Archive locator: maps a room number to an open archive stream
//!
//! Every format revision names its archives differently. The locator
//! resolves the naming scheme once from the format profile, then on each
//! room switch works out which file holds the room, opens it through the
//! [`FileProvider`], and refreshes the room offset table when the archive
//! carries one.

use crate::config::{FilenamePattern, PatternNumbering};
use crate::error::{ResourceError, Result};
use crate::table::DirEntry;
use crate::vfs::{ArchiveSource, FileProvider};
use crate::xor::XorReader;
use scumm_formats::index::{ABSENT_OFFSET, RoomOffsetTable};
use scumm_formats::{Features, FormatProfile, GameQuirk};
use std::fmt;
use std::io::{self, Seek, SeekFrom};
use tracing::{debug, trace, warn};

/// XOR key of standard archives with [`Features::USE_KEY`] and of disk archives
const STANDARD_KEY: u8 = 0x69;

/// XOR key of small-name archives with [`Features::USE_KEY`]
const SMALL_NAMES_KEY: u8 = 0xFF;

/// Room offset that points at the archive's own header
const MISSING_ROOM_OFFSET: u32 = 8;

/// What to do after an archive could not be opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// The file should now be available; try again
    Retry,
    /// Give up; the locator fails with [`ResourceError::ArchiveMissing`]
    Abort,
}

/// Called when no candidate name for a room could be opened
///
/// This is where an embedder prompts for a disk or resolves a path.
pub trait MissingArchiveHandler {
    /// `file` is the primary candidate name, `disk` the disk number
    fn archive_missing(&mut self, file: &str, disk: u8) -> Recovery;
}

impl<F> MissingArchiveHandler for F
where
    F: FnMut(&str, u8) -> Recovery,
{
    fn archive_missing(&mut self, file: &str, disk: u8) -> Recovery {
        self(file, disk)
    }
}

/// Handler that always gives up
#[derive(Debug, Clone, Copy, Default)]
pub struct AbortOnMissing;

impl MissingArchiveHandler for AbortOnMissing {
    fn archive_missing(&mut self, file: &str, disk: u8) -> Recovery {
        warn!("Cannot find file: '{}' (disk {})", file, disk);
        Recovery::Abort
    }
}

/// Archive naming scheme
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveNaming {
    /// Humongous 98+: `game.he0`, then `game.(a)` or `game.(b)`
    HeWindows98,
    /// Humongous Windows: `game.he0` and `game.he1`
    HeWindows,
    /// Version 7 and 8: `game.laN`, alternate `game.NNN`
    V7Plus,
    /// Older Humongous: `game.heN`
    Humongous,
    /// `game.NNN`, alternate `game.smN` for Sam & Max
    Standard {
        /// Try the `.smN` form when the primary is missing
        alt_sm: bool,
    },
    /// Small header, long names: `NNN.lfl` for room 0 and 900+, else `diskNN.lec`
    LucasfilmDisk,
    /// Small names: `NN.lfl`, alternate `NN.man` for the Maniac Mansion demo
    TwoDigitLfl {
        /// Try the `.man` form when the primary is missing
        alt_man: bool,
    },
    /// Explicit pattern from the configuration
    Pattern(FilenamePattern),
}

/// Names to try for one room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveCandidates {
    /// Tried first
    pub primary: String,
    /// Tried when the primary is missing
    pub alternate: Option<String>,
    /// XOR key of the archive
    pub key: u8,
    /// The archive holds one room and has no offset table
    pub standalone: bool,
    /// Opening the alternate means the game is a demo
    pub alternate_is_demo: bool,
}

impl ArchiveCandidates {
    fn new(primary: String, key: u8) -> Self {
        Self {
            primary,
            alternate: None,
            key,
            standalone: false,
            alternate_is_demo: false,
        }
    }

    fn with_alternate(mut self, alternate: String) -> Self {
        self.alternate = Some(alternate);
        self
    }
}

impl ArchiveNaming {
    /// Naming scheme of `profile`, unless `pattern` overrides it
    pub fn resolve(profile: &FormatProfile, pattern: Option<&FilenamePattern>) -> Self {
        if let Some(pattern) = pattern {
            return Self::Pattern(pattern.clone());
        }
        if !profile.has(Features::SMALL_HEADER) {
            if profile.he_version >= 98 {
                Self::HeWindows98
            } else if profile.is_he_windows() {
                Self::HeWindows
            } else if profile.version >= 7 {
                Self::V7Plus
            } else if profile.has(Features::HUMONGOUS) {
                Self::Humongous
            } else {
                Self::Standard {
                    alt_sm: profile.quirk == GameQuirk::SamNMax,
                }
            }
        } else if !profile.has(Features::SMALL_NAMES) {
            Self::LucasfilmDisk
        } else {
            Self::TwoDigitLfl {
                alt_man: profile.quirk == GameQuirk::Maniac,
            }
        }
    }

    /// Candidate names for `room`, stored on `disk`
    pub fn candidates(
        &self,
        game: &str,
        room: u16,
        disk: u8,
        profile: &FormatProfile,
    ) -> ArchiveCandidates {
        let use_key = profile.has(Features::USE_KEY);
        let standard_key = if use_key { STANDARD_KEY } else { 0 };
        let disk = if room == 0 { 0 } else { disk };

        match self {
            Self::HeWindows98 => {
                let primary = if room == 0 {
                    format!("{game}.he0")
                } else {
                    format!("{game}.(a)")
                };
                ArchiveCandidates::new(primary, standard_key)
                    .with_alternate(format!("{game}.(b)"))
            }
            Self::HeWindows => ArchiveCandidates::new(
                format!("{game}.he{}", u8::from(room != 0)),
                standard_key,
            ),
            Self::V7Plus => ArchiveCandidates::new(format!("{game}.la{disk}"), standard_key)
                .with_alternate(format!("{game}.{disk:03}")),
            Self::Humongous => ArchiveCandidates::new(format!("{game}.he{disk}"), standard_key),
            Self::Standard { alt_sm } => {
                let candidates =
                    ArchiveCandidates::new(format!("{game}.{disk:03}"), standard_key);
                if *alt_sm {
                    candidates.with_alternate(format!("{game}.sm{disk}"))
                } else {
                    candidates
                }
            }
            Self::LucasfilmDisk => {
                if room == 0 || room >= 900 {
                    ArchiveCandidates {
                        standalone: true,
                        ..ArchiveCandidates::new(format!("{room:03}.lfl"), 0)
                    }
                } else {
                    ArchiveCandidates::new(format!("disk{disk:02}.lec"), STANDARD_KEY)
                }
            }
            Self::TwoDigitLfl { alt_man } => {
                let key = if use_key { SMALL_NAMES_KEY } else { 0 };
                let candidates = ArchiveCandidates::new(format!("{room:02}.lfl"), key);
                if *alt_man {
                    ArchiveCandidates {
                        alternate_is_demo: true,
                        ..candidates.with_alternate(format!("{room:02}.man"))
                    }
                } else {
                    candidates
                }
            }
            Self::Pattern(pattern) => {
                let number = match pattern.numbering {
                    PatternNumbering::Room => u32::from(room),
                    PatternNumbering::Disk => u32::from(disk),
                };
                ArchiveCandidates::new(pattern.format(number), pattern.key)
            }
        }
    }
}

/// Stream type handed to the index reader and loader
pub type ArchiveStream = XorReader<Box<dyn ArchiveSource>>;

/// Tracks the open archive and where the current room starts inside it
pub struct ArchiveLocator {
    provider: Box<dyn FileProvider>,
    handler: Box<dyn MissingArchiveHandler>,
    naming: ArchiveNaming,
    game_name: String,
    profile: FormatProfile,
    stream: Option<ArchiveStream>,
    current_file: String,
    last_loaded_room: Option<u16>,
    file_offset: u32,
    dynamic_room_offsets: bool,
    he_room_offsets: Vec<u32>,
    demo_mode: bool,
}

impl ArchiveLocator {
    /// Create a locator reading through `provider`
    pub fn new(
        provider: Box<dyn FileProvider>,
        profile: FormatProfile,
        game_name: &str,
        pattern: Option<&FilenamePattern>,
    ) -> Self {
        Self {
            provider,
            handler: Box::new(AbortOnMissing),
            naming: ArchiveNaming::resolve(&profile, pattern),
            game_name: game_name.to_string(),
            profile,
            stream: None,
            current_file: String::new(),
            last_loaded_room: None,
            file_offset: 0,
            dynamic_room_offsets: false,
            he_room_offsets: Vec::new(),
            demo_mode: false,
        }
    }

    /// Replace the missing-archive handler
    pub fn set_handler(&mut self, handler: Box<dyn MissingArchiveHandler>) {
        self.handler = handler;
    }

    /// Naming scheme in use
    pub const fn naming(&self) -> &ArchiveNaming {
        &self.naming
    }

    /// Room offsets are re-read from every archive opened
    pub fn set_dynamic_room_offsets(&mut self, enabled: bool) {
        self.dynamic_room_offsets = enabled;
    }

    /// Whether room offsets are re-read from every archive opened
    pub const fn dynamic_room_offsets(&self) -> bool {
        self.dynamic_room_offsets
    }

    /// Humongous room offsets (`DLFL`) copied into the room table on refresh
    pub fn set_he_room_offsets(&mut self, offsets: Vec<u32>) {
        self.he_room_offsets = offsets;
    }

    /// Offset of the current room inside the open archive
    pub const fn file_offset(&self) -> u32 {
        self.file_offset
    }

    /// Name of the open archive
    pub fn current_file(&self) -> &str {
        &self.current_file
    }

    /// Room the locator last opened
    pub const fn last_loaded_room(&self) -> Option<u16> {
        self.last_loaded_room
    }

    /// Whether an alternate demo archive was opened
    pub const fn demo_mode(&self) -> bool {
        self.demo_mode
    }

    /// The open archive stream
    pub fn stream(&mut self) -> Result<&mut ArchiveStream> {
        self.stream.as_mut().ok_or_else(|| {
            ResourceError::Io(io::Error::new(
                io::ErrorKind::NotConnected,
                "no archive is open",
            ))
        })
    }

    /// Make the archive holding `room` current
    ///
    /// `rooms` is the room type's directory; its offsets are refreshed in
    /// place when the archive carries an offset table.
    pub fn open_room(&mut self, room: u16, rooms: &mut [DirEntry]) -> Result<()> {
        debug!("openRoom({})", room);
        if self.last_loaded_room == Some(room) {
            return Ok(());
        }
        self.last_loaded_room = Some(room);

        let result = self.locate(room, rooms);
        if result.is_err() {
            self.last_loaded_room = None;
        }
        result
    }

    fn locate(&mut self, room: u16, rooms: &mut [DirEntry]) -> Result<()> {
        let external = self.profile.has(Features::EXTERNAL_CHARSET)
            && u32::from(room) >= self.profile.room_limit();
        let disk = if room == 0 {
            0
        } else {
            rooms.get(usize::from(room)).map_or(0, |e| e.room)
        };

        loop {
            let room_offs = if external || room == 0 {
                0
            } else {
                rooms.get(usize::from(room)).map_or(0, |e| e.offset)
            };

            if room_offs == ABSENT_OFFSET {
                break;
            }

            if room_offs != 0 && room != 0 {
                self.file_offset = room_offs;
                return Ok(());
            }

            let names = self
                .naming
                .candidates(&self.game_name, room, disk, &self.profile);

            let mut opened = self.open_file(&names.primary, names.key)?;
            if !opened
                && !names.standalone
                && let Some(alternate) = &names.alternate
            {
                opened = self.open_file(alternate, names.key)?;
                if opened && names.alternate_is_demo {
                    self.demo_mode = true;
                }
            }

            if opened {
                if room == 0 || external || names.standalone {
                    self.file_offset = 0;
                    return Ok(());
                }
                self.read_rooms_offsets(rooms)?;
                self.file_offset = rooms.get(usize::from(room)).map_or(0, |e| e.offset);
                if self.file_offset != MISSING_ROOM_OFFSET {
                    return Ok(());
                }
                return Err(ResourceError::RoomNotInArchive {
                    room,
                    file: names.primary,
                });
            }

            self.ask_for_disk(&names.primary, disk)?;
        }

        // The room is not in any disk archive: it lives in its own file
        let name = format!("{room:03}.lfl");
        while !self.open_file(&name, 0)? {
            self.ask_for_disk(&name, disk)?;
        }
        self.delete_room_offsets(rooms);
        self.file_offset = 0;
        Ok(())
    }

    /// Open `name` with XOR `key`; `Ok(false)` if it does not exist
    fn open_file(&mut self, name: &str, key: u8) -> Result<bool> {
        trace!("openResourceFile({})", name);
        match self.provider.open(name) {
            Ok(source) => {
                self.stream = Some(XorReader::new(source, key));
                self.current_file = name.to_string();
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn ask_for_disk(&mut self, file: &str, disk: u8) -> Result<()> {
        match self.handler.archive_missing(file, disk) {
            Recovery::Retry => {
                debug!("retrying {}", file);
                Ok(())
            }
            Recovery::Abort => Err(ResourceError::ArchiveMissing {
                file: file.to_string(),
                disk,
            }),
        }
    }

    /// Close the archive and forget the current room (the `-1` room)
    pub fn close_room(&mut self, rooms: &mut [DirEntry]) {
        if self.last_loaded_room.take().is_some() {
            self.delete_room_offsets(rooms);
            self.stream = None;
            self.current_file.clear();
        }
    }

    /// Zero every room offset that is not marked absent
    ///
    /// Only profiles whose offsets come from the archives are affected.
    pub fn delete_room_offsets(&self, rooms: &mut [DirEntry]) {
        if !self.profile.has(Features::SMALL_HEADER) && !self.dynamic_room_offsets {
            return;
        }
        for entry in rooms.iter_mut().filter(|e| !e.is_absent()) {
            entry.offset = 0;
        }
    }

    /// Refresh room offsets from the open archive
    pub fn read_rooms_offsets(&mut self, rooms: &mut [DirEntry]) -> Result<()> {
        debug!("readRoomOffsets()");
        self.delete_room_offsets(rooms);
        if self.profile.has(Features::SMALL_NAMES) {
            return Ok(());
        }

        if self.profile.is_he_windows() {
            for (entry, offset) in rooms.iter_mut().zip(&self.he_room_offsets) {
                entry.offset = *offset;
            }
            return Ok(());
        }

        if !self.profile.has(Features::SMALL_HEADER) && !self.dynamic_room_offsets {
            return Ok(());
        }

        let position = self.profile.room_offset_table_position();
        let stream = self.stream()?;
        stream.seek(SeekFrom::Start(position))?;
        let table = RoomOffsetTable::read(stream)?;
        for (room, offset) in table.entries {
            if let Some(entry) = rooms.get_mut(usize::from(room))
                && !entry.is_absent()
            {
                entry.offset = offset;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ArchiveLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveLocator")
            .field("naming", &self.naming)
            .field("game_name", &self.game_name)
            .field("current_file", &self.current_file)
            .field("last_loaded_room", &self.last_loaded_room)
            .field("file_offset", &self.file_offset)
            .field("dynamic_room_offsets", &self.dynamic_room_offsets)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::vfs::MemoryProvider;
    use pretty_assertions::assert_eq;
    use scumm_formats::Tag;
    use scumm_formats::chunk::build_block;
    use std::cell::Cell;
    use std::io::Read;
    use std::rc::Rc;

    fn names(naming: &ArchiveNaming, room: u16, disk: u8, profile: &FormatProfile) -> String {
        naming.candidates("game", room, disk, profile).primary
    }

    #[test]
    fn test_resolve_naming() {
        let v5 = FormatProfile::new(5);
        assert_eq!(
            ArchiveNaming::resolve(&v5, None),
            ArchiveNaming::Standard { alt_sm: false }
        );
        let samnmax = FormatProfile::new(6).with_quirk(GameQuirk::SamNMax);
        assert_eq!(
            ArchiveNaming::resolve(&samnmax, None),
            ArchiveNaming::Standard { alt_sm: true }
        );
        let he98 = FormatProfile::new(6).with_he_version(98);
        assert_eq!(ArchiveNaming::resolve(&he98, None), ArchiveNaming::HeWindows98);
        let he80 = FormatProfile::new(6).with_he_version(80);
        assert_eq!(ArchiveNaming::resolve(&he80, None), ArchiveNaming::HeWindows);
        let he60 = FormatProfile::new(6)
            .with_he_version(60)
            .with_features(Features::HUMONGOUS);
        assert_eq!(ArchiveNaming::resolve(&he60, None), ArchiveNaming::Humongous);
        assert_eq!(
            ArchiveNaming::resolve(&FormatProfile::new(8), None),
            ArchiveNaming::V7Plus
        );
        let loom = FormatProfile::new(4).with_features(Features::SMALL_HEADER);
        assert_eq!(ArchiveNaming::resolve(&loom, None), ArchiveNaming::LucasfilmDisk);
        let maniac = FormatProfile::new(2)
            .with_features(Features::SMALL_HEADER | Features::SMALL_NAMES | Features::OLD_BUNDLE)
            .with_quirk(GameQuirk::Maniac);
        assert_eq!(
            ArchiveNaming::resolve(&maniac, None),
            ArchiveNaming::TwoDigitLfl { alt_man: true }
        );

        let pattern = FilenamePattern::new("", 3, ".lfl");
        assert_eq!(
            ArchiveNaming::resolve(&v5, Some(&pattern)),
            ArchiveNaming::Pattern(pattern)
        );
    }

    #[test]
    fn test_candidate_names() {
        let v6 = FormatProfile::new(6).with_features(Features::USE_KEY);
        let standard = ArchiveNaming::Standard { alt_sm: true };
        let c = standard.candidates("samnmax", 5, 1, &v6);
        assert_eq!(c.primary, "samnmax.001");
        assert_eq!(c.alternate.as_deref(), Some("samnmax.sm1"));
        assert_eq!(c.key, 0x69);
        assert_eq!(names(&standard, 0, 3, &v6), "game.000");

        let v7 = FormatProfile::new(7);
        let c = ArchiveNaming::V7Plus.candidates("dig", 12, 2, &v7);
        assert_eq!(c.primary, "dig.la2");
        assert_eq!(c.alternate.as_deref(), Some("dig.002"));
        assert_eq!(c.key, 0);

        assert_eq!(names(&ArchiveNaming::HeWindows, 0, 0, &v7), "game.he0");
        assert_eq!(names(&ArchiveNaming::HeWindows, 4, 1, &v7), "game.he1");
        assert_eq!(names(&ArchiveNaming::HeWindows98, 4, 1, &v7), "game.(a)");
        assert_eq!(names(&ArchiveNaming::Humongous, 4, 2, &v7), "game.he2");

        let loom = FormatProfile::new(4).with_features(Features::SMALL_HEADER);
        let c = ArchiveNaming::LucasfilmDisk.candidates("loom", 10, 2, &loom);
        assert_eq!(c.primary, "disk02.lec");
        assert_eq!(c.key, 0x69);
        let c = ArchiveNaming::LucasfilmDisk.candidates("loom", 0, 2, &loom);
        assert_eq!(c.primary, "000.lfl");
        assert!(c.standalone);

        let maniac = FormatProfile::new(2)
            .with_features(Features::SMALL_HEADER | Features::SMALL_NAMES | Features::USE_KEY);
        let c = ArchiveNaming::TwoDigitLfl { alt_man: true }.candidates("maniac", 7, 0, &maniac);
        assert_eq!(c.primary, "07.lfl");
        assert_eq!(c.alternate.as_deref(), Some("07.man"));
        assert_eq!(c.key, 0xFF);

        let by_disk = ArchiveNaming::Pattern(FilenamePattern::new("game.", 2, "").by_disk());
        assert_eq!(names(&by_disk, 9, 3, &v6), "game.03");
    }

    fn disk_archive(rooms: &[(u8, &[u8])]) -> Vec<u8> {
        // LECF { LOFF { count, (room, offset)* }, LFLF { ROOM }* }
        let loff_size = 8 + 1 + 5 * rooms.len();
        let mut lflf = Vec::new();
        let mut table = RoomOffsetTable::default();
        let mut pos = 8 + loff_size;
        for (room, body) in rooms {
            let block = build_block(Tag::LFLF, &build_block(Tag::ROOM, body));
            table.entries.push((*room, (pos + 8) as u32));
            pos += block.len();
            lflf.extend(block);
        }
        let mut payload = build_block(Tag::LOFF, &table.to_bytes());
        payload.extend(lflf);
        build_block(Tag::LECF, &payload)
    }

    fn locator(provider: MemoryProvider, profile: FormatProfile) -> ArchiveLocator {
        let pattern = FilenamePattern::new("", 3, ".lfl");
        ArchiveLocator::new(Box::new(provider), profile, "game", Some(&pattern))
    }

    #[test]
    fn test_open_room_reads_offsets() {
        let provider = MemoryProvider::new()
            .with_file("000.lfl", b"index".to_vec())
            .with_file("001.lfl", disk_archive(&[(1, b"first"), (2, b"second")]));
        let mut locator = locator(provider, FormatProfile::new(6));
        locator.set_dynamic_room_offsets(true);

        let mut rooms = vec![
            DirEntry::default(),
            DirEntry {
                room: 1,
                ..DirEntry::default()
            },
            DirEntry {
                room: 1,
                ..DirEntry::default()
            },
        ];

        locator.open_room(0, &mut rooms).unwrap();
        assert_eq!(locator.current_file(), "000.lfl");
        assert_eq!(locator.file_offset(), 0);

        locator.open_room(1, &mut rooms).unwrap();
        assert_eq!(locator.current_file(), "001.lfl");
        assert_eq!(locator.file_offset(), 35);
        assert_eq!(rooms[2].offset, 35 + 8 + 5 + 8);

        // Room 2 is in the same archive: only the offset moves
        locator.open_room(2, &mut rooms).unwrap();
        assert_eq!(locator.file_offset(), rooms[2].offset);

        let stream = locator.stream().unwrap();
        stream
            .seek(SeekFrom::Start(u64::from(rooms[2].offset)))
            .unwrap();
        let mut header = [0u8; 4];
        stream.read_exact(&mut header).unwrap();
        assert_eq!(&header, b"ROOM");

        locator.close_room(&mut rooms);
        assert_eq!(locator.last_loaded_room(), None);
        assert_eq!(rooms[1].offset, 0);
        assert!(locator.stream().is_err());
    }

    #[test]
    fn test_absent_room_uses_own_file() {
        let provider = MemoryProvider::new().with_file("003.lfl", b"alone".to_vec());
        let mut locator = locator(provider, FormatProfile::new(6));
        let mut rooms = vec![DirEntry::default(); 4];
        rooms[3].offset = ABSENT_OFFSET;

        locator.open_room(3, &mut rooms).unwrap();
        assert_eq!(locator.current_file(), "003.lfl");
        assert_eq!(locator.file_offset(), 0);
        assert!(rooms[3].is_absent());
    }

    #[test]
    fn test_missing_archive_retry_then_abort() {
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        let mut locator = locator(MemoryProvider::new(), FormatProfile::new(6));
        locator.set_handler(Box::new(move |file: &str, disk: u8| {
            assert_eq!(file, "000.lfl");
            assert_eq!(disk, 0);
            seen.set(seen.get() + 1);
            if seen.get() < 3 {
                Recovery::Retry
            } else {
                Recovery::Abort
            }
        }));

        let err = locator.open_room(0, &mut []).unwrap_err();
        assert!(matches!(err, ResourceError::ArchiveMissing { disk: 0, .. }));
        assert_eq!(calls.get(), 3);
        assert_eq!(locator.last_loaded_room(), None);
    }

    #[test]
    fn test_room_missing_from_table() {
        // The offset table points room 2 at the bare LECF header
        let table = RoomOffsetTable {
            entries: vec![(2, MISSING_ROOM_OFFSET)],
        };
        let archive = build_block(Tag::LECF, &build_block(Tag::LOFF, &table.to_bytes()));
        let provider = MemoryProvider::new().with_file("002.lfl", archive);
        let mut locator = locator(provider, FormatProfile::new(6));
        locator.set_dynamic_room_offsets(true);

        let mut rooms = vec![DirEntry::default(); 3];
        rooms[2].room = 1;
        let err = locator.open_room(2, &mut rooms).unwrap_err();
        assert!(matches!(
            err,
            ResourceError::RoomNotInArchive { room: 2, ref file } if file == "002.lfl"
        ));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_xor_key_applied() {
        let mut archive = disk_archive(&[(1, b"body")]);
        crate::xor::xor_in_place(&mut archive, 0x69);
        let provider = MemoryProvider::new().with_file("001.lfl", archive);
        let pattern = FilenamePattern::new("", 3, ".lfl").with_key(0x69);
        let mut locator =
            ArchiveLocator::new(Box::new(provider), FormatProfile::new(6), "game", Some(&pattern));
        locator.set_dynamic_room_offsets(true);
        let mut rooms = vec![
            DirEntry::default(),
            DirEntry {
                room: 1,
                ..DirEntry::default()
            },
        ];
        locator.open_room(1, &mut rooms).unwrap();
        assert_eq!(locator.file_offset(), 8 + 14 + 8);
    }
}
