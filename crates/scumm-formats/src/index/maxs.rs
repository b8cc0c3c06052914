//! Sizing block (`MAXS`)
//!
//! The sizing block declares how many resources of each type exist and how
//! large the interpreter's global tables are. Its field order changed with
//! almost every engine revision; the revision is picked from the profile
//! and the declared block size (see [`FormatProfile::maxs_layout`]).

use crate::error::Result;
use crate::profile::{FormatProfile, MaxsLayout};
use binrw::{BinRead, BinReaderExt, BinWrite};
use std::io::{Read, Seek};
use tracing::trace;

/// Number of shadow palettes in version 7 and later
pub const NUM_SHADOW_PALETTE: u32 = 8;

/// Cardinalities declared by the sizing block and the directories
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameCounts {
    /// Global variables
    pub num_variables: u32,
    /// Bit variables
    pub num_bit_variables: u32,
    /// Room variables (Humongous)
    pub num_room_variables: u32,
    /// Objects per room
    pub num_local_objects: u32,
    /// Array slots
    pub num_array: u32,
    /// Verbs
    pub num_verbs: u32,
    /// Floating objects
    pub num_fl_object: u32,
    /// Inventory slots
    pub num_inventory: u32,
    /// Rooms
    pub num_rooms: u32,
    /// Global scripts stored in the archives
    pub num_scripts: u32,
    /// Sounds
    pub num_sounds: u32,
    /// Charsets
    pub num_charsets: u32,
    /// Costumes
    pub num_costumes: u32,
    /// Global objects
    pub num_global_objects: u32,
    /// Images (Humongous)
    pub num_images: u32,
    /// Sprites (Humongous)
    pub num_sprites: u32,
    /// Local scripts (Humongous)
    pub num_local_scripts: u32,
    /// Palettes (Humongous)
    pub num_palettes: u32,
    /// Unidentified Humongous count
    pub num_unk: u32,
    /// Talkies (Humongous)
    pub num_talkies: u32,
    /// Renamed object slots
    pub num_new_names: u32,
    /// Global script slots the interpreter reserves
    pub num_global_scripts: u32,
    /// Shadow palette buffer size in bytes
    pub shadow_palette_size: u32,
    /// Whether the object directory carries a room table
    pub has_object_room_table: bool,
}

/// Version 8 sizing block
#[derive(Debug, Clone, Default, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
#[allow(missing_docs)]
pub struct MaxsV8 {
    #[brw(pad_before = 100)]
    pub num_variables: u32,
    pub num_bit_variables: u32,
    pub reserved1: u32,
    pub num_scripts: u32,
    pub num_sounds: u32,
    pub num_charsets: u32,
    pub num_costumes: u32,
    pub num_rooms: u32,
    pub reserved2: u32,
    pub num_global_objects: u32,
    pub reserved3: u32,
    pub num_local_objects: u32,
    pub num_new_names: u32,
    pub num_fl_object: u32,
    pub num_inventory: u32,
    pub num_array: u32,
    pub num_verbs: u32,
}

/// Version 7 sizing block
#[derive(Debug, Clone, Default, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
#[allow(missing_docs)]
pub struct MaxsV7 {
    #[brw(pad_before = 100)]
    pub num_variables: u16,
    pub num_bit_variables: u16,
    pub reserved1: u16,
    pub num_global_objects: u16,
    pub num_local_objects: u16,
    pub num_new_names: u16,
    pub num_verbs: u16,
    pub num_fl_object: u16,
    pub num_inventory: u16,
    pub num_array: u16,
    pub num_rooms: u16,
    pub num_scripts: u16,
    pub num_sounds: u16,
    pub num_charsets: u16,
    pub num_costumes: u16,
}

/// Humongous C++ engine sizing block
#[derive(Debug, Clone, Default, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
#[allow(missing_docs)]
pub struct MaxsHeCpp {
    pub num_variables: u16,
    pub reserved1: u16,
    pub num_room_variables: u16,
    pub num_local_objects: u16,
    pub num_array: u16,
    pub reserved2: u16,
    pub reserved3: u16,
    pub num_fl_object: u16,
    pub num_inventory: u16,
    pub num_rooms: u16,
    pub num_scripts: u16,
    pub num_sounds: u16,
    pub num_charsets: u16,
    pub num_costumes: u16,
    pub num_global_objects: u16,
    pub num_images: u16,
    pub num_sprites: u16,
    pub num_local_scripts: u16,
    pub heap: u16,
    pub num_palettes: u16,
    pub num_unk: u16,
    pub num_talkies: u16,
}

/// Humongous Scummsys.9x sizing block
#[derive(Debug, Clone, Default, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
#[allow(missing_docs)]
pub struct MaxsHe9x {
    pub num_variables: u16,
    pub reserved1: u16,
    pub num_room_variables: u16,
    pub num_local_objects: u16,
    pub num_array: u16,
    pub reserved2: u16,
    pub reserved3: u16,
    pub num_fl_object: u16,
    pub num_inventory: u16,
    pub num_rooms: u16,
    pub num_scripts: u16,
    pub num_sounds: u16,
    pub num_charsets: u16,
    pub num_costumes: u16,
    pub num_global_objects: u16,
    pub num_images: u16,
    pub num_sprites: u16,
    pub num_local_scripts: u16,
    pub heap: u16,
}

/// Humongous sputm7.2 sizing block
#[derive(Debug, Clone, Default, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
#[allow(missing_docs)]
pub struct MaxsHe72 {
    pub num_variables: u16,
    pub reserved1: u16,
    pub num_bit_variables: u16,
    pub num_local_objects: u16,
    pub num_array: u16,
    pub reserved2: u16,
    pub num_verbs: u16,
    pub num_fl_object: u16,
    pub num_inventory: u16,
    pub num_rooms: u16,
    pub num_scripts: u16,
    pub num_sounds: u16,
    pub num_charsets: u16,
    pub num_costumes: u16,
    pub num_global_objects: u16,
    pub num_images: u16,
}

/// Version 6 sizing block
#[derive(Debug, Clone, Default, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
#[allow(missing_docs)]
pub struct MaxsV6 {
    pub num_variables: u16,
    pub reserved1: u16,
    pub num_bit_variables: u16,
    pub num_local_objects: u16,
    pub num_array: u16,
    pub reserved2: u16,
    pub num_verbs: u16,
    pub num_fl_object: u16,
    pub num_inventory: u16,
    pub num_rooms: u16,
    pub num_scripts: u16,
    pub num_sounds: u16,
    pub num_charsets: u16,
    pub num_costumes: u16,
    pub num_global_objects: u16,
}

/// Version 5 and earlier sizing block
#[derive(Debug, Clone, Default, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
#[allow(missing_docs)]
pub struct MaxsClassic {
    pub num_variables: u16,
    pub reserved1: u16,
    pub num_bit_variables: u16,
    pub num_local_objects: u16,
    pub reserved2: u16,
    pub num_charsets: u16,
    pub reserved3: u16,
    pub reserved4: u16,
    pub num_inventory: u16,
}

impl MaxsV6 {
    /// Encoded payload size
    pub const SIZE: u32 = 30;

    /// Fill a version 6 block from counts
    pub fn from_counts(counts: &GameCounts) -> Self {
        Self {
            num_variables: counts.num_variables as u16,
            num_bit_variables: counts.num_bit_variables as u16,
            num_local_objects: counts.num_local_objects as u16,
            num_array: counts.num_array as u16,
            num_verbs: counts.num_verbs as u16,
            num_fl_object: counts.num_fl_object as u16,
            num_inventory: counts.num_inventory as u16,
            num_rooms: counts.num_rooms as u16,
            num_scripts: counts.num_scripts as u16,
            num_sounds: counts.num_sounds as u16,
            num_charsets: counts.num_charsets as u16,
            num_costumes: counts.num_costumes as u16,
            num_global_objects: counts.num_global_objects as u16,
            ..Self::default()
        }
    }

    /// Encode the payload
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut cursor = std::io::Cursor::new(Vec::with_capacity(Self::SIZE as usize));
        self.write_le(&mut cursor)?;
        Ok(cursor.into_inner())
    }
}

/// Parse a sizing block payload into `counts`
///
/// `counts` may already hold room, script, costume, sound and object
/// counts gathered from the directories; the classic layout keeps them.
/// Derived globals (new names, global scripts, shadow palette) are filled
/// for every layout.
pub fn read_sizing_block<R: Read + Seek>(
    reader: &mut R,
    profile: &FormatProfile,
    block_size: u32,
    counts: &mut GameCounts,
) -> Result<MaxsLayout> {
    let layout = profile.maxs_layout(block_size)?;
    trace!("MAXS block of size {} uses {:?} layout", block_size, layout);

    match layout {
        MaxsLayout::V8 => {
            let m: MaxsV8 = reader.read_le()?;
            counts.num_variables = m.num_variables;
            counts.num_bit_variables = m.num_bit_variables;
            counts.num_scripts = m.num_scripts;
            counts.num_sounds = m.num_sounds;
            counts.num_charsets = m.num_charsets;
            counts.num_costumes = m.num_costumes;
            counts.num_rooms = m.num_rooms;
            counts.num_global_objects = m.num_global_objects;
            counts.num_local_objects = m.num_local_objects;
            counts.num_new_names = m.num_new_names;
            counts.num_fl_object = m.num_fl_object;
            counts.num_inventory = m.num_inventory;
            counts.num_array = m.num_array;
            counts.num_verbs = m.num_verbs;
            counts.has_object_room_table = true;
            counts.shadow_palette_size = NUM_SHADOW_PALETTE * 256;
        }
        MaxsLayout::V7 => {
            let m: MaxsV7 = reader.read_le()?;
            counts.num_variables = m.num_variables.into();
            counts.num_bit_variables = m.num_bit_variables.into();
            counts.num_global_objects = m.num_global_objects.into();
            counts.num_local_objects = m.num_local_objects.into();
            counts.num_new_names = m.num_new_names.into();
            counts.num_verbs = m.num_verbs.into();
            counts.num_fl_object = m.num_fl_object.into();
            counts.num_inventory = m.num_inventory.into();
            counts.num_array = m.num_array.into();
            counts.num_rooms = m.num_rooms.into();
            counts.num_scripts = m.num_scripts.into();
            counts.num_sounds = m.num_sounds.into();
            counts.num_charsets = m.num_charsets.into();
            counts.num_costumes = m.num_costumes.into();
            counts.has_object_room_table = true;
            counts.shadow_palette_size = NUM_SHADOW_PALETTE * 256;
        }
        MaxsLayout::HeCpp => {
            let m: MaxsHeCpp = reader.read_le()?;
            counts.num_variables = m.num_variables.into();
            counts.num_room_variables = m.num_room_variables.into();
            counts.num_local_objects = m.num_local_objects.into();
            counts.num_array = m.num_array.into();
            counts.num_fl_object = m.num_fl_object.into();
            counts.num_inventory = m.num_inventory.into();
            counts.num_rooms = m.num_rooms.into();
            counts.num_scripts = m.num_scripts.into();
            counts.num_sounds = m.num_sounds.into();
            counts.num_charsets = m.num_charsets.into();
            counts.num_costumes = m.num_costumes.into();
            counts.num_global_objects = m.num_global_objects.into();
            counts.num_images = m.num_images.into();
            counts.num_sprites = m.num_sprites.into();
            counts.num_local_scripts = m.num_local_scripts.into();
            counts.num_palettes = m.num_palettes.into();
            counts.num_unk = m.num_unk.into();
            counts.num_talkies = m.num_talkies.into();
            counts.num_new_names = 10;
            counts.has_object_room_table = true;
        }
        MaxsLayout::He9x => {
            let m: MaxsHe9x = reader.read_le()?;
            counts.num_variables = m.num_variables.into();
            counts.num_room_variables = m.num_room_variables.into();
            counts.num_local_objects = m.num_local_objects.into();
            counts.num_array = m.num_array.into();
            counts.num_fl_object = m.num_fl_object.into();
            counts.num_inventory = m.num_inventory.into();
            counts.num_rooms = m.num_rooms.into();
            counts.num_scripts = m.num_scripts.into();
            counts.num_sounds = m.num_sounds.into();
            counts.num_charsets = m.num_charsets.into();
            counts.num_costumes = m.num_costumes.into();
            counts.num_global_objects = m.num_global_objects.into();
            counts.num_images = m.num_images.into();
            counts.num_sprites = m.num_sprites.into();
            counts.num_local_scripts = m.num_local_scripts.into();
            counts.num_new_names = 10;
            counts.has_object_room_table = true;
        }
        MaxsLayout::He72 => {
            let m: MaxsHe72 = reader.read_le()?;
            counts.num_variables = m.num_variables.into();
            counts.num_bit_variables = m.num_bit_variables.into();
            counts.num_room_variables = m.num_bit_variables.into();
            counts.num_local_objects = m.num_local_objects.into();
            counts.num_array = m.num_array.into();
            counts.num_verbs = m.num_verbs.into();
            counts.num_fl_object = m.num_fl_object.into();
            counts.num_inventory = m.num_inventory.into();
            counts.num_rooms = m.num_rooms.into();
            counts.num_scripts = m.num_scripts.into();
            counts.num_sounds = m.num_sounds.into();
            counts.num_charsets = m.num_charsets.into();
            counts.num_costumes = m.num_costumes.into();
            counts.num_global_objects = m.num_global_objects.into();
            counts.num_images = m.num_images.into();
            counts.num_new_names = 10;
            counts.has_object_room_table = true;
        }
        MaxsLayout::V6 => {
            let m: MaxsV6 = reader.read_le()?;
            counts.num_variables = m.num_variables.into();
            counts.num_bit_variables = m.num_bit_variables.into();
            counts.num_local_objects = m.num_local_objects.into();
            counts.num_array = m.num_array.into();
            counts.num_verbs = m.num_verbs.into();
            counts.num_fl_object = m.num_fl_object.into();
            counts.num_inventory = m.num_inventory.into();
            counts.num_rooms = m.num_rooms.into();
            counts.num_scripts = m.num_scripts.into();
            counts.num_sounds = m.num_sounds.into();
            counts.num_charsets = m.num_charsets.into();
            counts.num_costumes = m.num_costumes.into();
            counts.num_global_objects = m.num_global_objects.into();
            counts.num_new_names = 50;
            counts.has_object_room_table = profile.is_he_windows();
            counts.shadow_palette_size = 256;
        }
        MaxsLayout::Classic => {
            let m: MaxsClassic = reader.read_le()?;
            counts.num_variables = m.num_variables.into();
            counts.num_bit_variables = m.num_bit_variables.into();
            counts.num_local_objects = m.num_local_objects.into();
            counts.num_charsets = m.num_charsets.into();
            counts.num_inventory = m.num_inventory.into();
            counts.num_array = 50;
            counts.num_verbs = 100;
            // 50 was too small for some titles
            counts.num_new_names = 150;
            counts.num_fl_object = 50;
            counts.has_object_room_table = false;
            counts.shadow_palette_size = 256;
        }
    }

    counts.num_global_scripts = profile.num_global_scripts(layout);
    Ok(layout)
}
