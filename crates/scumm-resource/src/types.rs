//! Resource type identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a resource
///
/// Ids are stable and start at 1; the evictor walks types in id order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum ResourceType {
    /// Room container
    Room = 1,
    /// Global script
    Script,
    /// Actor costume
    Costume,
    /// Sound
    Sound,
    /// Inventory object
    Inventory,
    /// Character set
    Charset,
    /// String or array
    String,
    /// Verb
    Verb,
    /// Actor name
    ActorName,
    /// Scratch buffer
    Buffer,
    /// Scale table
    ScaleTable,
    /// Temporary data
    Temp,
    /// Floating object
    FlObject,
    /// Box matrix
    Matrix,
    /// Walk box
    Box,
    /// Renamed object
    ObjectName,
    /// Room scripts
    RoomScripts,
    /// Room image
    RoomImage,
    /// Image (Humongous)
    Image,
    /// Talkie (Humongous)
    Talkie,
}

impl ResourceType {
    /// Every type in id order
    pub const ALL: [Self; 20] = [
        Self::Room,
        Self::Script,
        Self::Costume,
        Self::Sound,
        Self::Inventory,
        Self::Charset,
        Self::String,
        Self::Verb,
        Self::ActorName,
        Self::Buffer,
        Self::ScaleTable,
        Self::Temp,
        Self::FlObject,
        Self::Matrix,
        Self::Box,
        Self::ObjectName,
        Self::RoomScripts,
        Self::RoomImage,
        Self::Image,
        Self::Talkie,
    ];

    /// Highest type id
    pub const MAX_ID: u8 = 20;

    /// Numeric id
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Type for a numeric id
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(usize::from(id).checked_sub(1)?).copied()
    }

    /// Diagnostic name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Room => "Room",
            Self::Script => "Script",
            Self::Costume => "Costume",
            Self::Sound => "Sound",
            Self::Inventory => "Inventory",
            Self::Charset => "Charset",
            Self::String => "String",
            Self::Verb => "Verb",
            Self::ActorName => "ActorName",
            Self::Buffer => "Buffer",
            Self::ScaleTable => "ScaleTable",
            Self::Temp => "Temp",
            Self::FlObject => "FlObject",
            Self::Matrix => "Matrix",
            Self::Box => "Box",
            Self::ObjectName => "ObjectName",
            Self::RoomScripts => "RoomScripts",
            Self::RoomImage => "RoomImage",
            Self::Image => "Image",
            Self::Talkie => "Talkie",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How instances of a type come into existence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceMode {
    /// Created directly by the interpreter, no archive backing
    Local,
    /// Loaded lazily from the owning room's archive
    RoomAddressed,
    /// Loaded from the archive through the sound sub-format
    Sound,
}

impl ResourceMode {
    /// Whether instances are loaded from archives
    pub const fn is_room_addressed(self) -> bool {
        !matches!(self, Self::Local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_round_trip() {
        for ty in ResourceType::ALL {
            assert_eq!(ResourceType::from_id(ty.id()), Some(ty));
        }
        assert_eq!(ResourceType::Room.id(), 1);
        assert_eq!(ResourceType::Talkie.id(), ResourceType::MAX_ID);
        assert_eq!(ResourceType::from_id(0), None);
        assert_eq!(ResourceType::from_id(21), None);
    }

    #[test]
    fn test_modes() {
        assert!(ResourceMode::Sound.is_room_addressed());
        assert!(!ResourceMode::Local.is_room_addressed());
        assert_eq!(ResourceType::RoomScripts.to_string(), "RoomScripts");
    }
}
