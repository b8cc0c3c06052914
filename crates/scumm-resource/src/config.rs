//! Resource manager configuration
//!
//! Everything here can be loaded from JSON; missing fields take the
//! defaults below.

use crate::error::{ResourceError, Result};
use scumm_formats::{SmallTag, Tag};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What the number in a [`FilenamePattern`] counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternNumbering {
    /// One archive per room
    #[default]
    Room,
    /// One archive per disk
    Disk,
}

/// Explicit archive naming: `<prefix><number zero-padded to digits><suffix>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilenamePattern {
    /// Text before the number
    pub prefix: String,
    /// Minimum width of the number
    pub digits: usize,
    /// Text after the number
    pub suffix: String,
    /// Whether the number is the room or its disk
    pub numbering: PatternNumbering,
    /// XOR key of every archive
    pub key: u8,
}

impl Default for FilenamePattern {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            digits: 3,
            suffix: ".lfl".to_string(),
            numbering: PatternNumbering::Room,
            key: 0,
        }
    }
}

impl FilenamePattern {
    /// Pattern `<prefix>NNN<suffix>` numbered by room
    pub fn new<P: Into<String>, S: Into<String>>(prefix: P, digits: usize, suffix: S) -> Self {
        Self {
            prefix: prefix.into(),
            digits,
            suffix: suffix.into(),
            ..Self::default()
        }
    }

    /// Number archives by disk instead of room
    #[must_use]
    pub const fn by_disk(mut self) -> Self {
        self.numbering = PatternNumbering::Disk;
        self
    }

    /// Set the XOR key
    #[must_use]
    pub const fn with_key(mut self, key: u8) -> Self {
        self.key = key;
        self
    }

    /// File name for `number`
    pub fn format(&self, number: u32) -> String {
        format!(
            "{}{:0width$}{}",
            self.prefix,
            number,
            self.suffix,
            width = self.digits
        )
    }
}

/// Resource manager configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Archive file name prefix (`monkey2`, `tentacle`, ...)
    pub game_name: String,
    /// Allocations above this trigger eviction
    pub max_heap_threshold: usize,
    /// Eviction frees down to this
    pub min_heap_threshold: usize,
    /// Cardinality of the actor name type
    pub num_actors: usize,
    /// Sub-block tags accepted inside standard sound resources
    pub sound_tags: Vec<String>,
    /// Sub-block tags accepted inside small-header sound resources
    pub small_sound_tags: Vec<String>,
    /// Overrides the profile's archive naming
    pub filename_pattern: Option<FilenamePattern>,
    /// Write every loaded script to `dump_dir`
    pub dump_scripts: bool,
    /// Target directory of resource dumps
    pub dump_dir: PathBuf,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            game_name: String::new(),
            max_heap_threshold: 550_000,
            min_heap_threshold: 400_000,
            num_actors: 13,
            sound_tags: ["SOU ", "SBL ", "ADL ", "ROL ", "GMD ", "MIDI", "SPK ", "AMI "]
                .iter()
                .map(ToString::to_string)
                .collect(),
            small_sound_tags: ["WA", "AD"].iter().map(ToString::to_string).collect(),
            filename_pattern: None,
            dump_scripts: false,
            dump_dir: PathBuf::from("dumps"),
        }
    }
}

impl ResourceConfig {
    /// Create a configuration for `game_name` with defaults
    pub fn new<S: Into<String>>(game_name: S) -> Self {
        Self {
            game_name: game_name.into(),
            ..Self::default()
        }
    }

    /// Parse a JSON configuration and validate it
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ResourceError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the heap water marks
    #[must_use]
    pub const fn with_heap_thresholds(mut self, max: usize, min: usize) -> Self {
        self.max_heap_threshold = max;
        self.min_heap_threshold = min;
        self
    }

    /// Set the number of actors
    #[must_use]
    pub const fn with_num_actors(mut self, num_actors: usize) -> Self {
        self.num_actors = num_actors;
        self
    }

    /// Override the archive naming
    #[must_use]
    pub fn with_filename_pattern(mut self, pattern: FilenamePattern) -> Self {
        self.filename_pattern = Some(pattern);
        self
    }

    /// Enable script dumps into `dir`
    #[must_use]
    pub fn with_script_dumps<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.dump_scripts = true;
        self.dump_dir = dir.into();
        self
    }

    /// Accepted standard sound sub-block tags
    pub fn sound_tags(&self) -> Vec<Tag> {
        self.sound_tags
            .iter()
            .filter_map(|s| Tag::from_str_exact(s))
            .collect()
    }

    /// Accepted small-header sound sub-block tags
    pub fn small_sound_tags(&self) -> Vec<SmallTag> {
        self.small_sound_tags
            .iter()
            .filter_map(|s| SmallTag::from_str_exact(s))
            .collect()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_heap_threshold <= self.min_heap_threshold {
            return Err(ResourceError::Config(format!(
                "max_heap_threshold ({}) must be greater than min_heap_threshold ({})",
                self.max_heap_threshold, self.min_heap_threshold
            )));
        }

        if let Some(bad) = self.sound_tags.iter().find(|s| Tag::from_str_exact(s).is_none()) {
            return Err(ResourceError::Config(format!(
                "sound tag '{bad}' must be exactly 4 bytes"
            )));
        }

        if let Some(bad) = self
            .small_sound_tags
            .iter()
            .find(|s| SmallTag::from_str_exact(s).is_none())
        {
            return Err(ResourceError::Config(format!(
                "small sound tag '{bad}' must be exactly 2 bytes"
            )));
        }

        if let Some(pattern) = &self.filename_pattern
            && pattern.prefix.is_empty()
            && pattern.suffix.is_empty()
        {
            return Err(ResourceError::Config(
                "filename_pattern needs a prefix or a suffix".to_string(),
            ));
        }

        Ok(())
    }
}
