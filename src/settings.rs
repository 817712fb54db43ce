//! Audio tuning panel options
//!
//! These only pick which loop families play and how they blend; they never
//! affect mission logic.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::audio::LoopFamily;
use crate::error::ConfigError;

/// What plays for one reading layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MusicSource {
    /// Layer is silent
    None,
    /// Continuous oscillator tone
    Wave,
    /// "acid" loop bank
    Acid,
    /// "test_21" loop bank
    #[default]
    #[serde(rename = "test_21")]
    Test21,
}

impl MusicSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MusicSource::None => "none",
            MusicSource::Wave => "wave",
            MusicSource::Acid => "acid",
            MusicSource::Test21 => "test_21",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" => Some(MusicSource::None),
            "wave" | "tone" => Some(MusicSource::Wave),
            "acid" => Some(MusicSource::Acid),
            "test_21" | "test21" => Some(MusicSource::Test21),
            _ => None,
        }
    }

    /// Loop family backing this source, if it is a loop bank
    pub fn loop_family(&self) -> Option<LoopFamily> {
        match self {
            MusicSource::Acid => Some(LoopFamily::Acid),
            MusicSource::Test21 => Some(LoopFamily::Test21),
            MusicSource::None | MusicSource::Wave => None,
        }
    }
}

/// Audio preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Source for the primary reading layer
    pub music_1: MusicSource,
    /// Source for the secondary reading layer
    pub music_2: MusicSource,
    /// Crossfade between neighbouring loops instead of snapping
    pub fade_between_loops: bool,

    /// Master volume (0.0 - 1.0)
    pub master_volume: f64,
    /// Mute all audio
    pub muted: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            music_1: MusicSource::Test21,
            music_2: MusicSource::Acid,
            fade_between_loops: true,

            master_volume: 0.8,
            muted: false,
        }
    }
}

impl Settings {
    /// Gain applied on top of the mix weights by the audio graph
    pub fn effective_volume(&self) -> f64 {
        if self.muted {
            0.0
        } else {
            self.master_volume.clamp(0.0, 1.0)
        }
    }

    /// Whether the secondary layer gets its own voice.
    ///
    /// A loop bank can only be driven by one reading at a time, so a second
    /// layer pointing at the same bank as the first is dropped.
    pub fn secondary_enabled(&self) -> bool {
        match self.music_2 {
            MusicSource::None => false,
            MusicSource::Wave => true,
            other => other != self.music_1,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.music_1 == MusicSource::None {
            return Err(ConfigError::InvalidSettings(
                "music_1 must be a wave or a loop bank".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.master_volume) {
            return Err(ConfigError::InvalidSettings(format!(
                "master_volume {} must be between 0.0 and 1.0",
                self.master_volume
            )));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load settings, falling back to defaults on any failure
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load_from_path(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Using default settings ({e})");
                Self::default()
            }
        }
    }
}
