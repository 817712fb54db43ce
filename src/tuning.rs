//! Data-driven gameplay constants
//!
//! Several builds of the game differ only in these numbers (tolerances, beam
//! placement, how the last trip ends), so they live in a loadable table
//! instead of being baked into the mission code.

use std::path::Path;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::consts::FAST_CUTSCENE_SECS;
use crate::error::ConfigError;

/// Gameplay tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Max |left - right| for a correct placement (strict)
    pub placement_tolerance: f64,
    /// Max |left - right| for both variables on the final check (strict)
    pub final_tolerance: f64,
    /// Distance at which an agent activates a beam (strict)
    pub beam_radius: f64,
    /// Reconfiguring beam shown after the first trip (normalized on use)
    pub beam_1: DVec3,
    /// Final beam shown after the second trip (normalized on use)
    pub beam_2: DVec3,
    /// Correct placements needed to finish a counting trip
    pub placements_per_trip: u8,
    /// Crossing sites closer to the origin than this (squared) are ignored
    pub min_crossing_distance_sq: f64,
    /// Longitude shift applied before the table lookup (moves the seam)
    pub longitude_offset: f64,
    /// Play a short scripted beat between the second and third trip
    pub third_trip_cutscene: bool,
    /// Final beam can be revisited to flip between THIRD_TRIP_A and B
    pub reusable_final_beam: bool,
    /// Debug: collapse every scripted duration to a few milliseconds
    pub fast_cutscenes: bool,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            placement_tolerance: 0.025,
            final_tolerance: 0.05,
            beam_radius: 0.07,
            beam_1: DVec3::new(0.2, 0.5, 0.8),
            beam_2: DVec3::new(0.25, 0.6, -0.75),
            placements_per_trip: 3,
            min_crossing_distance_sq: 0.1,
            longitude_offset: 0.2,
            third_trip_cutscene: false,
            reusable_final_beam: true,
            fast_cutscenes: false,
        }
    }
}

impl Tuning {
    /// Normalized position of beam 1
    pub fn beam_1_pos(&self) -> DVec3 {
        self.beam_1.normalize_or_zero()
    }

    /// Normalized position of beam 2
    pub fn beam_2_pos(&self) -> DVec3 {
        self.beam_2.normalize_or_zero()
    }

    /// Scripted duration, honouring the fast-cutscene switch
    pub fn script_secs(&self, secs: f64) -> f64 {
        if self.fast_cutscenes {
            FAST_CUTSCENE_SECS
        } else {
            secs
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("placement_tolerance", self.placement_tolerance),
            ("final_tolerance", self.final_tolerance),
            ("beam_radius", self.beam_radius),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::InvalidTuning(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if self.beam_1.length_squared() == 0.0 || self.beam_2.length_squared() == 0.0 {
            return Err(ConfigError::InvalidTuning(
                "beam positions must be non-zero".into(),
            ));
        }
        if !(1..=3).contains(&self.placements_per_trip) {
            return Err(ConfigError::InvalidTuning(format!(
                "placements_per_trip must be 1..=3, got {}",
                self.placements_per_trip
            )));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load tuning, falling back to defaults on any failure
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load_from_path(path) {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path.display());
                tuning
            }
            Err(e) => {
                log::warn!("Using default tuning ({e})");
                Self::default()
            }
        }
    }
}
