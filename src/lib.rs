//! Antipodes - a split-screen resonance hunt on a small planet
//!
//! Core modules:
//! - `sim`: Gameplay simulation (field sampling, crossings, mission flow)
//! - `audio`: Reading-to-loop mix mapping
//! - `input`: Key table and per-tick intent aggregation
//! - `settings`: Audio tuning panel options
//! - `tuning`: Data-driven gameplay constants

pub mod audio;
pub mod error;
pub mod input;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use error::{ConfigError, FieldError};
pub use settings::{MusicSource, Settings};
pub use tuning::Tuning;

use glam::DVec3;

/// Game configuration constants
pub mod consts {
    /// Step used on the very first frame, before a previous timestamp exists
    pub const DEFAULT_FRAME_DT: f64 = 1.0 / 60.0;
    /// Largest step a single tick may take (tab switches, breakpoints)
    pub const MAX_FRAME_DT: f64 = 0.1;

    /// Agent altitude before landing (planet radius is 1)
    pub const START_ALTITUDE: f64 = 3.0;
    /// Agent altitude while driving on the surface
    pub const SURFACE_ALTITUDE: f64 = 1.0;
    /// Altitude the agents reach when flying apart after the win
    pub const ESCAPE_ALTITUDE: f64 = 10.0;

    /// Scale applied to the movement/rotation axes
    pub const AXIS_SCALE: f64 = 0.5;
    /// Rotation about the view axis is this much faster than travel
    pub const SPIN_RATE: f64 = 4.0;
    /// Precision modifier scale for travel
    pub const PRECISION_MOVE_SCALE: f64 = 0.1;
    /// Precision modifier scale for spin
    pub const PRECISION_SPIN_SCALE: f64 = 0.2;

    /// Duration every scripted step collapses to with `fast_cutscenes`
    pub const FAST_CUTSCENE_SECS: f64 = 0.01;
}

/// Linear remap of `value` from `[src_min, src_max]` to `[dst_min, dst_max]`
#[inline]
pub fn remap(value: f64, src_min: f64, src_max: f64, dst_min: f64, dst_max: f64) -> f64 {
    let t = if src_max != src_min {
        (value - src_min) / (src_max - src_min)
    } else {
        0.0
    };
    dst_min + (dst_max - dst_min) * t
}

/// Linear interpolation
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Convert a cartesian position to (longitude, latitude) in radians.
///
/// Longitude is measured in the XZ plane (`atan2(z, x)`, range [-π, π]),
/// latitude from the XZ plane toward +Y (range [-π/2, π/2]).
#[inline]
pub fn cartesian_to_spherical(pos: DVec3) -> (f64, f64) {
    let lon = pos.z.atan2(pos.x);
    let lat = pos.y.atan2((pos.x * pos.x + pos.z * pos.z).sqrt());
    (lon, lat)
}

/// Convert (longitude, latitude) on a sphere of `radius` back to cartesian
#[inline]
pub fn spherical_to_cartesian(radius: f64, lon: f64, lat: f64) -> DVec3 {
    DVec3::new(
        radius * lat.cos() * lon.cos(),
        radius * lat.sin(),
        radius * lat.cos() * lon.sin(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remap() {
        assert!((remap(0.0, -1.0, 1.0, 0.0, 1.0) - 0.5).abs() < 1e-12);
        assert!((remap(5.0, 0.0, 10.0, 100.0, 200.0) - 150.0).abs() < 1e-12);
        // Degenerate source range maps to the start of the target
        assert_eq!(remap(3.0, 1.0, 1.0, 7.0, 9.0), 7.0);
    }

    #[test]
    fn test_spherical_roundtrip() {
        let p = spherical_to_cartesian(1.0, 0.7, -0.3);
        let (lon, lat) = cartesian_to_spherical(p);
        assert!((lon - 0.7).abs() < 1e-12);
        assert!((lat + 0.3).abs() < 1e-12);
        assert!((p.length() - 1.0).abs() < 1e-12);
    }
}
