//! Planet-surface field sampler
//!
//! Maps a world position to two readings by projecting it to spherical
//! angles and looking up a two-channel table (nearest cell, no filtering).

use glam::DVec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::error::FieldError;
use crate::{cartesian_to_spherical, remap, spherical_to_cartesian};

/// The two readings taken at one position, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldSample {
    pub primary: f64,
    pub secondary: f64,
}

impl FieldSample {
    /// Returned while the table is not available yet
    pub const NEUTRAL: FieldSample = FieldSample {
        primary: 0.5,
        secondary: 0.5,
    };

    pub fn new(primary: f64, secondary: f64) -> Self {
        Self { primary, secondary }
    }
}

impl Default for FieldSample {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Which of the two field variables a reading belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variable {
    /// First channel ("G-waves")
    Primary,
    /// Second channel ("B-waves")
    Secondary,
}

impl Variable {
    pub const ALL: [Variable; 2] = [Variable::Primary, Variable::Secondary];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Variable::Primary => 0,
            Variable::Secondary => 1,
        }
    }
}

impl FieldSample {
    #[inline]
    pub fn get(&self, variable: Variable) -> f64 {
        match variable {
            Variable::Primary => self.primary,
            Variable::Secondary => self.secondary,
        }
    }
}

/// Readings of both agents for the current tick
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Readings {
    pub left: FieldSample,
    pub right: FieldSample,
}

impl Readings {
    pub fn new(left: FieldSample, right: FieldSample) -> Self {
        Self { left, right }
    }

    /// Signed `left - right` for one variable
    #[inline]
    pub fn difference(&self, variable: Variable) -> f64 {
        self.left.get(variable) - self.right.get(variable)
    }
}

/// A 2D grid of two 8-bit channels, row-major, row 0 at the south pole
#[derive(Debug, Clone)]
pub struct FieldTable {
    width: usize,
    height: usize,
    cells: Vec<[u8; 2]>,
}

impl FieldTable {
    pub fn from_channels(width: usize, height: usize, cells: Vec<[u8; 2]>) -> Result<Self, FieldError> {
        if width == 0 || height == 0 {
            return Err(FieldError::EmptyTable { width, height });
        }
        if cells.len() != width * height {
            return Err(FieldError::SizeMismatch {
                width,
                height,
                expected: width * height * 2,
                actual: cells.len() * 2,
            });
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Build from decoded RGBA pixels; red and green become the two channels
    pub fn from_rgba(width: usize, height: usize, rgba: &[u8]) -> Result<Self, FieldError> {
        if width == 0 || height == 0 {
            return Err(FieldError::EmptyTable { width, height });
        }
        let expected = width * height * 4;
        if rgba.len() != expected {
            return Err(FieldError::SizeMismatch {
                width,
                height,
                expected,
                actual: rgba.len(),
            });
        }
        let cells = rgba.chunks_exact(4).map(|px| [px[0], px[1]]).collect();
        Self::from_channels(width, height, cells)
    }

    /// Build by evaluating `f(x, y)` for every cell
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> Result<Self, FieldError>
    where
        F: FnMut(usize, usize) -> [u8; 2],
    {
        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                cells.push(f(x, y));
            }
        }
        Self::from_channels(width, height, cells)
    }

    /// Seeded smooth field: a handful of random plane waves per channel
    /// evaluated on the sphere, so neighbouring cells (and the seam) agree.
    pub fn procedural(seed: u64, width: usize, height: usize, longitude_offset: f64) -> Result<Self, FieldError> {
        let mut rng = Pcg32::seed_from_u64(seed);
        let waves = |rng: &mut Pcg32| -> Vec<(DVec3, f64)> {
            (0..5)
                .map(|_| {
                    let dir = DVec3::new(
                        rng.random_range(-1.0..1.0),
                        rng.random_range(-1.0..1.0),
                        rng.random_range(-1.0..1.0),
                    )
                    .normalize_or_zero();
                    let freq = rng.random_range(1.5..4.0);
                    (dir * freq, rng.random_range(0.0..std::f64::consts::TAU))
                })
                .collect()
        };
        let primary = waves(&mut rng);
        let secondary = waves(&mut rng);

        let channel = |waves: &[(DVec3, f64)], p: DVec3| -> u8 {
            let sum: f64 = waves.iter().map(|(k, phase)| (k.dot(p) + phase).sin()).sum();
            let v = 0.5 + 0.5 * sum / waves.len() as f64;
            (v.clamp(0.0, 1.0) * 255.0).round() as u8
        };

        Self::from_fn(width, height, |x, y| {
            // Cell centre back to the sphere (inverse of the sampler's mapping)
            let u = ((x as f64 + 0.5) / width as f64 - longitude_offset).rem_euclid(1.0);
            let v = (y as f64 + 0.5) / height as f64;
            let lon = remap(u, 0.0, 1.0, -std::f64::consts::PI, std::f64::consts::PI);
            let lat = remap(v, 0.0, 1.0, -std::f64::consts::FRAC_PI_2, std::f64::consts::FRAC_PI_2);
            let p = spherical_to_cartesian(1.0, lon, lat);
            [channel(&primary, p), channel(&secondary, p)]
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw channels at (x, y); callers must stay in bounds
    #[inline]
    pub fn cell(&self, x: usize, y: usize) -> [u8; 2] {
        self.cells[y * self.width + x]
    }
}

/// Position -> readings lookup
#[derive(Debug, Clone)]
pub struct FieldSampler {
    table: Option<FieldTable>,
    longitude_offset: f64,
}

impl FieldSampler {
    pub fn new(longitude_offset: f64) -> Self {
        Self {
            table: None,
            longitude_offset,
        }
    }

    /// Install the table once the loader has decoded it
    pub fn install(&mut self, table: FieldTable) {
        log::info!("Field table ready ({}x{})", table.width, table.height);
        self.table = Some(table);
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.table.is_some()
    }

    /// Texture coordinates (u, v) in [0, 1) x [0, 1] for a position
    pub fn uv(&self, pos: DVec3) -> (f64, f64) {
        use std::f64::consts::{FRAC_PI_2, PI};

        let (lon, lat) = cartesian_to_spherical(pos);
        let u = remap(lon, -PI, PI, 0.0, 1.0);
        let v = remap(lat, -FRAC_PI_2, FRAC_PI_2, 0.0, 1.0);
        ((u + self.longitude_offset).rem_euclid(1.0), v)
    }

    /// Table cell hit by `pos`, or None while the table is missing
    pub fn cell_index(&self, pos: DVec3) -> Option<(usize, usize)> {
        let table = self.table.as_ref()?;
        let (u, v) = self.uv(pos);
        // Float-to-int casts truncate toward zero and saturate (NaN -> 0)
        let tx = ((u * table.width as f64) as usize).min(table.width - 1);
        let ty = ((v * table.height as f64) as usize).min(table.height - 1);
        Some((tx, ty))
    }

    /// Readings at `pos`; neutral until the table is installed
    pub fn sample(&self, pos: DVec3) -> FieldSample {
        let (Some(table), Some((tx, ty))) = (self.table.as_ref(), self.cell_index(pos)) else {
            return FieldSample::NEUTRAL;
        };
        let [r, g] = table.cell(tx, ty);
        FieldSample {
            primary: r as f64 / 255.0,
            secondary: g as f64 / 255.0,
        }
    }
}
