//! Audio mix mapping
//!
//! Turns the continuous readings into per-ear gain tables for the loop
//! banks, or into oscillator settings in tone mode. Nothing here touches an
//! audio device; the embedding feeds the numbers into its own graph.

use serde::{Deserialize, Serialize};

use crate::settings::{MusicSource, Settings};
use crate::sim::agents::Side;
use crate::sim::field::{Readings, Variable};

/// Gain of a tone voice while its layer is audible
pub const TONE_GAIN: f64 = 0.3;
/// Reference pitch of both tone voices (Hz)
pub const TONE_BASE_HZ: f64 = 440.0;
/// Octaves spanned by a full reading sweep
pub const TONE_OCTAVE_SPAN: f64 = 0.6;

/// A family of pre-rendered loops, ordered from low to high reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopFamily {
    Acid,
    #[serde(rename = "test_21")]
    Test21,
}

impl LoopFamily {
    pub const ALL: [LoopFamily; 2] = [LoopFamily::Acid, LoopFamily::Test21];

    pub fn as_str(&self) -> &'static str {
        match self {
            LoopFamily::Acid => "acid",
            LoopFamily::Test21 => "test_21",
        }
    }

    /// Number of loops shipped for this family
    pub fn default_track_count(&self) -> usize {
        match self {
            LoopFamily::Acid => 6,
            LoopFamily::Test21 => 6,
        }
    }

    #[inline]
    fn index(self) -> usize {
        match self {
            LoopFamily::Acid => 0,
            LoopFamily::Test21 => 1,
        }
    }
}

/// Loaded track counts per family. Everything is empty until the loader
/// registers its buffers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopBank {
    counts: [usize; 2],
}

impl LoopBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bank with every family at its shipped track count
    pub fn with_defaults() -> Self {
        let mut bank = Self::new();
        for family in LoopFamily::ALL {
            bank.set_track_count(family, family.default_track_count());
        }
        bank
    }

    pub fn set_track_count(&mut self, family: LoopFamily, count: usize) {
        log::debug!("Loop family {} has {} tracks", family.as_str(), count);
        self.counts[family.index()] = count;
    }

    #[inline]
    pub fn track_count(&self, family: LoopFamily) -> usize {
        self.counts[family.index()]
    }
}

/// Crossfade weights of `track_count` ordered loops for one reading.
///
/// The reading picks a fractional index into the loops. With `fade` the
/// gain splits between the two neighbours, otherwise the lower one gets it
/// all. An empty family yields an empty table.
pub fn mix(reading: f64, track_count: usize, fade: bool) -> Vec<f64> {
    if track_count == 0 {
        return Vec::new();
    }
    let reading = if reading.is_finite() {
        reading.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let last = track_count - 1;
    let index = reading * last as f64;
    let lower = (index.floor() as usize).min(last);
    let frac = index - lower as f64;

    let mut gains = vec![0.0; track_count];
    if !fade || frac <= 0.0 || lower == last {
        gains[lower] = 1.0;
    } else {
        gains[lower] = 1.0 - frac;
        gains[lower + 1] = frac;
    }
    gains
}

/// How loud each reading layer is right now (0 = muted, 1 = full)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LayerLevels {
    pub primary: f64,
    pub secondary: f64,
}

impl LayerLevels {
    pub const SILENT: LayerLevels = LayerLevels {
        primary: 0.0,
        secondary: 0.0,
    };
    pub const PRIMARY: LayerLevels = LayerLevels {
        primary: 1.0,
        secondary: 0.0,
    };
    pub const SECONDARY: LayerLevels = LayerLevels {
        primary: 0.0,
        secondary: 1.0,
    };

    #[inline]
    pub fn get(&self, variable: Variable) -> f64 {
        match variable {
            Variable::Primary => self.primary,
            Variable::Secondary => self.secondary,
        }
    }

    pub fn scaled(self, factor: f64) -> Self {
        Self {
            primary: self.primary * factor,
            secondary: self.secondary * factor,
        }
    }
}

/// Levels while the wave-switch blend sits at `t` (0 = primary, 1 = secondary).
/// The primary layer fades out over the first half, the secondary fades in
/// over the second; they never overlap.
pub fn blend_levels(t: f64) -> LayerLevels {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        LayerLevels {
            primary: 1.0 - 2.0 * t,
            secondary: 0.0,
        }
    } else {
        LayerLevels {
            primary: 0.0,
            secondary: 2.0 * (t - 0.5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToneShape {
    Triangle,
    Sine,
}

/// Oscillator settings for tone mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneVoice {
    pub shape: ToneShape,
    pub frequency: f64,
    pub gain: f64,
}

/// Tone pitch for a reading. The secondary voice sits `TONE_OCTAVE_SPAN`
/// octaves below the primary one.
pub fn tone_frequency(variable: Variable, reading: f64) -> f64 {
    let reading = if reading.is_finite() {
        reading.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let octaves = match variable {
        Variable::Primary => TONE_OCTAVE_SPAN * reading,
        Variable::Secondary => -TONE_OCTAVE_SPAN + TONE_OCTAVE_SPAN * reading,
    };
    TONE_BASE_HZ * octaves.exp2()
}

/// One reading layer of one ear
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum LayerMix {
    #[default]
    Silent,
    /// Per-track gains of a loop family, already scaled by the layer level
    Loops { family: LoopFamily, gains: Vec<f64> },
    Tone(ToneVoice),
}

impl LayerMix {
    /// Sum of all gains in this layer
    pub fn total_gain(&self) -> f64 {
        match self {
            LayerMix::Silent => 0.0,
            LayerMix::Loops { gains, .. } => gains.iter().sum(),
            LayerMix::Tone(voice) => voice.gain,
        }
    }
}

/// Both layers heard by one ear
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EarMix {
    pub primary: LayerMix,
    pub secondary: LayerMix,
}

impl EarMix {
    pub fn layer(&self, variable: Variable) -> &LayerMix {
        match variable {
            Variable::Primary => &self.primary,
            Variable::Secondary => &self.secondary,
        }
    }
}

/// Complete mix for one tick
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AudioMix {
    pub left: EarMix,
    pub right: EarMix,
    /// Output volume from the settings; applied by the embedding
    pub master_gain: f64,
}

impl AudioMix {
    pub fn ear(&self, side: Side) -> &EarMix {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// Gain of `track` of a loop layer, 0 if the layer isn't playing loops
    pub fn gain(&self, side: Side, variable: Variable, track: usize) -> f64 {
        match self.ear(side).layer(variable) {
            LayerMix::Loops { gains, .. } => gains.get(track).copied().unwrap_or(0.0),
            _ => 0.0,
        }
    }
}

fn layer_mix(
    source: MusicSource,
    variable: Variable,
    reading: f64,
    level: f64,
    bank: &LoopBank,
    fade: bool,
) -> LayerMix {
    if level <= 0.0 {
        return LayerMix::Silent;
    }
    match source {
        MusicSource::None => LayerMix::Silent,
        MusicSource::Wave => LayerMix::Tone(ToneVoice {
            shape: match variable {
                Variable::Primary => ToneShape::Triangle,
                Variable::Secondary => ToneShape::Sine,
            },
            frequency: tone_frequency(variable, reading),
            gain: TONE_GAIN,
        }),
        MusicSource::Acid | MusicSource::Test21 => {
            let Some(family) = source.loop_family() else {
                return LayerMix::Silent;
            };
            let count = bank.track_count(family);
            if count == 0 {
                return LayerMix::Silent;
            }
            let level = level.min(1.0);
            let gains = mix(reading, count, fade)
                .into_iter()
                .map(|g| g * level)
                .collect();
            LayerMix::Loops { family, gains }
        }
    }
}

/// Recompute the full mix from this tick's readings and layer levels.
///
/// `music_1` follows the primary reading and `music_2` the secondary one;
/// `music_2` is dropped when it would replay the `music_1` bank.
pub fn compute_mix(
    settings: &Settings,
    bank: &LoopBank,
    readings: &Readings,
    levels: [LayerLevels; 2],
) -> AudioMix {
    let fade = settings.fade_between_loops;
    let ear = |side: Side| {
        let sample = match side {
            Side::Left => readings.left,
            Side::Right => readings.right,
        };
        let level = levels[side.index()];
        let secondary_source = if settings.secondary_enabled() {
            settings.music_2
        } else {
            MusicSource::None
        };
        EarMix {
            primary: layer_mix(
                settings.music_1,
                Variable::Primary,
                sample.primary,
                level.primary,
                bank,
                fade,
            ),
            secondary: layer_mix(
                secondary_source,
                Variable::Secondary,
                sample.secondary,
                level.secondary,
                bank,
                fade,
            ),
        }
    };
    AudioMix {
        left: ear(Side::Left),
        right: ear(Side::Right),
        master_gain: settings.effective_volume(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::field::FieldSample;
    use proptest::prelude::*;

    fn close(a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-9)
    }

    #[test]
    fn test_mix_exact_index() {
        let expected = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        assert!(close(&mix(0.6, 6, true), &expected));
        assert!(close(&mix(0.6, 6, false), &expected));
    }

    #[test]
    fn test_mix_fractional_index() {
        assert!(close(&mix(0.65, 6, true), &[0.0, 0.0, 0.0, 0.75, 0.25, 0.0]));
        assert!(close(&mix(0.65, 6, false), &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0]));
    }

    #[test]
    fn test_mix_edges() {
        assert!(mix(0.5, 0, true).is_empty());
        assert!(close(&mix(0.7, 1, true), &[1.0]));
        assert!(close(&mix(1.0, 4, true), &[0.0, 0.0, 0.0, 1.0]));
        assert!(close(&mix(0.0, 4, true), &[1.0, 0.0, 0.0, 0.0]));
        assert!(close(&mix(f64::NAN, 3, true), &[1.0, 0.0, 0.0]));
        assert!(close(&mix(7.0, 3, true), &[0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_blend_levels() {
        assert_eq!(blend_levels(0.0), LayerLevels::PRIMARY);
        assert_eq!(blend_levels(1.0), LayerLevels::SECONDARY);
        let quarter = blend_levels(0.25);
        assert!((quarter.primary - 0.5).abs() < 1e-12);
        assert_eq!(quarter.secondary, 0.0);
        let mid = blend_levels(0.5);
        assert_eq!(mid, LayerLevels::SILENT);
        let late = blend_levels(0.75);
        assert_eq!(late.primary, 0.0);
        assert!((late.secondary - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_tone_frequency() {
        assert!((tone_frequency(Variable::Primary, 0.0) - 440.0).abs() < 1e-9);
        assert!((tone_frequency(Variable::Primary, 1.0) - 440.0 * 0.6f64.exp2()).abs() < 1e-9);
        assert!((tone_frequency(Variable::Secondary, 1.0) - 440.0).abs() < 1e-9);
        assert!((tone_frequency(Variable::Secondary, 0.0) - 440.0 * (-0.6f64).exp2()).abs() < 1e-9);
    }

    fn readings() -> Readings {
        Readings::new(FieldSample::new(0.65, 0.2), FieldSample::new(0.6, 0.8))
    }

    #[test]
    fn test_compute_mix_loops_per_ear() {
        let settings = Settings::default();
        let bank = LoopBank::with_defaults();
        let levels = [LayerLevels::PRIMARY, LayerLevels::PRIMARY.scaled(0.5)];
        let out = compute_mix(&settings, &bank, &readings(), levels);

        assert!((out.gain(Side::Left, Variable::Primary, 3) - 0.75).abs() < 1e-9);
        assert!((out.gain(Side::Left, Variable::Primary, 4) - 0.25).abs() < 1e-9);
        assert!((out.gain(Side::Right, Variable::Primary, 3) - 0.5).abs() < 1e-9);
        assert_eq!(out.left.secondary, LayerMix::Silent);
        assert!(matches!(
            out.left.primary,
            LayerMix::Loops { family: LoopFamily::Test21, .. }
        ));
        // Mix weights sum to one, scaled by the layer level
        assert!((out.left.primary.total_gain() - 1.0).abs() < 1e-9);
        assert!((out.right.primary.total_gain() - 0.5).abs() < 1e-9);
        assert_eq!(out.left.secondary.total_gain(), 0.0);
        assert!((out.master_gain - settings.effective_volume()).abs() < 1e-12);
    }

    #[test]
    fn test_compute_mix_secondary_layer() {
        let settings = Settings::default();
        let bank = LoopBank::with_defaults();
        let out = compute_mix(&settings, &bank, &readings(), [LayerLevels::SECONDARY; 2]);
        assert_eq!(out.left.primary, LayerMix::Silent);
        // 0.2 * 5 = 1.0
        assert!((out.gain(Side::Left, Variable::Secondary, 1) - 1.0).abs() < 1e-9);
        assert!(matches!(
            out.right.secondary,
            LayerMix::Loops { family: LoopFamily::Acid, .. }
        ));
    }

    #[test]
    fn test_duplicate_or_missing_secondary_is_skipped() {
        let bank = LoopBank::with_defaults();
        for music_2 in [MusicSource::None, MusicSource::Test21] {
            let settings = Settings {
                music_2,
                ..Settings::default()
            };
            let out = compute_mix(&settings, &bank, &readings(), [LayerLevels::SECONDARY; 2]);
            assert_eq!(out.left.secondary, LayerMix::Silent);
            assert_eq!(out.right.secondary, LayerMix::Silent);
        }
    }

    #[test]
    fn test_empty_bank_is_silent() {
        let out = compute_mix(
            &Settings::default(),
            &LoopBank::new(),
            &readings(),
            [LayerLevels::PRIMARY; 2],
        );
        assert_eq!(out.left.primary, LayerMix::Silent);
        assert_eq!(out.right.primary, LayerMix::Silent);
    }

    #[test]
    fn test_tone_mode_toggles_fixed_gain() {
        let settings = Settings {
            music_1: MusicSource::Wave,
            music_2: MusicSource::Wave,
            ..Settings::default()
        };
        let bank = LoopBank::new();
        let levels = [LayerLevels::PRIMARY.scaled(0.2), LayerLevels::SILENT];
        let out = compute_mix(&settings, &bank, &readings(), levels);
        match out.left.primary {
            LayerMix::Tone(voice) => {
                assert_eq!(voice.shape, ToneShape::Triangle);
                assert_eq!(voice.gain, TONE_GAIN);
                assert!((voice.frequency - tone_frequency(Variable::Primary, 0.65)).abs() < 1e-9);
            }
            ref other => panic!("expected tone, got {other:?}"),
        }
        assert_eq!(out.left.secondary, LayerMix::Silent);
        assert_eq!(out.right.primary, LayerMix::Silent);
    }

    proptest! {
        #[test]
        fn prop_mix_sums_to_one(reading in -0.5f64..1.5, n in 0usize..32, fade in any::<bool>()) {
            let gains = mix(reading, n, fade);
            prop_assert_eq!(gains.len(), n);
            if n > 0 {
                let sum: f64 = gains.iter().sum();
                prop_assert!((sum - 1.0).abs() < 1e-9);
                prop_assert!(gains.iter().all(|g| (0.0..=1.0).contains(g)));
                prop_assert!(gains.iter().filter(|g| **g > 0.0).count() <= 2);
            }
        }
    }
}
