//! Game state and core simulation types
//!
//! Everything the tick touches lives in `GameState`; the embedding only
//! feeds it input and reads back readings, audio mix, HUD and events.

use glam::DVec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::agents::DualAgentTracker;
use super::crossing::{CrossingDetector, CrossingLog};
use super::evaluate::Marker;
use super::field::{FieldSampler, FieldTable, Readings, Variable};
use super::mission::{Hud, Mission, Waypoint};
use crate::audio::{AudioMix, LoopBank};
use crate::settings::Settings;
use crate::tuning::Tuning;

/// Number of jitter frames in a failed final check shake
pub const SHAKE_FRAMES: usize = 5;
/// Duration of the shake (seconds)
pub const SHAKE_SECS: f64 = 0.3;

/// Current phase of the mission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting on assets
    Loading,
    /// Assets ready, waiting for the first click (audio needs a gesture)
    PressToStart,
    /// Landing intro
    Cutscene1,
    /// Find primary crossings
    FirstTrip,
    /// Go to the reconfiguring beam
    Waiting2,
    /// Switching detectors to the secondary wave
    Cutscene2,
    /// Find secondary crossings
    SecondTrip,
    /// Short beat before the last trip (optional)
    Cutscene3,
    /// Last trip, listening to the secondary wave
    ThirdTripA,
    /// Switching waves through the final beam
    ThirdTripChange,
    /// Last trip, listening to the primary wave
    ThirdTripB,
    /// Win sequence; no more input
    Won,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::Loading => "LOADING",
            GamePhase::PressToStart => "PRESS_TO_START",
            GamePhase::Cutscene1 => "CUTSCENE_1",
            GamePhase::FirstTrip => "FIRST_TRIP",
            GamePhase::Waiting2 => "WAITING_2",
            GamePhase::Cutscene2 => "CUTSCENE_2",
            GamePhase::SecondTrip => "SECOND_TRIP",
            GamePhase::Cutscene3 => "CUTSCENE_3",
            GamePhase::ThirdTripA => "THIRD_TRIP_A",
            GamePhase::ThirdTripChange => "THIRD_TRIP_CHANGE",
            GamePhase::ThirdTripB => "THIRD_TRIP_B",
            GamePhase::Won => "WON",
        }
    }

    /// Variable whose crossings are recorded in this phase
    pub fn crossing_variable(&self) -> Option<Variable> {
        match self {
            GamePhase::FirstTrip | GamePhase::ThirdTripB => Some(Variable::Primary),
            GamePhase::SecondTrip | GamePhase::ThirdTripA => Some(Variable::Secondary),
            _ => None,
        }
    }

    /// Variable checked by a placement in this phase (None = placing is off)
    pub fn placement_variable(&self) -> Option<Variable> {
        match self {
            GamePhase::FirstTrip => Some(Variable::Primary),
            GamePhase::SecondTrip | GamePhase::ThirdTripA => Some(Variable::Secondary),
            _ => None,
        }
    }

    /// Placements here count toward the trip target
    #[inline]
    pub fn counts_placements(&self) -> bool {
        matches!(self, GamePhase::FirstTrip | GamePhase::SecondTrip)
    }

    #[inline]
    pub fn accepts_final_action(&self) -> bool {
        matches!(self, GamePhase::ThirdTripA | GamePhase::ThirdTripB)
    }

    /// Agents respond to movement input
    pub fn allows_steering(&self) -> bool {
        !matches!(
            self,
            GamePhase::Loading | GamePhase::PressToStart | GamePhase::Cutscene1 | GamePhase::Won
        )
    }

    /// A phase where the player searches for crossings
    #[inline]
    pub fn is_trip(&self) -> bool {
        self.crossing_variable().is_some()
    }
}

/// One jitter frame of a screen shake, per camera
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShakeFrame {
    pub left: DVec3,
    pub right: DVec3,
}

/// Things that happened during a tick, for the scene graph, HUD and audio graph
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    PhaseChanged { from: GamePhase, to: GamePhase },
    /// First user gesture; the audio context may start
    AudioStarted,
    Crossing { variable: Variable, position: DVec3 },
    MarkerPlaced(Marker),
    ProgressChanged { count: u8, target: u8 },
    BeamShown { waypoint: Waypoint, position: DVec3 },
    BeamHidden { waypoint: Waypoint },
    /// Final check failed; play these camera offsets over `duration` seconds
    ScreenShake { frames: Vec<ShakeFrame>, duration: f64 },
    Victory,
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Seed for the shake jitter
    pub seed: u64,
    pub tuning: Tuning,
    pub settings: Settings,
    pub field: FieldSampler,
    pub agents: DualAgentTracker,
    pub crossings: CrossingDetector,
    pub crossing_log: CrossingLog,
    pub mission: Mission,
    pub loop_bank: LoopBank,
    /// Readings of both agents from the latest tick
    pub readings: Readings,
    /// Mix computed on the latest tick
    pub audio: AudioMix,
    /// Correct markers currently standing on the planet
    pub markers: Vec<Marker>,
    /// Simulation time (seconds)
    pub time: f64,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub(crate) events: Vec<GameEvent>,
    rng: Pcg32,
}

impl GameState {
    pub fn new(tuning: Tuning, settings: Settings, seed: u64) -> Self {
        Self {
            seed,
            field: FieldSampler::new(tuning.longitude_offset),
            tuning,
            settings,
            agents: DualAgentTracker::new(),
            crossings: CrossingDetector::new(),
            crossing_log: CrossingLog::default(),
            mission: Mission::new(),
            loop_bank: LoopBank::new(),
            readings: Readings::default(),
            audio: AudioMix::default(),
            markers: Vec::new(),
            time: 0.0,
            time_ticks: 0,
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Assets are in: install the lookup table (if it decoded) and the loop
    /// counts, then wait for the first click. A missing table leaves the
    /// sampler on its neutral reading.
    pub fn finish_loading(&mut self, table: Option<FieldTable>, loop_bank: LoopBank) {
        match table {
            Some(table) => self.field.install(table),
            None => log::warn!("No field table; readings stay neutral"),
        }
        self.loop_bank = loop_bank;
        self.mission.finish_loading(&mut self.events);
    }

    #[inline]
    pub fn phase(&self) -> GamePhase {
        self.mission.phase()
    }

    pub fn hud(&self) -> Hud {
        self.mission.hud(&self.tuning)
    }

    /// Events queued since the last drain
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Random camera offsets for a failed final check
    pub(crate) fn shake_frames(&mut self) -> Vec<ShakeFrame> {
        let rng = &mut self.rng;
        let mut jitter = || {
            DVec3::new(
                (rng.random::<f64>() - 0.5) * 0.01,
                (rng.random::<f64>() - 0.5) * 0.05,
                (rng.random::<f64>() - 0.5) * 0.05,
            )
        };
        (0..SHAKE_FRAMES)
            .map(|_| ShakeFrame {
                left: jitter(),
                right: jitter(),
            })
            .collect()
    }
}
