//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time only advances through `tick`
//! - Seeded RNG only
//! - Scripted sequences are tweens, never blocking waits
//! - No rendering, audio device or platform dependencies

pub mod agents;
pub mod crossing;
pub mod evaluate;
pub mod field;
pub mod mission;
pub mod state;
pub mod tick;
pub mod tween;

pub use agents::{Agent, DualAgentTracker, Side};
pub use crossing::{CrossingDetector, CrossingEvent, CrossingLog, CrossingRecord, SignState};
pub use evaluate::{Check, Evaluation, Marker, MarkerColor, MarkerSite, evaluate, place_markers};
pub use field::{FieldSample, FieldSampler, FieldTable, Readings, Variable};
pub use mission::{Beam, Hud, Mission, MissionText, Waypoint};
pub use state::{GameEvent, GamePhase, GameState, ShakeFrame};
pub use tick::{FrameClock, TickInput, tick};
pub use tween::{Easing, Tween};
