//! Placement evaluation and marker placement
//!
//! A placement is correct when the left and right readings of the checked
//! variable are closer than the tolerance. Markers go to the last crossing
//! site on a correct guess, otherwise to where the agents stand.

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

use super::agents::{DualAgentTracker, Side};
use super::crossing::CrossingRecord;
use super::field::{Readings, Variable};

/// What a check compares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Check {
    /// One variable (normal placements)
    Single(Variable),
    /// Both variables at once (final check)
    Combined,
}

/// Result of a check
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub correct: bool,
    /// |left - right| of the checked variable (largest of both for `Combined`)
    pub distance: f64,
}

/// Compare readings against a strict tolerance
pub fn evaluate(readings: &Readings, check: Check, tolerance: f64) -> Evaluation {
    let distance = match check {
        Check::Single(variable) => readings.difference(variable).abs(),
        Check::Combined => readings
            .difference(Variable::Primary)
            .abs()
            .max(readings.difference(Variable::Secondary).abs()),
    };
    Evaluation {
        // NaN distances compare false and count as a miss
        correct: distance < tolerance,
        distance,
    }
}

/// Marker glow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerColor {
    /// Wrong placement
    Red,
    /// Correct placement
    Green,
    /// Correct, and the secondary variable matches too
    Cyan,
}

impl MarkerColor {
    pub fn rgb(self) -> [f32; 3] {
        match self {
            MarkerColor::Red => [1.0, 0.0, 0.0],
            MarkerColor::Green => [0.0, 1.0, 0.0],
            MarkerColor::Cyan => [0.0, 1.0, 1.0],
        }
    }
}

/// Where a marker pair was put
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerSite {
    /// At the recorded crossing and its antipode
    Crossing,
    /// At the agents' current transforms
    Live,
}

/// Spawn request for the scene graph
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub side: Side,
    pub position: DVec3,
    pub orientation: DQuat,
    pub color: MarkerColor,
    pub site: MarkerSite,
    /// Failed markers shrink away instead of staying on the planet
    pub persistent: bool,
}

/// Glow for a placement outcome
pub fn marker_color(correct: bool, secondary_matches: bool) -> MarkerColor {
    match (correct, secondary_matches) {
        (false, _) => MarkerColor::Red,
        (true, false) => MarkerColor::Green,
        (true, true) => MarkerColor::Cyan,
    }
}

/// Rotation that points +Z away from the planet centre at `position`
fn outward(position: DVec3) -> DQuat {
    DQuat::from_rotation_arc(DVec3::Z, position.normalize_or(DVec3::Z))
}

/// Build the left/right marker pair for a placement.
///
/// The crossing site is used only for a correct result whose record lies
/// farther than `min_distance_sq` (squared) from the origin; everything
/// else marks the live agent transforms.
pub fn place_markers(
    correct: bool,
    color: MarkerColor,
    crossing: Option<&CrossingRecord>,
    agents: &DualAgentTracker,
    min_distance_sq: f64,
) -> [Marker; 2] {
    let crossing_site = crossing
        .map(|record| record.position)
        .filter(|pos| correct && pos.length_squared() > min_distance_sq);

    match crossing_site {
        Some(pos) => [(Side::Left, pos), (Side::Right, -pos)].map(|(side, position)| Marker {
            side,
            position,
            orientation: outward(position),
            color,
            site: MarkerSite::Crossing,
            persistent: correct,
        }),
        None => Side::BOTH.map(|side| {
            let agent = agents.agent(side);
            Marker {
                side,
                position: agent.position,
                orientation: agent.orientation,
                color,
                site: MarkerSite::Live,
                persistent: correct,
            }
        }),
    }
}
