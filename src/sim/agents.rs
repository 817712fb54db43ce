//! Dual-agent tracker
//!
//! Both agents hang off one shared rig that spins around the planet centre.
//! The left agent sits on the rig's +Z axis and the right agent on -Z
//! (flipped upside down), so they always stand on exact antipodes.

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Which half of the split screen (and which ear) an agent belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }
}

/// World transform of one agent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub side: Side,
    pub position: DVec3,
    pub orientation: DQuat,
}

/// Owns the rig rotation and derives both agents' world transforms
#[derive(Debug, Clone)]
pub struct DualAgentTracker {
    /// Rig rotation (the agents' parent transform)
    rig: DQuat,
    /// Distance of each agent from the planet centre
    altitude: [f64; 2],
    agents: [Agent; 2],
}

impl Default for DualAgentTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl DualAgentTracker {
    pub fn new() -> Self {
        let mut tracker = Self {
            rig: DQuat::IDENTITY,
            altitude: [START_ALTITUDE; 2],
            agents: [
                Agent {
                    side: Side::Left,
                    position: DVec3::ZERO,
                    orientation: DQuat::IDENTITY,
                },
                Agent {
                    side: Side::Right,
                    position: DVec3::ZERO,
                    orientation: DQuat::IDENTITY,
                },
            ],
        };
        tracker.refresh();
        tracker
    }

    /// Apply one tick of steering intents.
    ///
    /// `move_x`/`move_y` travel across the surface, `rotate` spins about the
    /// view axis. All axes are clamped to [-1, 1].
    pub fn steer(&mut self, move_x: f64, move_y: f64, rotate: f64, precision: bool, dt: f64) {
        let clamp_axis = |v: f64| if v.is_finite() { v.clamp(-1.0, 1.0) } else { 0.0 };
        let mut travel_x = clamp_axis(move_x) * AXIS_SCALE;
        let mut travel_y = clamp_axis(move_y) * AXIS_SCALE;
        let mut spin = clamp_axis(rotate) * AXIS_SCALE;
        if precision {
            travel_x *= PRECISION_MOVE_SCALE;
            travel_y *= PRECISION_MOVE_SCALE;
            spin *= PRECISION_SPIN_SCALE;
        }

        // Local-space rotations, applied in Z, Y, X order
        self.rig = (self.rig
            * DQuat::from_rotation_z(spin * SPIN_RATE * dt)
            * DQuat::from_rotation_y(-travel_x * dt)
            * DQuat::from_rotation_x(-travel_y * dt))
        .normalize();
        self.refresh();
    }

    /// Set each agent's distance from the planet centre
    pub fn set_altitudes(&mut self, left: f64, right: f64) {
        self.altitude = [left, right];
        self.refresh();
    }

    /// Replace the rig rotation outright
    pub fn set_rig(&mut self, rig: DQuat) {
        self.rig = rig.normalize();
        self.refresh();
    }

    /// Turn the rig so the left agent stands above `dir`
    pub fn face(&mut self, dir: DVec3) {
        let dir = dir.normalize_or_zero();
        if dir != DVec3::ZERO {
            self.set_rig(DQuat::from_rotation_arc(DVec3::Z, dir));
        }
    }

    #[inline]
    pub fn rig(&self) -> DQuat {
        self.rig
    }

    #[inline]
    pub fn agent(&self, side: Side) -> &Agent {
        &self.agents[side.index()]
    }

    #[inline]
    pub fn left(&self) -> &Agent {
        &self.agents[0]
    }

    #[inline]
    pub fn right(&self) -> &Agent {
        &self.agents[1]
    }

    /// Closest distance from either agent to `point`
    pub fn min_distance_to(&self, point: DVec3) -> f64 {
        self.agents
            .iter()
            .map(|a| a.position.distance(point))
            .fold(f64::INFINITY, f64::min)
    }

    fn refresh(&mut self) {
        let locals = [
            (DVec3::new(0.0, 0.0, self.altitude[0]), DQuat::IDENTITY),
            (
                DVec3::new(0.0, 0.0, -self.altitude[1]),
                DQuat::from_rotation_x(std::f64::consts::PI),
            ),
        ];
        for (agent, (local_pos, local_rot)) in self.agents.iter_mut().zip(locals) {
            agent.position = self.rig * local_pos;
            agent.orientation = self.rig * local_rot;
        }
    }
}
