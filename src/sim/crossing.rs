//! Equality-crossing detection
//!
//! Watches the sign of `left - right` for both variables and reports the
//! tick on which it changes. The left agent's position is the canonical
//! crossing site; its antipode is implied for the right half.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use super::field::{Readings, Variable};

/// Sign with an explicit zero (`f64::signum` maps 0.0 to 1.0)
#[inline]
pub fn sign(x: f64) -> i8 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}

/// Last observed sign per variable; `None` until the first sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignState {
    pub primary: Option<i8>,
    pub secondary: Option<i8>,
}

impl SignState {
    #[inline]
    pub fn get(&self, variable: Variable) -> Option<i8> {
        match variable {
            Variable::Primary => self.primary,
            Variable::Secondary => self.secondary,
        }
    }

    #[inline]
    fn slot(&mut self, variable: Variable) -> &mut Option<i8> {
        match variable {
            Variable::Primary => &mut self.primary,
            Variable::Secondary => &mut self.secondary,
        }
    }
}

/// A sign change of one variable on the current tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossingEvent {
    pub variable: Variable,
    /// Left agent's world position on the crossing tick
    pub position: DVec3,
}

/// The most recent accepted crossing of one variable
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossingRecord {
    pub variable: Variable,
    pub position: DVec3,
    /// Simulation time (seconds) of the crossing
    pub timestamp: f64,
}

/// Sign tracker for both variables
#[derive(Debug, Clone, Default)]
pub struct CrossingDetector {
    signs: SignState,
}

impl CrossingDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget history; the next observation can't fire
    pub fn reset(&mut self) {
        self.signs = SignState::default();
    }

    #[inline]
    pub fn signs(&self) -> SignState {
        self.signs
    }

    /// Feed one variable's readings. Returns true when its sign changed from
    /// a previous value (a move to or from zero counts).
    pub fn step(&mut self, variable: Variable, left: f64, right: f64) -> bool {
        let current = sign(left - right);
        let slot = self.signs.slot(variable);
        let crossed = matches!(*slot, Some(previous) if previous != current);
        *slot = Some(current);
        crossed
    }

    /// Feed both variables, tagging any crossing with `site`
    pub fn observe(&mut self, readings: &Readings, site: DVec3) -> [Option<CrossingEvent>; 2] {
        Variable::ALL.map(|variable| {
            self.step(
                variable,
                readings.left.get(variable),
                readings.right.get(variable),
            )
            .then_some(CrossingEvent {
                variable,
                position: site,
            })
        })
    }
}

/// Last accepted crossing per variable
#[derive(Debug, Clone, Default)]
pub struct CrossingLog {
    last: [Option<CrossingRecord>; 2],
}

impl CrossingLog {
    pub fn record(&mut self, event: CrossingEvent, timestamp: f64) {
        self.last[event.variable.index()] = Some(CrossingRecord {
            variable: event.variable,
            position: event.position,
            timestamp,
        });
    }

    #[inline]
    pub fn last(&self, variable: Variable) -> Option<&CrossingRecord> {
        self.last[variable.index()].as_ref()
    }

    pub fn clear(&mut self) {
        self.last = [None, None];
    }
}
