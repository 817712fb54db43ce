//! Mission progression
//!
//! Owns the current `GamePhase` and everything that gates its transitions:
//! the placement counter, beam waypoints, scripted cutscene timelines and
//! the ending. Scripted parts are tweens advanced by `advance`; a phase that
//! waits on a script only changes once the script has fully run.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use super::agents::{DualAgentTracker, Side};
use super::state::{GameEvent, GamePhase};
use super::tween::{Easing, Tween};
use crate::audio::{LayerLevels, blend_levels};
use crate::consts::*;
use crate::tuning::Tuning;

/// Which beam a waypoint is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Waypoint {
    /// Shown after the first trip; switches the detectors to the secondary wave
    Reconfigure,
    /// Shown after the second trip; flips between the last trip's halves
    Final,
}

/// A visible beam
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Beam {
    pub waypoint: Waypoint,
    /// Unit direction of the beam; its twin stands at the antipode
    pub position: DVec3,
    /// A used reusable beam stays disarmed until both agents walk away
    pub armed: bool,
}

/// HUD text shown for a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissionText {
    Blank,
    PressToStart,
    Intro,
    Mission1,
    Waiting2,
    Cutscene2,
    Mission2,
    Cutscene3,
    Mission3,
    Victory,
}

impl MissionText {
    pub fn for_phase(phase: GamePhase) -> Self {
        match phase {
            GamePhase::Loading => MissionText::Blank,
            GamePhase::PressToStart => MissionText::PressToStart,
            GamePhase::Cutscene1 => MissionText::Intro,
            GamePhase::FirstTrip => MissionText::Mission1,
            GamePhase::Waiting2 => MissionText::Waiting2,
            GamePhase::Cutscene2 => MissionText::Cutscene2,
            GamePhase::SecondTrip => MissionText::Mission2,
            GamePhase::Cutscene3 => MissionText::Cutscene3,
            GamePhase::ThirdTripA | GamePhase::ThirdTripChange | GamePhase::ThirdTripB => {
                MissionText::Mission3
            }
            GamePhase::Won => MissionText::Victory,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MissionText::Blank => "",
            MissionText::PressToStart => "Click to start!\nUse headphones",
            MissionText::Intro => {
                "\n\n\nPlanet: Unknown\n\nMission: Find antipodal\nresonating points\n\nEquipment: Two mobile\nG-Wave detectors"
            }
            MissionText::Mission1 => {
                "Mission 1/3:\nPress Space when the G-Waves\nare equal at both antipodes"
            }
            MissionText::Waiting2 => "Good job!\nVisit the Reconfiguring Beam\nto alter your detectors",
            MissionText::Cutscene2 => "\nSwitching to B-Waves...",
            MissionText::Mission2 => {
                "Mission 2/3:\nPress Space when the B-Waves\nare equal at both antipodes"
            }
            MissionText::Cutscene3 => {
                "Good job!\nProviding the last Reconfiguring Beam...\nUse it wisely, only once you're prepared."
            }
            MissionText::Mission3 => {
                "Mission 3/3:\nPress Enter when both\nG-Waves and B-Waves\nare equal at both antipodes.\n\n\n\n\n\n\n\n\n\n\nThis is the last Reconfiguring Beam.\nUse it wisely."
            }
            MissionText::Victory => "Congratulations!\nYou win!",
        }
    }
}

/// What the HUD should show this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hud {
    pub text: MissionText,
    /// (placed, target) while a counting trip is active
    pub progress: Option<(u8, u8)>,
}

impl Hud {
    pub fn render(&self) -> String {
        match self.progress {
            Some((placed, target)) => format!("{}\n({}/{})", self.text.as_str(), placed, target),
            None => self.text.as_str().to_string(),
        }
    }
}

/// Intro timeline: the left agent lands, then the right one, then the
/// camera swings around. All delays count from the start of the intro.
#[derive(Debug, Clone)]
struct IntroScript {
    landing_left: Tween,
    music_left: Tween,
    landing_right: Tween,
    music_right: Tween,
    swing: Tween,
}

impl IntroScript {
    fn new(tuning: &Tuning) -> Self {
        let s = |secs| tuning.script_secs(secs);
        let land = || Tween::new(START_ALTITUDE, SURFACE_ALTITUDE, s(1.0)).with_easing(Easing::OutQuad);
        Self {
            landing_left: land().with_delay(s(0.2)),
            music_left: Tween::new(0.0, 1.0, s(1.2)).with_delay(s(0.2) + s(1.0)),
            landing_right: land().with_delay(s(2.4)),
            music_right: Tween::new(0.0, 1.0, s(1.2)).with_delay(s(2.4) + s(1.0)),
            swing: Tween::new(0.0, 1.0, s(1.2))
                .with_delay(s(2.4) + s(1.0) + s(1.6))
                .with_easing(Easing::InOutSine),
        }
    }

    /// Returns true once every part has finished
    fn advance(&mut self, dt: f64) -> bool {
        [
            &mut self.landing_left,
            &mut self.music_left,
            &mut self.landing_right,
            &mut self.music_right,
            &mut self.swing,
        ]
        .into_iter()
        .fold(true, |done, tween| tween.advance(dt) && done)
    }

    fn music(&self, side: Side) -> f64 {
        match side {
            Side::Left => self.music_left.value(),
            Side::Right => self.music_right.value(),
        }
    }
}

#[derive(Debug, Clone)]
enum Script {
    Intro(IntroScript),
    /// Wave blend sweep; `then` is entered when it completes
    WaveSwitch { blend: Tween, then: GamePhase },
    /// Fixed pause; `then` is entered when it elapses
    Interlude { timer: Tween, then: GamePhase },
}

/// Win sequence
#[derive(Debug, Clone)]
struct Ending {
    zoom: Tween,
    fly: Tween,
    /// Layer levels at the winning moment
    levels: [LayerLevels; 2],
}

/// Mission state machine
#[derive(Debug, Clone)]
pub struct Mission {
    phase: GamePhase,
    progress: u8,
    script: Option<Script>,
    /// 0 = primary wave, 1 = secondary wave
    wave_blend: f64,
    beam: Option<Beam>,
    ending: Option<Ending>,
}

impl Default for Mission {
    fn default() -> Self {
        Self::new()
    }
}

impl Mission {
    pub fn new() -> Self {
        Self {
            phase: GamePhase::Loading,
            progress: 0,
            script: None,
            wave_blend: 0.0,
            beam: None,
            ending: None,
        }
    }

    /// Jump straight into a resting phase, with the beam and wave blend that
    /// phase would have. Used for debugging and tests.
    pub fn starting_at(phase: GamePhase, tuning: &Tuning) -> Self {
        let mut mission = Self::new();
        mission.phase = phase;
        mission.wave_blend = match phase {
            GamePhase::SecondTrip | GamePhase::Cutscene3 | GamePhase::ThirdTripA => 1.0,
            _ => 0.0,
        };
        mission.beam = match phase {
            GamePhase::Waiting2 => Some(Beam {
                waypoint: Waypoint::Reconfigure,
                position: tuning.beam_1_pos(),
                armed: true,
            }),
            GamePhase::ThirdTripA | GamePhase::ThirdTripB => Some(Beam {
                waypoint: Waypoint::Final,
                position: tuning.beam_2_pos(),
                armed: true,
            }),
            _ => None,
        };
        mission
    }

    #[inline]
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    #[inline]
    pub fn progress(&self) -> u8 {
        self.progress
    }

    #[inline]
    pub fn beam(&self) -> Option<&Beam> {
        self.beam.as_ref()
    }

    /// Current wave blend (0 = primary, 1 = secondary)
    #[inline]
    pub fn wave_blend(&self) -> f64 {
        self.wave_blend
    }

    /// Whether a scripted timeline is running
    pub fn is_scripted(&self) -> bool {
        self.script.is_some()
    }

    fn set_phase(&mut self, to: GamePhase, events: &mut Vec<GameEvent>) {
        let from = self.phase;
        if from == to {
            return;
        }
        log::info!("Phase {} -> {}", from.as_str(), to.as_str());
        self.phase = to;
        if to.counts_placements() {
            self.progress = 0;
        }
        events.push(GameEvent::PhaseChanged { from, to });
    }

    fn show_beam(&mut self, waypoint: Waypoint, position: DVec3, events: &mut Vec<GameEvent>) {
        self.beam = Some(Beam {
            waypoint,
            position,
            armed: true,
        });
        events.push(GameEvent::BeamShown { waypoint, position });
    }

    fn hide_beam(&mut self, events: &mut Vec<GameEvent>) {
        if let Some(beam) = self.beam.take() {
            events.push(GameEvent::BeamHidden {
                waypoint: beam.waypoint,
            });
        }
    }

    /// Assets are in; wait for the player
    pub fn finish_loading(&mut self, events: &mut Vec<GameEvent>) {
        if self.phase == GamePhase::Loading {
            self.set_phase(GamePhase::PressToStart, events);
        }
    }

    /// First pointer press: start audio and the intro. Returns false outside
    /// PRESS_TO_START.
    pub fn start(&mut self, tuning: &Tuning, events: &mut Vec<GameEvent>) -> bool {
        if self.phase != GamePhase::PressToStart {
            return false;
        }
        events.push(GameEvent::AudioStarted);
        self.script = Some(Script::Intro(IntroScript::new(tuning)));
        self.set_phase(GamePhase::Cutscene1, events);
        true
    }

    /// Advance scripted timelines by `dt` seconds
    pub fn advance(&mut self, dt: f64, tuning: &Tuning, events: &mut Vec<GameEvent>) {
        if let Some(ending) = &mut self.ending {
            ending.zoom.advance(dt);
            ending.fly.advance(dt);
        }

        let Some(script) = &mut self.script else {
            return;
        };
        let next = match script {
            Script::Intro(intro) => intro.advance(dt).then_some(GamePhase::FirstTrip),
            Script::WaveSwitch { blend, then } => {
                let done = blend.advance(dt);
                self.wave_blend = blend.value();
                done.then_some(*then)
            }
            Script::Interlude { timer, then } => timer.advance(dt).then_some(*then),
        };

        if let Some(next) = next {
            self.script = None;
            self.set_phase(next, events);
            if next == GamePhase::ThirdTripA && self.beam.is_none() {
                self.show_beam(Waypoint::Final, tuning.beam_2_pos(), events);
            }
        }
    }

    /// Count a placement outcome. Only counting trips advance; a wrong
    /// placement never moves the mission backwards.
    pub fn record_placement(&mut self, correct: bool, tuning: &Tuning, events: &mut Vec<GameEvent>) {
        if !correct || !self.phase.counts_placements() {
            return;
        }
        let target = tuning.placements_per_trip;
        self.progress = (self.progress + 1).min(target);
        events.push(GameEvent::ProgressChanged {
            count: self.progress,
            target,
        });
        if self.progress < target {
            return;
        }

        self.progress = 0;
        match self.phase {
            GamePhase::FirstTrip => {
                self.set_phase(GamePhase::Waiting2, events);
                self.show_beam(Waypoint::Reconfigure, tuning.beam_1_pos(), events);
            }
            GamePhase::SecondTrip if tuning.third_trip_cutscene => {
                self.set_phase(GamePhase::Cutscene3, events);
                let pause = tuning.script_secs(0.4) + tuning.script_secs(0.8);
                self.script = Some(Script::Interlude {
                    timer: Tween::new(0.0, 1.0, pause),
                    then: GamePhase::ThirdTripA,
                });
            }
            GamePhase::SecondTrip => {
                self.set_phase(GamePhase::ThirdTripA, events);
                self.show_beam(Waypoint::Final, tuning.beam_2_pos(), events);
            }
            _ => {}
        }
    }

    /// Proximity test against the visible beam
    pub fn check_beams(
        &mut self,
        agents: &DualAgentTracker,
        tuning: &Tuning,
        events: &mut Vec<GameEvent>,
    ) {
        let Some(beam) = self.beam.as_mut() else {
            return;
        };
        let inside = agents.min_distance_to(beam.position) < tuning.beam_radius;
        if !beam.armed {
            // Stays disarmed through the change so arrival can't flip straight back
            if !inside && self.phase != GamePhase::ThirdTripChange {
                beam.armed = true;
            }
            return;
        }
        if !inside {
            return;
        }

        match (self.phase, beam.waypoint) {
            (GamePhase::Waiting2, Waypoint::Reconfigure) => {
                self.hide_beam(events);
                self.set_phase(GamePhase::Cutscene2, events);
                self.script = Some(Script::WaveSwitch {
                    blend: Tween::new(self.wave_blend, 1.0, tuning.script_secs(1.2))
                        .with_delay(tuning.script_secs(0.8)),
                    then: GamePhase::SecondTrip,
                });
            }
            (GamePhase::ThirdTripA | GamePhase::ThirdTripB, Waypoint::Final) => {
                let (target, then) = if self.phase == GamePhase::ThirdTripA {
                    (0.0, GamePhase::ThirdTripB)
                } else {
                    (1.0, GamePhase::ThirdTripA)
                };
                if tuning.reusable_final_beam {
                    beam.armed = false;
                } else {
                    self.hide_beam(events);
                }
                self.set_phase(GamePhase::ThirdTripChange, events);
                self.script = Some(Script::WaveSwitch {
                    blend: Tween::new(self.wave_blend, target, tuning.script_secs(1.1)),
                    then,
                });
            }
            _ => {}
        }
    }

    /// Enter the win sequence, holding the layer levels heard at this moment
    pub fn win(&mut self, levels: [LayerLevels; 2], tuning: &Tuning, events: &mut Vec<GameEvent>) {
        if self.phase == GamePhase::Won {
            return;
        }
        self.script = None;
        self.hide_beam(events);
        self.ending = Some(Ending {
            zoom: Tween::new(1.0, 0.3, tuning.script_secs(1.0))
                .with_delay(tuning.script_secs(0.2))
                .with_easing(Easing::InQuad),
            fly: Tween::new(SURFACE_ALTITUDE, ESCAPE_ALTITUDE, tuning.script_secs(5.0))
                .with_delay(tuning.script_secs(0.7))
                .with_easing(Easing::InQuad),
            levels,
        });
        self.set_phase(GamePhase::Won, events);
        events.push(GameEvent::Victory);
    }

    /// Whether the win sequence has played out
    pub fn ending_finished(&self) -> bool {
        self.ending
            .as_ref()
            .is_some_and(|e| e.zoom.is_finished() && e.fly.is_finished())
    }

    /// How loud each layer should be in `side`'s ear
    pub fn layer_levels(&self, side: Side) -> LayerLevels {
        match self.phase {
            GamePhase::Loading | GamePhase::PressToStart => LayerLevels::SILENT,
            GamePhase::Cutscene1 => match &self.script {
                Some(Script::Intro(intro)) => LayerLevels::PRIMARY.scaled(intro.music(side)),
                _ => LayerLevels::PRIMARY,
            },
            GamePhase::Won => match &self.ending {
                Some(ending) => ending.levels[side.index()].scaled(1.0 - ending.fly.progress()),
                None => LayerLevels::SILENT,
            },
            _ => blend_levels(self.wave_blend),
        }
    }

    /// Distance of each agent from the planet centre
    pub fn altitudes(&self) -> (f64, f64) {
        match self.phase {
            GamePhase::Loading | GamePhase::PressToStart => (START_ALTITUDE, START_ALTITUDE),
            GamePhase::Cutscene1 => match &self.script {
                Some(Script::Intro(intro)) => {
                    (intro.landing_left.value(), intro.landing_right.value())
                }
                _ => (SURFACE_ALTITUDE, SURFACE_ALTITUDE),
            },
            GamePhase::Won => match &self.ending {
                Some(ending) => (ending.fly.value(), ending.fly.value()),
                None => (SURFACE_ALTITUDE, SURFACE_ALTITUDE),
            },
            _ => (SURFACE_ALTITUDE, SURFACE_ALTITUDE),
        }
    }

    /// Intro camera swing progress (0 before, 1 after)
    pub fn camera_swing(&self) -> f64 {
        match (&self.script, self.phase) {
            (Some(Script::Intro(intro)), _) => intro.swing.eased(),
            (_, GamePhase::Loading | GamePhase::PressToStart) => 0.0,
            _ => 1.0,
        }
    }

    /// Camera zoom factor (1 during play, shrinks during the ending)
    pub fn camera_zoom(&self) -> f64 {
        self.ending.as_ref().map_or(1.0, |e| e.zoom.value())
    }

    pub fn hud(&self, tuning: &Tuning) -> Hud {
        Hud {
            text: MissionText::for_phase(self.phase),
            progress: self
                .phase
                .counts_placements()
                .then_some((self.progress, tuning.placements_per_trip)),
        }
    }
}
