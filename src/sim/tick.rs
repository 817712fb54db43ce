//! Per-frame simulation tick
//!
//! Runs every component in a fixed order: input, agents, scripted
//! timelines, sampling, crossing detection, evaluation, beams, audio mix.

use super::agents::Side;
use super::evaluate::{Check, evaluate, marker_color, place_markers};
use super::field::{Readings, Variable};
use super::state::{GameEvent, GamePhase, GameState, SHAKE_SECS};
use crate::audio::compute_mix;
use crate::consts::*;

/// Input intents for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Travel across the surface (-1 left .. 1 right)
    pub move_x: f64,
    /// Travel across the surface (-1 down .. 1 up)
    pub move_y: f64,
    /// Spin about the view axis (-1 clockwise .. 1 counter-clockwise)
    pub rotate: f64,
    /// Slow everything down for fine positioning
    pub precision: bool,
    /// Place a marker pair (one-shot)
    pub action: bool,
    /// Final combined check (one-shot)
    pub final_action: bool,
    /// Pointer pressed this frame (starts the game)
    pub pointer_pressed: bool,
    /// Debug: place automatically whenever a crossing is recorded
    pub autoplace: bool,
}

/// Turns absolute frame timestamps into clamped deltas
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last_time_ms: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the previous frame. The first frame gets a default step.
    pub fn delta(&mut self, now_ms: f64) -> f64 {
        let dt = match self.last_time_ms {
            Some(last) => (now_ms - last) * 0.001,
            None => DEFAULT_FRAME_DT,
        };
        if now_ms.is_finite() {
            self.last_time_ms = Some(now_ms);
        }
        sanitize_dt(dt)
    }
}

/// Clamp a frame step to [0, MAX_FRAME_DT]; garbage becomes 0
#[inline]
pub fn sanitize_dt(dt: f64) -> f64 {
    if dt.is_finite() {
        dt.clamp(0.0, MAX_FRAME_DT)
    } else {
        0.0
    }
}

/// Advance the game by one frame
pub fn tick(state: &mut GameState, input: &TickInput, dt: f64) {
    let dt = sanitize_dt(dt);
    state.time += dt;
    state.time_ticks += 1;
    let phase_at_start = state.phase();

    if input.pointer_pressed {
        state.mission.start(&state.tuning, &mut state.events);
    }

    if state.phase().allows_steering() {
        state.agents.steer(
            input.move_x,
            input.move_y,
            input.rotate,
            input.precision,
            dt,
        );
    }

    state.mission.advance(dt, &state.tuning, &mut state.events);
    clear_crossings_on_trip_entry(state, phase_at_start);

    let (left_alt, right_alt) = state.mission.altitudes();
    state.agents.set_altitudes(left_alt, right_alt);

    state.readings = Readings::new(
        state.field.sample(state.agents.left().position),
        state.field.sample(state.agents.right().position),
    );

    // Detector always runs; only the phase's variable is recorded
    let phase = state.phase();
    let site = state.agents.left().position;
    let mut place = input.action;
    for event in state.crossings.observe(&state.readings, site).into_iter().flatten() {
        if phase.crossing_variable() != Some(event.variable) {
            continue;
        }
        log::debug!("Crossed {:?} at {:?}", event.variable, event.position);
        state.crossing_log.record(event, state.time);
        state.events.push(GameEvent::Crossing {
            variable: event.variable,
            position: event.position,
        });
        place |= input.autoplace;
    }

    if input.final_action && phase.accepts_final_action() {
        final_check(state);
    }

    if place {
        if let Some(variable) = state.phase().placement_variable() {
            place_marker(state, variable);
        }
    }

    state
        .mission
        .check_beams(&state.agents, &state.tuning, &mut state.events);
    clear_crossings_on_trip_entry(state, phase);

    let levels = Side::BOTH.map(|side| state.mission.layer_levels(side));
    state.audio = compute_mix(&state.settings, &state.loop_bank, &state.readings, levels);
}

fn clear_crossings_on_trip_entry(state: &mut GameState, before: GamePhase) {
    let now = state.phase();
    if now != before && now.is_trip() {
        state.crossing_log.clear();
    }
}

fn place_marker(state: &mut GameState, variable: Variable) {
    let tolerance = state.tuning.placement_tolerance;
    let result = evaluate(&state.readings, Check::Single(variable), tolerance);
    let secondary = evaluate(&state.readings, Check::Single(Variable::Secondary), tolerance);
    let color = marker_color(result.correct, secondary.correct);
    let markers = place_markers(
        result.correct,
        color,
        state.crossing_log.last(variable),
        &state.agents,
        state.tuning.min_crossing_distance_sq,
    );
    log::info!(
        "Placed {:?} marker ({:?}, distance {:.4}) in {}",
        color,
        markers[0].site,
        result.distance,
        state.phase().as_str()
    );

    for marker in markers {
        if marker.persistent {
            state.markers.push(marker);
        }
        state.events.push(GameEvent::MarkerPlaced(marker));
    }
    state
        .mission
        .record_placement(result.correct, &state.tuning, &mut state.events);
}

fn final_check(state: &mut GameState) {
    let result = evaluate(&state.readings, Check::Combined, state.tuning.final_tolerance);
    if result.correct {
        let levels = Side::BOTH.map(|side| state.mission.layer_levels(side));
        state.mission.win(levels, &state.tuning, &mut state.events);
    } else {
        log::info!("Final check failed (distance {:.4})", result.distance);
        let frames = state.shake_frames();
        state.events.push(GameEvent::ScreenShake {
            frames,
            duration: SHAKE_SECS,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{LayerMix, LoopBank};
    use crate::settings::Settings;
    use crate::sim::evaluate::{Marker, MarkerSite};
    use crate::sim::field::FieldTable;
    use crate::sim::mission::Mission;
    use crate::tuning::Tuning;

    const DT: f64 = DEFAULT_FRAME_DT;

    /// Primary reading is a cosine in table longitude, so antipodes on the
    /// equator cross at a quarter and three quarters of the way round.
    /// Secondary is flat.
    fn wave_table() -> FieldTable {
        let width = 1024;
        FieldTable::from_fn(width, 4, |x, _| {
            let phase = std::f64::consts::TAU * x as f64 / width as f64;
            [(128.0 + 127.0 * phase.cos()) as u8, 128]
        })
        .unwrap()
    }

    fn flat_table() -> FieldTable {
        FieldTable::from_fn(8, 8, |_, _| [100, 200]).unwrap()
    }

    fn loaded(tuning: Tuning, table: FieldTable) -> GameState {
        let mut state = GameState::new(tuning, Settings::default(), 7);
        state.finish_loading(Some(table), LoopBank::with_defaults());
        state.drain_events();
        state
    }

    fn fast() -> Tuning {
        Tuning {
            fast_cutscenes: true,
            ..Tuning::default()
        }
    }

    fn run_until(state: &mut GameState, phase: GamePhase, max_ticks: usize) -> Vec<GameEvent> {
        let mut events = Vec::new();
        for _ in 0..max_ticks {
            if state.phase() == phase {
                break;
            }
            tick(state, &TickInput::default(), DT);
            events.extend(state.drain_events());
        }
        events
    }

    fn placed(events: &[GameEvent]) -> Vec<Marker> {
        events
            .iter()
            .filter_map(|e| match e {
                GameEvent::MarkerPlaced(m) => Some(*m),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_frame_clock() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.delta(1000.0), DEFAULT_FRAME_DT);
        assert!((clock.delta(1016.0) - 0.016).abs() < 1e-12);
        // Tab was in the background
        assert_eq!(clock.delta(9000.0), MAX_FRAME_DT);
        assert_eq!(clock.delta(8000.0), 0.0);
        assert_eq!(clock.delta(f64::NAN), 0.0);
        assert!((clock.delta(8010.0) - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_sanitize_dt() {
        assert_eq!(sanitize_dt(-1.0), 0.0);
        assert_eq!(sanitize_dt(f64::INFINITY), 0.0);
        assert_eq!(sanitize_dt(0.05), 0.05);
    }

    #[test]
    fn test_nothing_moves_before_start() {
        let mut state = loaded(fast(), flat_table());
        let input = TickInput {
            move_x: 1.0,
            action: true,
            ..Default::default()
        };
        tick(&mut state, &input, DT);
        assert_eq!(state.phase(), GamePhase::PressToStart);
        assert!((state.agents.left().position.z - START_ALTITUDE).abs() < 1e-12);
        assert!(placed(&state.drain_events()).is_empty());
        assert_eq!(state.audio.left.primary, LayerMix::Silent);
    }

    #[test]
    fn test_neutral_readings_without_table() {
        let mut state = GameState::new(fast(), Settings::default(), 1);
        state.finish_loading(None, LoopBank::with_defaults());
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.readings, Readings::default());
        assert_eq!(state.phase(), GamePhase::PressToStart);
    }

    #[test]
    fn test_crossing_autoplace_marks_crossing_site() {
        let mut state = loaded(Tuning::default(), wave_table());
        state.mission = Mission::starting_at(GamePhase::FirstTrip, &state.tuning);
        let input = TickInput {
            move_x: 1.0,
            autoplace: true,
            ..Default::default()
        };

        let mut events = Vec::new();
        for _ in 0..600 {
            tick(&mut state, &input, DT);
            events.extend(state.drain_events());
            if !placed(&events).is_empty() {
                break;
            }
        }

        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::Crossing {
                variable: Variable::Primary,
                ..
            }
        )));
        let markers = placed(&events);
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].site, MarkerSite::Crossing);
        assert!(markers.iter().all(|m| m.persistent));
        assert!((markers[0].position + markers[1].position).length() < 1e-9);
        assert_eq!(state.mission.progress(), 1);
        assert_eq!(state.markers.len(), 2);
    }

    #[test]
    fn test_crossings_ignored_outside_trips() {
        let mut state = loaded(Tuning::default(), wave_table());
        state.mission = Mission::starting_at(GamePhase::Waiting2, &state.tuning);
        // Walk along the equator, away from beam 1
        let input = TickInput {
            move_x: -1.0,
            autoplace: true,
            ..Default::default()
        };
        let mut events = Vec::new();
        for _ in 0..600 {
            tick(&mut state, &input, DT);
            events.extend(state.drain_events());
        }
        assert!(!events.iter().any(|e| matches!(e, GameEvent::Crossing { .. })));
        assert!(state.crossing_log.last(Variable::Primary).is_none());
        assert!(placed(&events).is_empty());
    }

    #[test]
    fn test_wrong_placement_marks_live_position() {
        let mut state = loaded(Tuning::default(), wave_table());
        state.mission = Mission::starting_at(GamePhase::FirstTrip, &state.tuning);
        tick(&mut state, &TickInput::default(), DT);
        // Left starts where the cosine is near its peak; right near its trough
        tick(
            &mut state,
            &TickInput {
                action: true,
                ..Default::default()
            },
            DT,
        );

        let markers = placed(&state.drain_events());
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].site, MarkerSite::Live);
        assert!(!markers[0].persistent);
        assert!((markers[0].position - state.agents.left().position).length() < 1e-12);
        assert_eq!(state.mission.progress(), 0);
        assert!(state.markers.is_empty());
    }

    #[test]
    fn test_no_placements_in_third_trip_b() {
        let mut state = loaded(Tuning::default(), wave_table());
        state.mission = Mission::starting_at(GamePhase::ThirdTripB, &state.tuning);
        let input = TickInput {
            action: true,
            ..Default::default()
        };
        tick(&mut state, &input, DT);
        tick(&mut state, &input, DT);
        assert!(placed(&state.drain_events()).is_empty());

        state.mission = Mission::starting_at(GamePhase::ThirdTripA, &state.tuning);
        tick(&mut state, &input, DT);
        assert_eq!(placed(&state.drain_events()).len(), 2);
    }

    #[test]
    fn test_failed_final_check_shakes() {
        let mut state = loaded(Tuning::default(), wave_table());
        state.mission = Mission::starting_at(GamePhase::ThirdTripA, &state.tuning);
        let input = TickInput {
            final_action: true,
            ..Default::default()
        };
        tick(&mut state, &input, DT);
        let events = state.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::ScreenShake { frames, .. } if frames.len() == 5
        )));
        assert_eq!(state.phase(), GamePhase::ThirdTripA);
    }

    #[test]
    fn test_final_action_ignored_outside_third_trip() {
        let mut state = loaded(Tuning::default(), flat_table());
        state.mission = Mission::starting_at(GamePhase::SecondTrip, &state.tuning);
        let input = TickInput {
            final_action: true,
            ..Default::default()
        };
        tick(&mut state, &input, DT);
        assert_eq!(state.phase(), GamePhase::SecondTrip);
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn test_full_playthrough() {
        let mut state = loaded(fast(), flat_table());
        let action = TickInput {
            action: true,
            ..Default::default()
        };

        tick(
            &mut state,
            &TickInput {
                pointer_pressed: true,
                ..Default::default()
            },
            DT,
        );
        assert_eq!(state.phase(), GamePhase::Cutscene1);
        assert!(state.events().contains(&GameEvent::AudioStarted));
        run_until(&mut state, GamePhase::FirstTrip, 100);
        assert_eq!(state.phase(), GamePhase::FirstTrip);
        assert!(matches!(state.audio.left.primary, LayerMix::Loops { .. }));

        // Flat field: every placement is correct, no crossing on record
        for _ in 0..3 {
            tick(&mut state, &action, DT);
        }
        assert_eq!(state.phase(), GamePhase::Waiting2);
        let markers = placed(&state.drain_events());
        assert_eq!(markers.len(), 6);
        assert!(markers.iter().all(|m| m.site == MarkerSite::Live && m.persistent));

        state.agents.face(state.tuning.beam_1_pos());
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.phase(), GamePhase::Cutscene2);
        run_until(&mut state, GamePhase::SecondTrip, 100);
        assert_eq!(state.phase(), GamePhase::SecondTrip);
        assert!(matches!(state.audio.right.secondary, LayerMix::Loops { .. }));
        assert_eq!(state.audio.right.primary, LayerMix::Silent);

        for _ in 0..3 {
            tick(&mut state, &action, DT);
        }
        assert_eq!(state.phase(), GamePhase::ThirdTripA);

        tick(
            &mut state,
            &TickInput {
                final_action: true,
                ..Default::default()
            },
            DT,
        );
        assert_eq!(state.phase(), GamePhase::Won);
        assert!(state.drain_events().contains(&GameEvent::Victory));

        // Input is ignored from here on
        let rig = state.agents.rig();
        tick(
            &mut state,
            &TickInput {
                move_x: 1.0,
                action: true,
                ..Default::default()
            },
            DT,
        );
        assert_eq!(state.agents.rig(), rig);
        assert!(placed(&state.drain_events()).is_empty());

        for _ in 0..10 {
            tick(&mut state, &TickInput::default(), DT);
        }
        assert!(state.mission.ending_finished());
        assert!((state.agents.left().position.length() - ESCAPE_ALTITUDE).abs() < 1e-9);
        assert_eq!(state.audio.left.secondary, LayerMix::Silent);
    }

    #[test]
    fn test_determinism() {
        let run = || {
            let mut state = loaded(Tuning::default(), wave_table());
            state.mission = Mission::starting_at(GamePhase::ThirdTripB, &state.tuning);
            let inputs = [
                TickInput {
                    move_x: 0.7,
                    rotate: -0.3,
                    ..Default::default()
                },
                TickInput {
                    move_y: 1.0,
                    precision: true,
                    final_action: true,
                    ..Default::default()
                },
                TickInput {
                    action: true,
                    ..Default::default()
                },
            ];
            let mut events = Vec::new();
            for i in 0..120 {
                tick(&mut state, &inputs[i % inputs.len()], DT);
                events.extend(state.drain_events());
            }
            (state.agents.left().position, state.readings, events)
        };
        assert_eq!(run(), run());
    }
}
