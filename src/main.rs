//! Antipodes native demo
//!
//! Runs a headless session on a procedural planet: an autopilot walks the
//! agents around, autoplace drops markers on crossings, and every phase
//! change is logged. `RUST_LOG=info cargo run -- [tuning.json] [settings.json]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use antipodes::audio::LoopBank;
    use antipodes::input::InputState;
    use antipodes::sim::{
        Check, FieldTable, FrameClock, GameEvent, GamePhase, GameState, Waypoint, evaluate, tick,
    };
    use antipodes::{Settings, Tuning};

    env_logger::init();
    log::info!("Antipodes (native demo) starting...");

    let mut args = std::env::args().skip(1);
    let tuning = args
        .next()
        .map(Tuning::load_or_default)
        .unwrap_or_default();
    let settings = args
        .next()
        .map(Settings::load_or_default)
        .unwrap_or_default();

    let seed = 0x5eed_u64;
    let table = match FieldTable::procedural(seed, 512, 256, tuning.longitude_offset) {
        Ok(table) => Some(table),
        Err(e) => {
            log::warn!("Procedural field failed: {e}");
            None
        }
    };

    let mut state = GameState::new(tuning, settings, seed);
    state.finish_loading(table, LoopBank::with_defaults());

    let mut input = InputState::new();
    input.autoplace = true;
    input.pointer_down();

    let mut clock = FrameClock::new();
    let frame_ms = 1000.0 / 60.0;
    let max_frames = 60 * 60 * 20;

    for frame in 0..max_frames {
        let now_ms = frame as f64 * frame_ms;
        let t = now_ms * 0.001;

        // Autopilot: sweep across the surface, weaving north and south
        let mut tick_input = input.snapshot();
        tick_input.move_x = 1.0;
        tick_input.move_y = (t * 0.23).sin();
        tick_input.rotate = (t * 0.11).sin() * 0.5;

        // Take the beam shortcut when one is waiting
        if let Some(beam) = state.mission.beam() {
            let use_beam = match (state.phase(), beam.waypoint) {
                (GamePhase::Waiting2, Waypoint::Reconfigure) => true,
                (GamePhase::ThirdTripA, Waypoint::Final) => beam.armed,
                _ => false,
            };
            if use_beam {
                let position = beam.position;
                state.agents.face(position);
            }
        }

        if state.phase().accepts_final_action()
            && evaluate(&state.readings, Check::Combined, state.tuning.final_tolerance).correct
        {
            tick_input.final_action = true;
        }

        let dt = clock.delta(now_ms);
        tick(&mut state, &tick_input, dt);

        for event in state.drain_events() {
            match event {
                GameEvent::PhaseChanged { to, .. } => {
                    log::info!("[{t:7.2}s] {}", state.hud().render().replace('\n', " "));
                    if to == GamePhase::Won {
                        log::info!("[{t:7.2}s] resonance found");
                    }
                }
                GameEvent::ProgressChanged { count, target } => {
                    log::info!("[{t:7.2}s] progress {count}/{target}");
                }
                GameEvent::ScreenShake { .. } => log::debug!("[{t:7.2}s] shake"),
                _ => {}
            }
        }

        if state.mission.ending_finished() {
            break;
        }
    }

    log::info!(
        "Finished in {} ({} markers standing, {:.1}s simulated)",
        state.phase().as_str(),
        state.markers.len(),
        state.time
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is embedded by a host page; there is no standalone entry
}
