//! Fixed timestep simulation tick
//!
//! One call advances every component by `dt` in a fixed order and returns
//! what happened, for audio and page chrome to act on.

use super::collision::{player_exit_overlap, resolve_player_collisions};
use super::glitch::MajorGlitch;
use super::narrative::StoryEvent;
use super::player::BoundsOutcome;
use super::state::{GameEvent, GameState};
use crate::tuning::Tuning;

/// Control state sampled for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    pub left: bool,
    pub right: bool,
    /// Held state; the jump itself fires on the rising edge
    pub jump: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, tuning: &Tuning, dt: f32) -> Vec<GameEvent> {
    let mut events = Vec::new();

    state.session.counters.playtime_secs += dt;
    state.session.clock += dt;
    state.refresh_intensity(tuning);

    // Player
    let intensity = state.session.intensity;
    let player = &mut state.player;
    player.apply_corruption(intensity, &tuning.physics, &mut state.rng);
    if player.apply_input(input, dt, &tuning.physics) {
        events.push(GameEvent::Jumped);
    }
    player.integrate(&tuning.physics);

    if player.check_bounds(state.level.arena()) == BoundsOutcome::Fell {
        handle_death(state, tuning, &mut events);
    }

    // Level corruption sees the pose before collision
    let session = state.session;
    let player_rect = state.player.rect();
    state
        .level
        .update(&session, &player_rect, dt, &tuning.level, &mut state.rng, &mut events);

    resolve_player_collisions(&mut state.player, &state.level.platforms);

    let touching = player_exit_overlap(&state.player, &state.level.exit.rect);
    if touching && !state.exit_contact {
        state.session.counters.exits_reached += 1;
        state.narrative.trigger(
            StoryEvent::ExitReached,
            &state.session.counters,
            &tuning.narrative,
            &mut state.rng,
        );
        events.push(GameEvent::ExitReached);
        log::info!("Exit reached ({} total)", state.session.counters.exits_reached);
    }
    state.exit_contact = touching;

    // Glitches and narration
    let session = state.session;
    let major = state
        .glitch
        .update(&session, dt, &tuning.glitch, &mut state.rng, &mut events);
    if major == Some(MajorGlitch::Message) {
        state
            .narrative
            .queue_for_band(session.intensity, &tuning.narrative, &mut state.rng);
    }

    state
        .narrative
        .update(&session, dt, &tuning.narrative, &mut state.rng, &mut events);

    events
}

/// Fell out of the world: count it, respawn, and put the level back
fn handle_death(state: &mut GameState, tuning: &Tuning, events: &mut Vec<GameEvent>) {
    state.session.counters.deaths += 1;
    let deaths = state.session.counters.deaths;
    state.refresh_intensity(tuning);

    state.narrative.trigger(
        StoryEvent::Death,
        &state.session.counters,
        &tuning.narrative,
        &mut state.rng,
    );
    events.push(GameEvent::PlayerDied { deaths });

    state.player.reset();
    state.level.reset();
    state.exit_contact = false;

    log::info!(
        "Player died ({} deaths, intensity {:.2})",
        deaths,
        state.session.intensity
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use glam::Vec2;

    fn run_until(
        state: &mut GameState,
        input: TickInput,
        tuning: &Tuning,
        max_ticks: usize,
        done: impl Fn(&GameState) -> bool,
    ) -> bool {
        for _ in 0..max_ticks {
            tick(state, &input, tuning, SIM_DT);
            if done(state) {
                return true;
            }
        }
        false
    }

    #[test]
    fn test_jump_then_land() {
        let tuning = Tuning::default();
        let mut state = GameState::new(1, &tuning);

        // Drop from spawn onto the ground
        assert!(run_until(&mut state, TickInput::default(), &tuning, 120, |s| s.player.on_ground));
        assert_eq!(state.player.pos.y, 450.0);

        let events = tick(
            &mut state,
            &TickInput {
                jump: true,
                ..Default::default()
            },
            &tuning,
            SIM_DT,
        );
        assert!(events.contains(&GameEvent::Jumped));
        assert!(!state.player.on_ground);
        assert!(state.player.vel.y < 0.0);

        assert!(run_until(&mut state, TickInput::default(), &tuning, 120, |s| s.player.on_ground));
        assert_eq!(state.player.vel.y, 0.0);
        assert_eq!(state.player.pos.y, 450.0);
    }

    #[test]
    fn test_falling_out_kills_and_respawns() {
        let mut tuning = Tuning::default();
        tuning.narrative.ambient_rate_per_sec = 0.0;
        let mut state = GameState::new(2, &tuning);
        state.player.pos = Vec2::new(320.0, 650.0);

        let events = tick(&mut state, &TickInput::default(), &tuning, SIM_DT);

        assert!(events.contains(&GameEvent::PlayerDied { deaths: 1 }));
        assert_eq!(state.counters().deaths, 1);
        assert!((state.intensity() - (0.2 + SIM_DT / 120.0)).abs() < 1e-4);
        assert!(state.player.pos.y < 310.0);
        // First death is below the message cadence
        assert_eq!(state.narrative.pending() + state.narrative.is_locked() as usize, 0);

        state.player.pos = Vec2::new(320.0, 650.0);
        tick(&mut state, &TickInput::default(), &tuning, SIM_DT);
        assert_eq!(state.counters().deaths, 2);
        assert!(state.narrative.is_locked());
    }

    #[test]
    fn test_exit_fires_once_per_entry() {
        let tuning = Tuning::default();
        let mut state = GameState::new(3, &tuning);
        state.player.pos = Vec2::new(705.0, 190.0);

        let first = tick(&mut state, &TickInput::default(), &tuning, SIM_DT);
        let second = tick(&mut state, &TickInput::default(), &tuning, SIM_DT);

        assert!(first.contains(&GameEvent::ExitReached));
        assert!(!second.contains(&GameEvent::ExitReached));
        assert_eq!(state.counters().exits_reached, 1);
        assert!(state.narrative.is_locked());
    }

    #[test]
    fn test_counters_never_decrease() {
        let tuning = Tuning::default();
        let mut state = GameState::new(4, &tuning);
        let mut prev = *state.counters();
        for i in 0..(60 * 30) {
            let input = TickInput {
                right: i % 90 < 60,
                jump: i % 40 < 5,
                ..Default::default()
            };
            tick(&mut state, &input, &tuning, SIM_DT);
            let now = *state.counters();
            assert!(now.deaths >= prev.deaths);
            assert!(now.exits_reached >= prev.exits_reached);
            assert!(now.playtime_secs > prev.playtime_secs);
            assert!((0.0..=1.0).contains(&state.intensity()));
            prev = now;
        }
    }
}
