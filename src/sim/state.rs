//! Session state and core simulation types
//!
//! Everything a tick reads or writes lives in `GameState`. Components never
//! reach for globals; they get a `SessionState` snapshot by reference.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::glitch::GlitchEffector;
use super::intensity::compute_intensity_with;
use super::level::Level;
use super::narrative::{Narrative, StoryEvent};
use super::player::Player;
use crate::consts::ARENA_SIZE;
use crate::tuning::Tuning;

/// Monotonic session counters, reset only by an explicit restart
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionCounters {
    pub deaths: u32,
    pub exits_reached: u32,
    /// Fake crashes survived
    pub restarts: u32,
    pub playtime_secs: f32,
}

/// Read-only view handed to every component update
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SessionState {
    pub counters: SessionCounters,
    /// Corruption intensity in [0, 1]
    pub intensity: f32,
    /// Simulation clock in seconds
    pub clock: f32,
}

/// Observable outcome of a tick, consumed by audio and page chrome
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Jumped,
    PlayerDied { deaths: u32 },
    ExitReached,
    /// The exit jumped somewhere else
    ExitTeleported,
    GlitchSound,
    /// Halt the loop and show the crash overlay
    FakeCrash,
    MessageShown { text: String, offset: Vec2 },
    MessageHidden,
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Session seed
    pub seed: u64,
    pub session: SessionState,
    pub player: Player,
    pub level: Level,
    pub glitch: GlitchEffector,
    pub narrative: Narrative,
    pub rng: Pcg32,
    /// Player was touching the exit last tick
    pub exit_contact: bool,
}

impl GameState {
    /// Fresh session with the given seed
    pub fn new(seed: u64, tuning: &Tuning) -> Self {
        Self {
            seed,
            session: SessionState::default(),
            player: Player::new(&tuning.physics),
            level: Level::new(ARENA_SIZE),
            glitch: GlitchEffector::new(ARENA_SIZE),
            narrative: Narrative::default(),
            rng: Pcg32::seed_from_u64(seed),
            exit_contact: false,
        }
    }

    /// Start with deaths carried over from a previous session
    pub fn with_deaths(seed: u64, tuning: &Tuning, deaths: u32) -> Self {
        let mut state = Self::new(seed, tuning);
        state.session.counters.deaths = deaths;
        state.refresh_intensity(tuning);
        state
    }

    pub fn counters(&self) -> &SessionCounters {
        &self.session.counters
    }

    pub fn intensity(&self) -> f32 {
        self.session.intensity
    }

    /// Recompute intensity from the counters
    pub fn refresh_intensity(&mut self, tuning: &Tuning) {
        let c = &self.session.counters;
        self.session.intensity =
            compute_intensity_with(&tuning.intensity, c.playtime_secs, c.deaths);
    }

    /// Count a survived fake crash and let the narrator react
    pub fn record_restart(&mut self, tuning: &Tuning) {
        self.session.counters.restarts += 1;
        self.narrative.trigger(
            StoryEvent::Restart,
            &self.session.counters,
            &tuning.narrative,
            &mut self.rng,
        );
        log::info!("Recovered from crash #{}", self.session.counters.restarts);
    }
}
