//! No End - a platformer that corrupts itself the longer you play
//!
//! Core modules:
//! - `sim`: Corruption simulation (intensity, physics, level, glitches, narration)
//! - `renderer`: Drawing interface, glitch effects and the Canvas 2D backend
//! - `audio`: Sound degradation and playback sinks
//! - `platform`: Keyboard input and page chrome
//! - `persistence`: Best-effort session record storage
//! - `tuning`: Data-driven game balance
//! - `game`: Session controller tying the above together

pub mod audio;
pub mod game;
pub mod persistence;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use game::Game;
pub use settings::Settings;
pub use tuning::Tuning;

use rand::Rng;

/// Game configuration constants
pub mod consts {
    use glam::Vec2;

    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest wall-clock frame fed to the accumulator (seconds)
    pub const MAX_FRAME_DT: f32 = 0.25;

    /// Canvas dimensions
    pub const ARENA_SIZE: Vec2 = Vec2::new(800.0, 600.0);
}

/// Bernoulli trial; `p` is clamped to [0, 1] and NaN never fires
#[inline]
pub fn chance<R: Rng + ?Sized>(rng: &mut R, p: f32) -> bool {
    if p.is_nan() || p <= 0.0 {
        return false;
    }
    rng.random::<f32>() < p.min(1.0)
}

/// Uniform offset in `[-magnitude/2, magnitude/2)`
#[inline]
pub fn jitter<R: Rng + ?Sized>(rng: &mut R, magnitude: f32) -> f32 {
    (rng.random::<f32>() - 0.5) * magnitude
}
