//! Data-driven game balance
//!
//! Every corruption threshold, rate and duration lives here as a named value.
//! Rates ending in `_per_sec` are multiplied by the tick duration; plain
//! probabilities apply once per tick.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::Rect;

/// Failure to load a tuning file
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("tuning file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning value: {0}")]
    Invalid(String),
}

/// Intensity model weights
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntensityTuning {
    /// Time term is `playtime / seconds_to_cap`, so with the default cap of
    /// 0.5 it saturates after 60 s
    pub seconds_to_cap: f32,
    /// Death term is `deaths / deaths_to_cap`; saturates at 2.5 deaths
    /// by default, reaching the cap on the third
    pub deaths_to_cap: f32,
    /// Maximum contribution of each term
    pub term_cap: f32,
}

impl Default for IntensityTuning {
    fn default() -> Self {
        Self {
            seconds_to_cap: 120.0,
            deaths_to_cap: 5.0,
            term_cap: 0.5,
        }
    }
}

/// Player kinematics. Velocities are in pixels per tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsTuning {
    pub player_size: Vec2,
    pub spawn: Vec2,
    /// Horizontal acceleration while a direction is held (per second)
    pub run_accel: f32,
    /// Added to vertical velocity every tick
    pub gravity: f32,
    /// Vertical velocity set by a jump (negative is up)
    pub jump_velocity: f32,
    /// Horizontal velocity multiplier applied every tick, must be < 1
    pub friction: f32,
    /// |vx| below this snaps to zero
    pub rest_threshold: f32,
    /// Player color flicker starts above this intensity
    pub flicker_onset: f32,
    pub flicker_chance: f32,
    /// Random impulses start above this intensity
    pub impulse_onset: f32,
    pub impulse_chance: f32,
    pub impulse_scale: f32,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            player_size: Vec2::new(30.0, 50.0),
            spawn: Vec2::new(50.0, 300.0),
            run_accel: 300.0,
            gravity: 0.5,
            jump_velocity: -10.0,
            friction: 0.8,
            rest_threshold: 1e-3,
            flicker_onset: 0.3,
            flicker_chance: 0.01,
            impulse_onset: 0.6,
            impulse_chance: 0.005,
            impulse_scale: 10.0,
        }
    }
}

/// Visual glitch scheduling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlitchTuning {
    /// Working values are zero below this intensity
    pub onset: f32,
    pub shake_scale: f32,
    pub shake_chance: f32,
    pub color_shift_scale: f32,
    pub static_scale: f32,
    /// Streak count is `intensity * static_streaks_per_unit`, capped
    pub static_streaks_per_unit: f32,
    pub static_streak_cap: usize,
    pub color_split_rate_per_sec: f32,
    pub scanline_onset: f32,
    pub scanline_rate_per_sec: f32,
    /// Duration range of minor effects (seconds)
    pub minor_duration: (f32, f32),
    pub major_onset: f32,
    pub major_rate_per_sec: f32,
    /// Shared cooldown between major effects (seconds)
    pub major_cooldown: f32,
    pub tear_duration: (f32, f32),
    pub multi_tear_onset: f32,
    pub invert_duration: (f32, f32),
    pub pixelate_duration: (f32, f32),
    pub fake_crash_onset: f32,
    /// How long the simulation stays halted (seconds)
    pub fake_crash_duration: f32,
    pub glitch_sound_chance: f32,
    pub player_artifact_onset: f32,
    pub player_artifact_chance: f32,
}

impl Default for GlitchTuning {
    fn default() -> Self {
        Self {
            onset: 0.05,
            shake_scale: 5.0,
            shake_chance: 0.1,
            color_shift_scale: 10.0,
            static_scale: 0.2,
            static_streaks_per_unit: 1000.0,
            static_streak_cap: 100,
            color_split_rate_per_sec: 3.0,
            scanline_onset: 0.4,
            scanline_rate_per_sec: 6.0,
            minor_duration: (0.05, 0.15),
            major_onset: 0.3,
            major_rate_per_sec: 1.0,
            major_cooldown: 10.0,
            tear_duration: (0.1, 0.3),
            multi_tear_onset: 0.7,
            invert_duration: (0.5, 1.5),
            pixelate_duration: (0.3, 1.0),
            fake_crash_onset: 0.6,
            fake_crash_duration: 3.0,
            glitch_sound_chance: 0.5,
            player_artifact_onset: 0.5,
            player_artifact_chance: 0.1,
        }
    }
}

/// Level drift and exit evasion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelTuning {
    pub background_onset: f32,
    pub background_chance: f32,
    pub background_flash_onset: f32,
    pub background_flash_chance: f32,
    /// Delay before the flash and how long it holds (seconds)
    pub background_flash_time: f32,
    pub drift_onset: f32,
    pub drift_chance: f32,
    /// Maximum nudge per axis at full intensity
    pub drift_scale: Vec2,
    pub recolor_chance: f32,
    pub vanish_onset: f32,
    pub vanish_rate_per_sec: f32,
    pub vanish_duration: (f32, f32),
    pub exit_onset: f32,
    /// Player closer than this makes the exit flee
    pub exit_near_radius: f32,
    /// Flee speed in pixels per tick at full intensity
    pub exit_flee_speed: f32,
    /// Fraction of the remaining offset recovered per tick while far
    pub exit_return_rate: f32,
    pub exit_flicker_chance: f32,
    pub exit_teleport_onset: f32,
    pub exit_teleport_chance: f32,
    pub exit_vanish_onset: f32,
    pub exit_vanish_chance: f32,
    pub exit_vanish_duration: (f32, f32),
    /// Allowed range for the exit's top-left corner
    pub exit_bounds: Rect,
}

impl Default for LevelTuning {
    fn default() -> Self {
        Self {
            background_onset: 0.3,
            background_chance: 0.05,
            background_flash_onset: 0.7,
            background_flash_chance: 0.1,
            background_flash_time: 0.05,
            drift_onset: 0.2,
            drift_chance: 0.01,
            drift_scale: Vec2::new(5.0, 3.0),
            recolor_chance: 0.1,
            vanish_onset: 0.6,
            vanish_rate_per_sec: 1.0,
            vanish_duration: (0.3, 1.0),
            exit_onset: 0.4,
            exit_near_radius: 150.0,
            exit_flee_speed: 0.5,
            exit_return_rate: 0.01,
            exit_flicker_chance: 0.1,
            exit_teleport_onset: 0.7,
            exit_teleport_chance: 0.01,
            exit_vanish_onset: 0.6,
            exit_vanish_chance: 0.001,
            exit_vanish_duration: (0.3, 0.8),
            exit_bounds: Rect::new(50.0, 50.0, 700.0, 450.0),
        }
    }
}

/// Message selection and display
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeTuning {
    /// How long a message holds the display (seconds)
    pub display_time: f32,
    /// A death message is queued on every Nth death
    pub death_message_cadence: u32,
    pub ambient_onset: f32,
    pub ambient_rate_per_sec: f32,
    pub jitter_onset: f32,
    pub jitter_scale: f32,
    pub mid_band_start: f32,
    pub high_band_start: f32,
    /// Delay of the welcome-back greeting after session start (seconds)
    pub welcome_delay: f32,
}

impl Default for NarrativeTuning {
    fn default() -> Self {
        Self {
            display_time: 5.0,
            death_message_cadence: 2,
            ambient_onset: 0.3,
            ambient_rate_per_sec: 0.1,
            jitter_onset: 0.4,
            jitter_scale: 10.0,
            mid_band_start: 0.3,
            high_band_start: 0.6,
            welcome_delay: 5.0,
        }
    }
}

/// Sound degradation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioTuning {
    /// Below this intensity sounds pass through untouched
    pub onset: f32,
    pub volume_jitter_chance: f32,
    pub volume_jitter_scale: f32,
    pub rate_onset: f32,
    pub rate_jitter_chance: f32,
    pub detune_onset: f32,
    pub detune_scale: f32,
}

impl Default for AudioTuning {
    fn default() -> Self {
        Self {
            onset: 0.2,
            volume_jitter_chance: 0.2,
            volume_jitter_scale: 0.5,
            rate_onset: 0.4,
            rate_jitter_chance: 0.3,
            detune_onset: 0.3,
            detune_scale: 0.5,
        }
    }
}

/// Complete tuning set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub intensity: IntensityTuning,
    pub physics: PhysicsTuning,
    pub glitch: GlitchTuning,
    pub level: LevelTuning,
    pub narrative: NarrativeTuning,
    pub audio: AudioTuning,
}

impl Tuning {
    /// Parse a (possibly partial) JSON tuning file; missing fields keep defaults
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values that would break simulation invariants
    pub fn validate(&self) -> Result<(), TuningError> {
        let p = &self.physics;
        if !(0.0..1.0).contains(&p.friction) {
            return Err(TuningError::Invalid(format!(
                "friction must be in [0, 1), got {}",
                p.friction
            )));
        }
        if p.player_size.x <= 0.0 || p.player_size.y <= 0.0 {
            return Err(TuningError::Invalid("player size must be positive".into()));
        }
        if self.intensity.seconds_to_cap <= 0.0 || self.intensity.deaths_to_cap <= 0.0 {
            return Err(TuningError::Invalid("intensity caps must be positive".into()));
        }
        if self.narrative.death_message_cadence == 0 {
            return Err(TuningError::Invalid("death message cadence must be >= 1".into()));
        }
        let l = &self.level;
        if !(0.0..=1.0).contains(&l.exit_return_rate) {
            return Err(TuningError::Invalid("exit return rate must be in [0, 1]".into()));
        }
        if l.exit_bounds.size.x < 0.0 || l.exit_bounds.size.y < 0.0 {
            return Err(TuningError::Invalid("exit bounds must not be negative".into()));
        }
        Ok(())
    }
}
