//! Level geometry and its corruption
//!
//! The level owns the background color, the platforms and the exit door.
//! Platforms are snapshotted at construction and restored on death. The exit
//! has its own dynamics: it flees a nearby player and drifts home otherwise.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::color::Color;
use super::rect::Rect;
use super::scheduler::Scheduler;
use super::state::{GameEvent, SessionState};
use crate::chance;
use crate::jitter;
use crate::tuning::LevelTuning;

/// Nominal platform color (`#555`)
pub const PLATFORM_COLOR: Color = Color::rgb8(0x55, 0x55, 0x55);
/// Nominal exit color (`#5d5`)
pub const EXIT_COLOR: Color = Color::rgb8(0x55, 0xdd, 0x55);
/// Alternate exit flicker color (`#d55`)
pub const EXIT_WARNING_COLOR: Color = Color::rgb8(0xdd, 0x55, 0x55);
/// Nominal background (`#111`)
pub const BACKGROUND_COLOR: Color = Color::rgb8(0x11, 0x11, 0x11);

/// A solid, static rectangle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub rect: Rect,
    pub color: Color,
}

impl Platform {
    pub fn new(rect: Rect, color: Color) -> Self {
        Self { rect, color }
    }
}

/// The exit door
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exit {
    pub rect: Rect,
    pub color: Color,
    origin: Vec2,
    nominal_color: Color,
}

impl Exit {
    pub fn new(rect: Rect, color: Color) -> Self {
        Self {
            rect,
            color,
            origin: rect.pos,
            nominal_color: color,
        }
    }

    /// Where the door was built; never changes
    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn nominal_color(&self) -> Color {
        self.nominal_color
    }
}

/// Deferred color restorations
#[derive(Debug, Clone)]
enum Revert {
    /// Platform reappears with the color it had before vanishing
    PlatformColor { index: usize, color: Color },
    ExitColor(Color),
    Background(Color),
}

/// The single screen of the game
#[derive(Debug, Clone)]
pub struct Level {
    pub platforms: Vec<Platform>,
    pub exit: Exit,
    pub background: Color,
    arena: Vec2,
    nominal_platforms: Vec<Platform>,
    reverts: Scheduler<Revert>,
    /// Background recoloring is suspended through this time (during a flash)
    background_hold_until: Option<f32>,
}

impl Level {
    /// The standard layout on an 800×600 arena
    pub fn new(arena: Vec2) -> Self {
        let platforms = [
            // Ground, with a gap
            Rect::new(0.0, 500.0, 300.0, 20.0),
            Rect::new(350.0, 500.0, 450.0, 20.0),
            // Staircase up to the exit
            Rect::new(150.0, 400.0, 100.0, 20.0),
            Rect::new(300.0, 350.0, 100.0, 20.0),
            Rect::new(500.0, 300.0, 100.0, 20.0),
            Rect::new(650.0, 250.0, 100.0, 20.0),
        ]
        .into_iter()
        .map(|rect| Platform::new(rect, PLATFORM_COLOR))
        .collect();

        Self::with_layout(
            arena,
            platforms,
            Exit::new(Rect::new(700.0, 180.0, 40.0, 70.0), EXIT_COLOR),
        )
    }

    /// Build from explicit geometry; the nominal snapshot is taken here
    pub fn with_layout(arena: Vec2, platforms: Vec<Platform>, exit: Exit) -> Self {
        Self {
            nominal_platforms: platforms.clone(),
            platforms,
            exit,
            background: BACKGROUND_COLOR,
            arena,
            reverts: Scheduler::new(),
            background_hold_until: None,
        }
    }

    pub fn arena(&self) -> Vec2 {
        self.arena
    }

    /// Platform geometry as built
    pub fn nominal_platforms(&self) -> &[Platform] {
        &self.nominal_platforms
    }

    /// One tick of corruption. `player` is the player's bounding box.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        session: &SessionState,
        player: &Rect,
        dt: f32,
        tuning: &LevelTuning,
        rng: &mut R,
        events: &mut Vec<GameEvent>,
    ) {
        let now = session.clock;
        let intensity = session.intensity;

        self.apply_due_reverts(now);

        // The flash's final dark frame stays up for the tick it lands on
        if self.background_hold_until.is_none_or(|until| now > until) {
            self.corrupt_background(intensity, now, tuning, rng);
        }

        if intensity > tuning.drift_onset {
            self.corrupt_platforms(intensity, now, dt, tuning, rng);
        }

        if intensity > tuning.exit_onset {
            self.evade(player, intensity, now, tuning, rng, events);
        }
    }

    fn apply_due_reverts(&mut self, now: f32) {
        for revert in self.reverts.drain_due(now) {
            match revert {
                Revert::PlatformColor { index, color } => {
                    // The platform may have been reset meanwhile; overwrite anyway
                    if let Some(platform) = self.platforms.get_mut(index) {
                        platform.color = color;
                    }
                }
                Revert::ExitColor(color) => self.exit.color = color,
                Revert::Background(color) => self.background = color,
            }
        }
    }

    fn corrupt_background<R: Rng + ?Sized>(
        &mut self,
        intensity: f32,
        now: f32,
        tuning: &LevelTuning,
        rng: &mut R,
    ) {
        if intensity > tuning.background_onset && chance(rng, intensity * tuning.background_chance)
        {
            let dark = Color::random_in(rng, [0, 0, 0], [50, 30, 50]);
            self.background = dark;

            if intensity > tuning.background_flash_onset
                && chance(rng, tuning.background_flash_chance)
            {
                let t = tuning.background_flash_time;
                self.reverts.schedule(now + t, Revert::Background(Color::WHITE));
                self.reverts.schedule(now + 2.0 * t, Revert::Background(dark));
                self.background_hold_until = Some(now + 2.0 * t);
            }
        } else {
            // Baseline tint creeps up with intensity
            let level = (17.0 + 30.0 * intensity).floor() / 255.0;
            self.background = Color::rgba(level, level / 2.0, level, 1.0);
        }
    }

    fn corrupt_platforms<R: Rng + ?Sized>(
        &mut self,
        intensity: f32,
        now: f32,
        dt: f32,
        tuning: &LevelTuning,
        rng: &mut R,
    ) {
        for (index, platform) in self.platforms.iter_mut().enumerate() {
            if chance(rng, intensity * tuning.drift_chance) {
                let scale = tuning.drift_scale * intensity;
                platform.rect.pos += Vec2::new(jitter(rng, scale.x), jitter(rng, scale.y));

                if chance(rng, intensity * tuning.recolor_chance) {
                    platform.color = Color::random_in(rng, [50, 50, 50], [100, 100, 100]);
                }
            }

            if intensity > tuning.vanish_onset
                && !platform.color.is_transparent()
                && chance(rng, intensity * tuning.vanish_rate_per_sec * dt)
            {
                let (lo, hi) = tuning.vanish_duration;
                let duration = rng.random_range(lo..=hi.max(lo));
                self.reverts.schedule(
                    now + duration,
                    Revert::PlatformColor {
                        index,
                        color: platform.color,
                    },
                );
                platform.color = Color::TRANSPARENT;
            }
        }
    }

    fn evade<R: Rng + ?Sized>(
        &mut self,
        player: &Rect,
        intensity: f32,
        now: f32,
        tuning: &LevelTuning,
        rng: &mut R,
        events: &mut Vec<GameEvent>,
    ) {
        // Top-left to top-left, not center to center
        let away = self.exit.rect.pos - player.pos;
        let distance = away.length();
        let bounds = tuning.exit_bounds;

        if distance < tuning.exit_near_radius {
            if let Some(dir) = away.try_normalize() {
                self.exit.rect.pos += dir * intensity * tuning.exit_flee_speed;
                self.clamp_exit(&bounds);
            }

            if chance(rng, intensity * tuning.exit_flicker_chance) {
                self.exit.color = if rng.random_bool(0.5) {
                    self.exit.nominal_color
                } else {
                    EXIT_WARNING_COLOR
                };
            }

            if intensity > tuning.exit_teleport_onset
                && chance(rng, intensity * tuning.exit_teleport_chance)
            {
                self.exit.rect.pos = Vec2::new(
                    bounds.left() + rng.random::<f32>() * bounds.size.x,
                    bounds.top() + rng.random::<f32>() * bounds.size.y,
                );
                self.clamp_exit(&bounds);
                log::debug!("Exit teleported to {:?}", self.exit.rect.pos);
                events.push(GameEvent::ExitTeleported);
            }
        } else {
            let origin = self.exit.origin;
            self.exit.rect.pos += (origin - self.exit.rect.pos) * tuning.exit_return_rate;

            if intensity > tuning.exit_vanish_onset
                && !self.exit.color.is_transparent()
                && chance(rng, intensity * tuning.exit_vanish_chance)
            {
                let (lo, hi) = tuning.exit_vanish_duration;
                let duration = rng.random_range(lo..=hi.max(lo));
                self.reverts
                    .schedule(now + duration, Revert::ExitColor(self.exit.color));
                self.exit.color = Color::TRANSPARENT;
            }
        }
    }

    fn clamp_exit(&mut self, bounds: &Rect) {
        let pos = &mut self.exit.rect.pos;
        pos.x = pos.x.clamp(bounds.left(), bounds.right());
        pos.y = pos.y.clamp(bounds.top(), bounds.bottom());
    }

    /// Restore platforms and exit after a death. The background is left for
    /// the next tick to recompute.
    pub fn reset(&mut self) {
        self.platforms.clone_from(&self.nominal_platforms);
        self.exit.rect.pos = self.exit.origin;
        self.exit.color = self.exit.nominal_color;
    }
}
