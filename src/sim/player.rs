//! Player kinematics
//!
//! Velocities are in pixels per tick. Per tick the order is: corruption
//! injection, input, integration, boundary check. Collision resolution runs
//! afterwards from the tick, against the level geometry.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::color::Color;
use super::rect::Rect;
use super::tick::TickInput;
use crate::tuning::PhysicsTuning;
use crate::{chance, jitter};

/// Nominal player color (`#3af`)
pub const PLAYER_COLOR: Color = Color::rgb8(0x33, 0xaa, 0xff);

/// Result of the boundary check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundsOutcome {
    InBounds,
    /// Fell past the bottom edge; the session decides what happens next
    Fell,
}

/// The player character
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
    pub on_ground: bool,
    pub color: Color,
    spawn: Vec2,
    nominal_color: Color,
    /// Jump control state last tick, for edge detection
    jump_held: bool,
}

impl Player {
    pub fn new(tuning: &PhysicsTuning) -> Self {
        Self {
            pos: tuning.spawn,
            vel: Vec2::ZERO,
            size: tuning.player_size,
            on_ground: false,
            color: PLAYER_COLOR,
            spawn: tuning.spawn,
            nominal_color: PLAYER_COLOR,
            jump_held: false,
        }
    }

    /// Current bounding box
    pub fn rect(&self) -> Rect {
        Rect::from_pos_size(self.pos, self.size)
    }

    pub fn spawn(&self) -> Vec2 {
        self.spawn
    }

    pub fn nominal_color(&self) -> Color {
        self.nominal_color
    }

    /// Color flicker and random shoves at high intensity
    pub fn apply_corruption<R: Rng + ?Sized>(
        &mut self,
        intensity: f32,
        tuning: &PhysicsTuning,
        rng: &mut R,
    ) {
        if intensity <= tuning.flicker_onset {
            return;
        }

        if chance(rng, intensity * tuning.flicker_chance) {
            self.color = Color::random_in(rng, [0, 0, 0], [255, 255, 255]);
        } else {
            self.color = self.nominal_color;
        }

        if intensity > tuning.impulse_onset && chance(rng, intensity * tuning.impulse_chance) {
            let scale = tuning.impulse_scale * intensity;
            let impulse = Vec2::new(jitter(rng, scale), jitter(rng, scale));
            self.apply_impulse(impulse);
        }
    }

    /// Additive velocity perturbation; boundary clamping still applies afterwards
    pub fn apply_impulse(&mut self, impulse: Vec2) {
        if impulse.is_finite() {
            self.vel += impulse;
        }
    }

    /// Apply held directions and the jump edge. Returns true if a jump started.
    pub fn apply_input(&mut self, input: &TickInput, dt: f32, tuning: &PhysicsTuning) -> bool {
        if input.left {
            self.vel.x -= tuning.run_accel * dt;
        }
        if input.right {
            self.vel.x += tuning.run_accel * dt;
        }

        let pressed = input.jump && !self.jump_held;
        self.jump_held = input.jump;

        if pressed && self.on_ground {
            self.jump(tuning);
            return true;
        }
        false
    }

    /// Start a jump: velocity is set, not added
    pub fn jump(&mut self, tuning: &PhysicsTuning) {
        self.vel.y = tuning.jump_velocity;
        self.on_ground = false;
    }

    /// Gravity, friction and movement for one tick
    pub fn integrate(&mut self, tuning: &PhysicsTuning) {
        self.vel.y += tuning.gravity;

        self.vel.x *= tuning.friction;
        if self.vel.x.abs() < tuning.rest_threshold {
            self.vel.x = 0.0;
        }

        self.pos += self.vel;

        // Only a downward collision this tick puts us back on the ground
        self.on_ground = false;
    }

    /// Clamp horizontally to the arena and report falling out the bottom
    pub fn check_bounds(&mut self, arena: Vec2) -> BoundsOutcome {
        if self.pos.x < 0.0 {
            self.pos.x = 0.0;
            self.vel.x = 0.0;
        }
        if self.pos.x + self.size.x > arena.x {
            self.pos.x = arena.x - self.size.x;
            self.vel.x = 0.0;
        }

        if self.pos.y > arena.y {
            BoundsOutcome::Fell
        } else {
            BoundsOutcome::InBounds
        }
    }

    /// Back to spawn, at rest, nominal color
    pub fn reset(&mut self) {
        self.pos = self.spawn;
        self.vel = Vec2::ZERO;
        self.on_ground = false;
        self.color = self.nominal_color;
    }
}
