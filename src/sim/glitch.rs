//! Glitch scheduling
//!
//! Decides, tick by tick, which visual distortions are active. Drawing them is
//! the renderer's job (`renderer::effects`); this module only owns the state:
//! working magnitudes derived from intensity, the set of timed effects with
//! their expiry heap, and the shared cooldown for major glitches.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::color::Color;
use super::scheduler::Scheduler;
use super::state::{GameEvent, SessionState};
use crate::chance;
use crate::tuning::GlitchTuning;

/// Per-tick magnitudes, all zero below the onset intensity
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GlitchLevels {
    /// Maximum shake offset span in pixels
    pub shake: f32,
    /// Horizontal color split distance in whole pixels
    pub color_shift: f32,
    /// Static noise density
    pub static_density: f32,
}

impl GlitchLevels {
    pub fn from_intensity(intensity: f32, tuning: &GlitchTuning) -> Self {
        if intensity < tuning.onset {
            return Self::default();
        }
        Self {
            shake: intensity * tuning.shake_scale,
            color_shift: (intensity * tuning.color_shift_scale).floor(),
            static_density: intensity * tuning.static_scale,
        }
    }
}

/// One horizontal band of a screen tear
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tear {
    pub y: f32,
    pub height: f32,
    /// Horizontal displacement of the band
    pub shift: f32,
}

/// Colored block drawn when pixelation cannot read the frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub pos: Vec2,
    pub color: Color,
}

/// A timed visual distortion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VisualEffect {
    /// Screen-blended copies shifted left and right
    ColorSplit,
    Scanlines,
    ScreenTear { tears: Vec<Tear> },
    Invert,
    Pixelate { cell: f32, fallback: Vec<Block> },
}

impl VisualEffect {
    /// Effects subject to the shared major-glitch cooldown
    pub fn is_major(&self) -> bool {
        !matches!(self, VisualEffect::ColorSplit | VisualEffect::Scanlines)
    }
}

/// Major glitch families, chosen uniformly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MajorGlitch {
    ScreenTear,
    /// Halts the game loop; only fires above the fake-crash onset
    FakeCrash,
    /// Asks the narrator for a message
    Message,
    Invert,
    Pixelate,
}

impl MajorGlitch {
    pub const ALL: [MajorGlitch; 5] = [
        MajorGlitch::ScreenTear,
        MajorGlitch::FakeCrash,
        MajorGlitch::Message,
        MajorGlitch::Invert,
        MajorGlitch::Pixelate,
    ];
}

/// Visual glitch state for the whole screen
#[derive(Debug, Clone)]
pub struct GlitchEffector {
    pub levels: GlitchLevels,
    active: Vec<(u64, VisualEffect)>,
    expiries: Scheduler<u64>,
    next_id: u64,
    last_major: Option<f32>,
    arena: Vec2,
}

impl GlitchEffector {
    pub fn new(arena: Vec2) -> Self {
        Self {
            levels: GlitchLevels::default(),
            active: Vec::new(),
            expiries: Scheduler::new(),
            next_id: 0,
            last_major: None,
            arena,
        }
    }

    /// Currently active timed effects, oldest first
    pub fn active(&self) -> impl Iterator<Item = &VisualEffect> {
        self.active.iter().map(|(_, e)| e)
    }

    pub fn is_active(&self, pred: impl Fn(&VisualEffect) -> bool) -> bool {
        self.active.iter().any(|(_, e)| pred(e))
    }

    /// Simulation time of the last major glitch attempt
    pub fn last_major(&self) -> Option<f32> {
        self.last_major
    }

    /// One tick: refresh magnitudes, revert expired effects, roll for new ones.
    /// Returns the major glitch that fired, if any, so the session can route
    /// crashes and messages.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        session: &SessionState,
        dt: f32,
        tuning: &GlitchTuning,
        rng: &mut R,
        events: &mut Vec<GameEvent>,
    ) -> Option<MajorGlitch> {
        let now = session.clock;
        let intensity = session.intensity;
        self.levels = GlitchLevels::from_intensity(intensity, tuning);

        for id in self.expiries.drain_due(now) {
            self.active.retain(|(active_id, _)| *active_id != id);
        }

        if self.levels.color_shift > 0.0
            && chance(rng, intensity * tuning.color_split_rate_per_sec * dt)
        {
            let (lo, hi) = tuning.minor_duration;
            self.start(VisualEffect::ColorSplit, now, rng.random_range(lo..=hi.max(lo)));
        }

        if intensity > tuning.scanline_onset
            && chance(rng, intensity * tuning.scanline_rate_per_sec * dt)
        {
            let (lo, hi) = tuning.minor_duration;
            self.start(VisualEffect::Scanlines, now, rng.random_range(lo..=hi.max(lo)));
        }

        if intensity > tuning.major_onset && chance(rng, intensity * tuning.major_rate_per_sec * dt)
        {
            return self.trigger_major(session, tuning, rng, events);
        }
        None
    }

    /// Attempt a major glitch. Does nothing inside the cooldown window.
    pub fn trigger_major<R: Rng + ?Sized>(
        &mut self,
        session: &SessionState,
        tuning: &GlitchTuning,
        rng: &mut R,
        events: &mut Vec<GameEvent>,
    ) -> Option<MajorGlitch> {
        let now = session.clock;
        if self
            .last_major
            .is_some_and(|last| now - last < tuning.major_cooldown)
        {
            return None;
        }
        self.last_major = Some(now);

        let intensity = session.intensity;
        let kind = MajorGlitch::ALL[rng.random_range(0..MajorGlitch::ALL.len())];
        log::debug!("Major glitch {:?} at intensity {:.2}", kind, intensity);

        let fired = match kind {
            MajorGlitch::ScreenTear => {
                let tears = self.roll_tears(intensity, tuning, rng);
                let (lo, hi) = tuning.tear_duration;
                self.start(VisualEffect::ScreenTear { tears }, now, rng.random_range(lo..=hi.max(lo)));
                Some(kind)
            }
            MajorGlitch::FakeCrash => {
                if intensity > tuning.fake_crash_onset {
                    events.push(GameEvent::FakeCrash);
                    Some(kind)
                } else {
                    None
                }
            }
            MajorGlitch::Message => Some(kind),
            MajorGlitch::Invert => {
                let (lo, hi) = tuning.invert_duration;
                self.start(VisualEffect::Invert, now, rng.random_range(lo..=hi.max(lo)));
                Some(kind)
            }
            MajorGlitch::Pixelate => {
                events.push(GameEvent::GlitchSound);
                let cell = (10.0 * intensity).floor().max(5.0);
                let fallback = (0..20)
                    .map(|_| Block {
                        pos: Vec2::new(
                            rng.random::<f32>() * self.arena.x,
                            rng.random::<f32>() * self.arena.y,
                        ),
                        color: Color::random_in(rng, [0, 0, 0], [255, 255, 255]).with_alpha(0.5),
                    })
                    .collect();
                let (lo, hi) = tuning.pixelate_duration;
                self.start(
                    VisualEffect::Pixelate { cell, fallback },
                    now,
                    rng.random_range(lo..=hi.max(lo)),
                );
                Some(kind)
            }
        };

        if chance(rng, tuning.glitch_sound_chance) {
            events.push(GameEvent::GlitchSound);
        }
        fired
    }

    fn roll_tears<R: Rng + ?Sized>(
        &self,
        intensity: f32,
        tuning: &GlitchTuning,
        rng: &mut R,
    ) -> Vec<Tear> {
        let arena = self.arena;
        let tear = |rng: &mut R, min_h: f32, span_h: f32, min_s: f32, span_s: f32| {
            let sign = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
            Tear {
                y: (rng.random::<f32>() * arena.y).floor(),
                height: (min_h + rng.random::<f32>() * span_h).floor(),
                shift: (min_s + rng.random::<f32>() * span_s).floor() * sign,
            }
        };

        let mut tears = vec![tear(rng, 20.0, 50.0, 10.0, 50.0)];
        if intensity > tuning.multi_tear_onset && rng.random_bool(0.5) {
            for _ in 0..3 {
                tears.push(tear(rng, 10.0, 30.0, 5.0, 30.0));
            }
        }
        tears
    }

    /// Activate `effect` for `duration` seconds
    pub fn start(&mut self, effect: VisualEffect, now: f32, duration: f32) {
        let id = self.next_id;
        self.next_id += 1;
        self.active.push((id, effect));
        self.expiries.schedule(now + duration.max(0.0), id);
    }
}
