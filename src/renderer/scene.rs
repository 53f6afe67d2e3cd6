//! Scene drawing: level, player and the debug overlay

use glam::Vec2;
use rand::Rng;

use super::Renderer;
use super::effects::FrameFx;
use crate::sim::level::Level;
use crate::sim::{Color, GameState, Player, Rect};
use crate::tuning::{GlitchTuning, Tuning};
use crate::{chance, jitter};

const FACE_COLOR: Color = Color::BLACK;
const ARTIFACT_COLOR: Color = Color::rgba(1.0, 0.0, 0.0, 0.5);
const DEBUG_TEXT_COLOR: Color = Color::WHITE;

/// Numbers shown by the F1 overlay
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugInfo {
    pub playtime_secs: f32,
    pub deaths: u32,
    pub intensity: f32,
}

impl DebugInfo {
    pub fn from_state(state: &GameState) -> Self {
        Self {
            playtime_secs: state.counters().playtime_secs,
            deaths: state.counters().deaths,
            intensity: state.intensity(),
        }
    }

    pub fn lines(&self) -> [String; 3] {
        [
            format!("Time: {:.1}s", self.playtime_secs),
            format!("Deaths: {}", self.deaths),
            format!("Glitch: {:.0}%", self.intensity * 100.0),
        ]
    }
}

/// Draw a complete frame
pub fn render_frame<Rd: Renderer + ?Sized>(
    r: &mut Rd,
    fx: &mut FrameFx,
    state: &GameState,
    tuning: &Tuning,
    show_debug: bool,
) {
    let intensity = state.intensity();
    fx.render(r, &state.glitch, intensity, &tuning.glitch, |r, rng| {
        draw_level(r, &state.level);
        draw_player(r, &state.player, intensity, &tuning.glitch, rng);
    });

    if show_debug {
        draw_debug(r, &DebugInfo::from_state(state));
    }
}

pub fn draw_level<Rd: Renderer + ?Sized>(r: &mut Rd, level: &Level) {
    let full = Rect::from_pos_size(Vec2::ZERO, r.size());
    r.draw_rect(&full, level.background);

    for platform in &level.platforms {
        r.draw_rect(&platform.rect, platform.color);
    }

    let exit = &level.exit;
    r.draw_rect(&exit.rect, exit.color);
    // A vanished door takes its knob with it
    if !exit.color.is_transparent() {
        let knob = Rect::new(exit.rect.right() - 10.0, exit.rect.top() + 30.0, 5.0, 5.0);
        r.draw_rect(&knob, FACE_COLOR);
    }
}

pub fn draw_player<Rd, R>(r: &mut Rd, player: &Player, intensity: f32, tuning: &GlitchTuning, rng: &mut R)
where
    Rd: Renderer + ?Sized,
    R: Rng + ?Sized,
{
    let body = player.rect();
    r.draw_rect(&body, player.color);

    // Face
    let eye = 5.0;
    let eye_y = body.top() + 15.0;
    r.draw_rect(&Rect::new(body.left() + 7.0, eye_y, eye, eye), FACE_COLOR);
    r.draw_rect(&Rect::new(body.right() - 12.0, eye_y, eye, eye), FACE_COLOR);
    r.draw_rect(
        &Rect::new(body.left() + 10.0, body.top() + 30.0, body.size.x - 20.0, 3.0),
        FACE_COLOR,
    );

    if intensity > tuning.player_artifact_onset
        && chance(rng, intensity * tuning.player_artifact_chance)
    {
        let artifact = Rect::new(
            body.left() + jitter(rng, 10.0),
            body.top() + jitter(rng, 10.0),
            body.size.x + jitter(rng, 20.0),
            body.size.y + jitter(rng, 20.0),
        );
        r.draw_rect(&artifact, ARTIFACT_COLOR);
    }
}

pub fn draw_debug<Rd: Renderer + ?Sized>(r: &mut Rd, info: &DebugInfo) {
    for (i, line) in info.lines().iter().enumerate() {
        let pos = Vec2::new(10.0, 8.0 + 20.0 * i as f32);
        r.draw_text(line, pos, 12.0, DEBUG_TEXT_COLOR);
    }
}
