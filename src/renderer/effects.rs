//! Glitch effects drawn around the scene
//!
//! The simulation decides which effects are active; this module turns them
//! into draw calls. Each frame is: optional shake transform, scene, pop,
//! static noise, then every active timed effect in activation order.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::{BlendMode, RenderError, Renderer};
use crate::sim::glitch::{Block, GlitchEffector, GlitchLevels, Tear, VisualEffect};
use crate::sim::{Color, Rect};
use crate::tuning::GlitchTuning;
use crate::{chance, jitter};

const STATIC_COLOR: Color = Color::rgba(1.0, 1.0, 1.0, 0.02);
const SCANLINE_COLOR: Color = Color::rgba(0.0, 0.0, 0.0, 0.3);
const SPLIT_FALLBACK: Color = Color::rgba(1.0, 0.0, 0.0, 0.1);
const TEAR_FALLBACK: Color = Color::rgba(1.0, 1.0, 1.0, 0.8);
const INVERT_FALLBACK: Color = Color::rgba(1.0, 1.0, 1.0, 0.5);
const FALLBACK_BLOCK_SIZE: f32 = 20.0;

/// Per-frame cosmetic randomness, separate from the simulation stream so the
/// frame rate never changes gameplay
#[derive(Debug, Clone)]
pub struct FrameFx {
    rng: Pcg32,
}

impl FrameFx {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed ^ 0x9e37_79b9_7f4a_7c15),
        }
    }

    pub fn rng(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    /// Draw one frame: `scene` inside the shake transform, glitches on top
    pub fn render<Rd, F>(
        &mut self,
        r: &mut Rd,
        glitch: &GlitchEffector,
        intensity: f32,
        tuning: &GlitchTuning,
        scene: F,
    ) where
        Rd: Renderer + ?Sized,
        F: FnOnce(&mut Rd, &mut Pcg32),
    {
        let levels = glitch.levels;
        let shake = self.shake_offset(&levels, intensity, tuning);
        with_transform(r, shake, |r| scene(r, &mut self.rng));

        if levels.static_density > 0.0 {
            self.draw_static(r, intensity, tuning);
        }

        for effect in glitch.active() {
            self.draw_effect(r, effect, &levels);
        }
    }

    fn shake_offset(
        &mut self,
        levels: &GlitchLevels,
        intensity: f32,
        tuning: &GlitchTuning,
    ) -> Option<Vec2> {
        if levels.shake > 0.0 && chance(&mut self.rng, intensity * tuning.shake_chance) {
            Some(Vec2::new(
                jitter(&mut self.rng, levels.shake),
                jitter(&mut self.rng, levels.shake),
            ))
        } else {
            None
        }
    }

    fn draw_static<Rd: Renderer + ?Sized>(&mut self, r: &mut Rd, intensity: f32, tuning: &GlitchTuning) {
        let size = r.size();
        let count = ((intensity * tuning.static_streaks_per_unit).floor() as usize)
            .min(tuning.static_streak_cap);
        for _ in 0..count {
            let streak = Rect::new(
                self.rng.random::<f32>() * size.x,
                self.rng.random::<f32>() * size.y,
                self.rng.random::<f32>() * 20.0 * intensity,
                self.rng.random::<f32>() * 2.0 * intensity,
            );
            r.draw_rect(&streak, STATIC_COLOR);
        }
    }

    fn draw_effect<Rd: Renderer + ?Sized>(
        &mut self,
        r: &mut Rd,
        effect: &VisualEffect,
        levels: &GlitchLevels,
    ) {
        let full = Rect::from_pos_size(Vec2::ZERO, r.size());
        match effect {
            VisualEffect::ColorSplit => {
                if levels.color_shift <= 0.0 {
                    return;
                }
                if let Err(err) = color_split(r, &full, levels.color_shift) {
                    log::debug!("Color split fallback: {err}");
                    r.draw_rect(&full, SPLIT_FALLBACK);
                }
            }
            VisualEffect::Scanlines => {
                let mut y = 0.0;
                while y < full.size.y {
                    r.draw_rect(&Rect::new(0.0, y, full.size.x, 1.0), SCANLINE_COLOR);
                    y += 4.0;
                }
            }
            VisualEffect::ScreenTear { tears } => {
                for tear in tears {
                    if let Err(err) = screen_tear(r, full.size.x, tear) {
                        log::debug!("Screen tear fallback: {err}");
                        let bar = Rect::new(0.0, tear.y, full.size.x, tear.height.min(25.0));
                        r.draw_rect(&bar, TEAR_FALLBACK);
                    }
                }
            }
            VisualEffect::Invert => {
                if let Err(err) = r.draw_rect_blended(&full, Color::WHITE, BlendMode::Difference) {
                    log::debug!("Invert fallback: {err}");
                    r.draw_rect(&full, INVERT_FALLBACK);
                }
            }
            VisualEffect::Pixelate { cell, fallback } => {
                if let Err(err) = pixelate(r, &full, *cell) {
                    log::debug!("Pixelate fallback: {err}");
                    draw_blocks(r, fallback);
                }
            }
        }
    }
}

/// Run `draw` inside a translation, if one is given. Push and pop always pair.
pub fn with_transform<Rd, F>(r: &mut Rd, offset: Option<Vec2>, draw: F)
where
    Rd: Renderer + ?Sized,
    F: FnOnce(&mut Rd),
{
    match offset {
        Some(offset) => {
            r.push_transform(offset);
            draw(r);
            r.pop_transform();
        }
        None => draw(r),
    }
}

fn color_split<Rd: Renderer + ?Sized>(r: &mut Rd, full: &Rect, shift: f32) -> Result<(), RenderError> {
    r.draw_shifted_copy(full, Vec2::new(shift, 0.0), 0.3, BlendMode::Screen)?;
    r.draw_shifted_copy(full, Vec2::new(-shift, 0.0), 0.3, BlendMode::Screen)
}

fn screen_tear<Rd: Renderer + ?Sized>(r: &mut Rd, width: f32, tear: &Tear) -> Result<(), RenderError> {
    let band = Rect::new(0.0, tear.y, width, tear.height);
    r.draw_shifted_copy(&band, Vec2::new(tear.shift, 0.0), 1.0, BlendMode::Normal)
}

/// Sample one pixel per cell and fill the cell with it
fn pixelate<Rd: Renderer + ?Sized>(r: &mut Rd, full: &Rect, cell: f32) -> Result<(), RenderError> {
    let frame = r.read_pixel_block(full)?;
    let step = cell.max(1.0) as u32;
    for y in (0..frame.height).step_by(step as usize) {
        for x in (0..frame.width).step_by(step as usize) {
            if let Some(color) = frame.pixel(x, y) {
                r.draw_rect(&Rect::new(x as f32, y as f32, cell, cell), color);
            }
        }
    }
    Ok(())
}

fn draw_blocks<Rd: Renderer + ?Sized>(r: &mut Rd, blocks: &[Block]) {
    for block in blocks {
        let rect = Rect::from_pos_size(block.pos, Vec2::splat(FALLBACK_BLOCK_SIZE));
        r.draw_rect(&rect, block.color);
    }
}
