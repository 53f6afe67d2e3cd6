//! Rendering
//!
//! The game draws through the [`Renderer`] trait: flat rectangles, text,
//! translations and a handful of pixel operations the glitch effects need.
//! Pixel operations can fail (tainted canvas, missing context), so they
//! return `Result` and every caller has a flat-fill fallback.

pub mod effects;
pub mod scene;

#[cfg(target_arch = "wasm32")]
pub mod canvas;

#[cfg(target_arch = "wasm32")]
pub use canvas::CanvasRenderer;
pub use effects::FrameFx;
pub use scene::{DebugInfo, render_frame};

use glam::Vec2;
use thiserror::Error;

use crate::sim::{Color, Rect};

/// Compositing mode for blended draws
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    Normal,
    /// Lightens; used for the color split
    Screen,
    /// Subtracts; white over the frame inverts it
    Difference,
}

impl BlendMode {
    /// Canvas `globalCompositeOperation` name
    pub fn composite_op(self) -> &'static str {
        match self {
            BlendMode::Normal => "source-over",
            BlendMode::Screen => "screen",
            BlendMode::Difference => "difference",
        }
    }
}

/// Rendering failures. None of them are fatal to a frame.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("drawing surface unavailable: {0}")]
    Unavailable(String),
    #[error("pixel access denied: {0}")]
    PixelAccess(String),
    #[error("region {0:?} is outside the surface")]
    OutOfBounds(Rect),
}

/// A copy of a rectangular region, RGBA8 row-major
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBlock {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl PixelBlock {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, RenderError> {
        if data.len() != (width as usize) * (height as usize) * 4 {
            return Err(RenderError::PixelAccess(format!(
                "expected {}x{} RGBA bytes, got {}",
                width,
                height,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Opaque color of one pixel, `None` outside the block
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        let px = self.data.get(i..i + 3)?;
        Some(Color::rgb8(px[0], px[1], px[2]))
    }
}

/// Drawing surface
pub trait Renderer {
    /// Surface size in pixels
    fn size(&self) -> Vec2;

    fn clear(&mut self, color: Color);

    fn draw_rect(&mut self, rect: &Rect, color: Color);

    /// Draw with a compositing mode; fails if the mode is unsupported
    fn draw_rect_blended(
        &mut self,
        rect: &Rect,
        color: Color,
        blend: BlendMode,
    ) -> Result<(), RenderError>;

    /// Text with its top-left at `pos`
    fn draw_text(&mut self, text: &str, pos: Vec2, size_px: f32, color: Color);

    /// Translate everything drawn until the matching pop
    fn push_transform(&mut self, offset: Vec2);

    fn pop_transform(&mut self);

    /// Redraw the region `src` of the current frame shifted by `offset`
    fn draw_shifted_copy(
        &mut self,
        src: &Rect,
        offset: Vec2,
        alpha: f32,
        blend: BlendMode,
    ) -> Result<(), RenderError>;

    fn read_pixel_block(&mut self, rect: &Rect) -> Result<PixelBlock, RenderError>;

    fn write_pixel_block(&mut self, pos: Vec2, block: &PixelBlock) -> Result<(), RenderError>;
}
