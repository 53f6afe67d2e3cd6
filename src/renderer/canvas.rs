//! Canvas 2D backend (browser only)

use glam::Vec2;
use wasm_bindgen::{Clamped, JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData};

use super::{BlendMode, PixelBlock, RenderError, Renderer};
use crate::sim::{Color, Rect};

fn js_err(err: JsValue) -> RenderError {
    RenderError::PixelAccess(format!("{err:?}"))
}

/// Draws into an HTML canvas through its 2D context
pub struct CanvasRenderer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasRenderer {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, RenderError> {
        let ctx = canvas
            .get_context("2d")
            .map_err(|e| RenderError::Unavailable(format!("{e:?}")))?
            .ok_or_else(|| RenderError::Unavailable("2D canvas context".into()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| RenderError::Unavailable("not a 2D context".into()))?;
        ctx.set_image_smoothing_enabled(false);
        Ok(Self { canvas, ctx })
    }

    fn fill(&self, rect: &Rect, color: Color) {
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.fill_rect(
            rect.pos.x as f64,
            rect.pos.y as f64,
            rect.size.x as f64,
            rect.size.y as f64,
        );
    }

    fn set_blend(&self, blend: BlendMode) -> Result<(), RenderError> {
        self.ctx
            .set_global_composite_operation(blend.composite_op())
            .map_err(js_err)
    }

    /// Put compositing back to normal; failure here leaves nothing to undo
    fn reset_blend(&self) {
        self.ctx.set_global_alpha(1.0);
        let _ = self.set_blend(BlendMode::Normal);
    }
}

impl Renderer for CanvasRenderer {
    fn size(&self) -> Vec2 {
        Vec2::new(self.canvas.width() as f32, self.canvas.height() as f32)
    }

    fn clear(&mut self, color: Color) {
        let full = Rect::from_pos_size(Vec2::ZERO, self.size());
        self.fill(&full, color);
    }

    fn draw_rect(&mut self, rect: &Rect, color: Color) {
        self.fill(rect, color);
    }

    fn draw_rect_blended(
        &mut self,
        rect: &Rect,
        color: Color,
        blend: BlendMode,
    ) -> Result<(), RenderError> {
        let result = self.set_blend(blend).map(|_| self.fill(rect, color));
        self.reset_blend();
        result
    }

    fn draw_text(&mut self, text: &str, pos: Vec2, size_px: f32, color: Color) {
        self.ctx.set_font(&format!("{size_px}px monospace"));
        self.ctx.set_text_baseline("top");
        self.ctx.set_fill_style_str(&color.to_css());
        if let Err(e) = self.ctx.fill_text(text, pos.x as f64, pos.y as f64) {
            log::debug!("fill_text failed: {e:?}");
        }
    }

    fn push_transform(&mut self, offset: Vec2) {
        self.ctx.save();
        if let Err(e) = self.ctx.translate(offset.x as f64, offset.y as f64) {
            log::debug!("translate failed: {e:?}");
        }
    }

    fn pop_transform(&mut self) {
        self.ctx.restore();
    }

    fn draw_shifted_copy(
        &mut self,
        src: &Rect,
        offset: Vec2,
        alpha: f32,
        blend: BlendMode,
    ) -> Result<(), RenderError> {
        let (sx, sy, sw, sh) = (
            src.pos.x as f64,
            src.pos.y as f64,
            src.size.x as f64,
            src.size.y as f64,
        );
        if sw <= 0.0 || sh <= 0.0 {
            return Err(RenderError::OutOfBounds(*src));
        }

        self.ctx.set_global_alpha(alpha as f64);
        let result = self.set_blend(blend).and_then(|_| {
            self.ctx
                .draw_image_with_html_canvas_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                    &self.canvas,
                    sx,
                    sy,
                    sw,
                    sh,
                    sx + offset.x as f64,
                    sy + offset.y as f64,
                    sw,
                    sh,
                )
                .map_err(js_err)
        });
        self.reset_blend();
        result
    }

    fn read_pixel_block(&mut self, rect: &Rect) -> Result<PixelBlock, RenderError> {
        if rect.size.x < 1.0 || rect.size.y < 1.0 {
            return Err(RenderError::OutOfBounds(*rect));
        }
        let image = self
            .ctx
            .get_image_data(
                rect.pos.x as f64,
                rect.pos.y as f64,
                rect.size.x as f64,
                rect.size.y as f64,
            )
            .map_err(js_err)?;
        PixelBlock::new(image.width(), image.height(), image.data().0)
    }

    fn write_pixel_block(&mut self, pos: Vec2, block: &PixelBlock) -> Result<(), RenderError> {
        let image = ImageData::new_with_u8_clamped_array_and_sh(
            Clamped(&block.data),
            block.width,
            block.height,
        )
        .map_err(js_err)?;
        self.ctx
            .put_image_data(&image, pos.x as f64, pos.y as f64)
            .map_err(js_err)
    }
}
