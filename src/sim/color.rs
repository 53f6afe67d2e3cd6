//! RGBA colors shared by the simulation and the renderers

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Linear RGBA color, channels in 0-1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    /// Used for invisible platforms and exits
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from 8-bit channels
    pub const fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0)
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.a <= 0.0
    }

    /// Random opaque color with each 8-bit channel in `lo..hi`
    pub fn random_in<R: Rng + ?Sized>(rng: &mut R, lo: [u8; 3], hi: [u8; 3]) -> Self {
        let mut channel = |i: usize| {
            if hi[i] > lo[i] {
                rng.random_range(lo[i]..hi[i])
            } else {
                lo[i]
            }
        };
        let (r, g, b) = (channel(0), channel(1), channel(2));
        Self::rgb8(r, g, b)
    }

    /// 8-bit channels, rounding and clamping
    pub fn to_rgb8(&self) -> [u8; 3] {
        let c = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [c(self.r), c(self.g), c(self.b)]
    }

    /// CSS color string for the canvas renderer
    pub fn to_css(&self) -> String {
        let [r, g, b] = self.to_rgb8();
        if self.a >= 1.0 {
            format!("rgb({},{},{})", r, g, b)
        } else {
            format!("rgba({},{},{},{:.3})", r, g, b, self.a.max(0.0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_css_strings() {
        assert_eq!(Color::rgb8(17, 17, 17).to_css(), "rgb(17,17,17)");
        assert_eq!(Color::WHITE.with_alpha(0.5).to_css(), "rgba(255,255,255,0.500)");
        assert_eq!(Color::TRANSPARENT.to_css(), "rgba(0,0,0,0.000)");
    }

    #[test]
    fn test_random_in_range() {
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..200 {
            let [r, g, b] = Color::random_in(&mut rng, [50, 50, 50], [100, 100, 100]).to_rgb8();
            assert!((50..100).contains(&r));
            assert!((50..100).contains(&g));
            assert!((50..100).contains(&b));
        }
    }
}
