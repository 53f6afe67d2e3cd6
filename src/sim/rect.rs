//! Axis-aligned rectangle geometry for platforms, the exit and the player
//!
//! Screen coordinates: origin at the top-left corner, +y pointing down.
//! A rectangle is defined by:
//! - pos: top-left corner
//! - size: width and height (never negative)

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Penetration below this depth counts as touching, not overlapping
pub const CONTACT_EPSILON: f32 = 1e-3;

/// An axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Top-left corner
    pub pos: Vec2,
    /// Width and height
    pub size: Vec2,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self { pos, size }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.pos.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    /// Strict overlap test; rectangles sharing an edge do not overlap
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.right() - other.left() > CONTACT_EPSILON
            && other.right() - self.left() > CONTACT_EPSILON
            && self.bottom() - other.top() > CONTACT_EPSILON
            && other.bottom() - self.top() > CONTACT_EPSILON
    }

    /// Check if a point lies inside (edges inclusive)
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.left()
            && point.x <= self.right()
            && point.y >= self.top()
            && point.y <= self.bottom()
    }

    /// Whether this rectangle lies fully inside `outer`
    pub fn is_within(&self, outer: &Rect) -> bool {
        self.left() >= outer.left()
            && self.right() <= outer.right()
            && self.top() >= outer.top()
            && self.bottom() <= outer.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges() {
        let r = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(r.left(), 10.0);
        assert_eq!(r.right(), 40.0);
        assert_eq!(r.top(), 20.0);
        assert_eq!(r.bottom(), 60.0);
        assert_eq!(r.center(), Vec2::new(25.0, 40.0));
    }

    #[test]
    fn test_overlap_is_strict() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let touching = Rect::new(10.0, 0.0, 10.0, 10.0);
        let overlapping = Rect::new(9.0, 9.0, 10.0, 10.0);
        let apart = Rect::new(50.0, 50.0, 5.0, 5.0);

        assert!(!a.overlaps(&touching));
        assert!(a.overlaps(&overlapping));
        assert!(overlapping.overlaps(&a));
        assert!(!a.overlaps(&apart));
    }

    #[test]
    fn test_within() {
        let bounds = Rect::new(0.0, 0.0, 800.0, 600.0);
        assert!(Rect::new(0.0, 0.0, 800.0, 600.0).is_within(&bounds));
        assert!(!Rect::new(790.0, 10.0, 20.0, 20.0).is_within(&bounds));
    }
}
