//! AABB collision detection and response
//!
//! For each overlapping platform the four penetration depths are measured
//! and the shallowest face wins, ties going to top, bottom, left, right in
//! that order. The mover is only pushed out of that face if its velocity
//! points into it (landing on top needs downward motion, and so on);
//! otherwise the overlap is left alone for this tick.

use glam::Vec2;

use super::level::Platform;
use super::player::Player;
use super::rect::Rect;

/// Which face of the solid the mover was pushed out of
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactSide {
    /// Landed on the solid
    Top,
    /// Bumped its underside
    Bottom,
    /// Pushed back out of its left face
    Left,
    /// Pushed back out of its right face
    Right,
}

/// Penetration depth of a mover into a solid along each approach direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Penetration {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
}

impl Penetration {
    /// Measure overlap, `None` if the rectangles do not overlap
    pub fn measure(mover: &Rect, solid: &Rect) -> Option<Self> {
        if !mover.overlaps(solid) {
            return None;
        }
        Some(Self {
            top: mover.bottom() - solid.top(),
            bottom: solid.bottom() - mover.top(),
            left: mover.right() - solid.left(),
            right: solid.right() - mover.left(),
        })
    }

    /// Shallowest face in tie-break order, if the velocity points into it
    pub fn pick(&self, vel: Vec2) -> Option<ContactSide> {
        let faces = [
            (ContactSide::Top, self.top, vel.y > 0.0),
            (ContactSide::Bottom, self.bottom, vel.y < 0.0),
            (ContactSide::Left, self.left, vel.x > 0.0),
            (ContactSide::Right, self.right, vel.x < 0.0),
        ];

        let mut best = faces[0];
        for face in &faces[1..] {
            // Strict comparison keeps the earlier face on ties
            if face.1 < best.1 {
                best = *face;
            }
        }
        let (side, _, moving_into) = best;
        moving_into.then_some(side)
    }
}

/// Push a moving box out of one solid. Returns the face it was resolved against.
pub fn resolve_aabb(pos: &mut Vec2, size: Vec2, vel: &mut Vec2, solid: &Rect) -> Option<ContactSide> {
    let mover = Rect::from_pos_size(*pos, size);
    let side = Penetration::measure(&mover, solid)?.pick(*vel)?;

    match side {
        ContactSide::Top => {
            pos.y = solid.top() - size.y;
            vel.y = 0.0;
        }
        ContactSide::Bottom => {
            pos.y = solid.bottom();
            vel.y = 0.0;
        }
        ContactSide::Left => {
            pos.x = solid.left() - size.x;
            vel.x = 0.0;
        }
        ContactSide::Right => {
            pos.x = solid.right();
            vel.x = 0.0;
        }
    }
    Some(side)
}

/// Resolve the player against every platform in order. Landing sets `on_ground`.
pub fn resolve_player_collisions(player: &mut Player, platforms: &[Platform]) {
    for platform in platforms {
        let size = player.size;
        if resolve_aabb(&mut player.pos, size, &mut player.vel, &platform.rect)
            == Some(ContactSide::Top)
        {
            player.on_ground = true;
        }
    }
}

/// Whether the player is touching the exit door
pub fn player_exit_overlap(player: &Player, exit: &Rect) -> bool {
    player.rect().overlaps(exit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::color::Color;
    use crate::tuning::PhysicsTuning;
    use proptest::prelude::*;

    #[test]
    fn test_landing_scenario() {
        let solid = Rect::new(0.0, 500.0, 300.0, 20.0);
        let mut pos = Vec2::new(10.0, 490.0);
        let mut vel = Vec2::new(0.0, 5.0);

        let side = resolve_aabb(&mut pos, Vec2::new(30.0, 50.0), &mut vel, &solid);

        assert_eq!(side, Some(ContactSide::Top));
        assert_eq!(pos.y, 450.0);
        assert_eq!(vel.y, 0.0);
    }

    #[test]
    fn test_player_lands_and_grounds() {
        let mut player = Player::new(&PhysicsTuning::default());
        player.pos = Vec2::new(10.0, 490.0);
        player.size = Vec2::new(30.0, 50.0);
        player.vel = Vec2::new(0.0, 5.0);
        let platforms = [Platform::new(Rect::new(0.0, 500.0, 300.0, 20.0), Color::WHITE)];

        resolve_player_collisions(&mut player, &platforms);

        assert_eq!(player.pos.y, 450.0);
        assert_eq!(player.vel.y, 0.0);
        assert!(player.on_ground);
    }

    #[test]
    fn test_head_bump() {
        let solid = Rect::new(0.0, 100.0, 200.0, 20.0);
        let mut pos = Vec2::new(50.0, 115.0);
        let mut vel = Vec2::new(0.0, -8.0);

        let side = resolve_aabb(&mut pos, Vec2::new(30.0, 50.0), &mut vel, &solid);

        assert_eq!(side, Some(ContactSide::Bottom));
        assert_eq!(pos.y, 120.0);
        assert_eq!(vel.y, 0.0);
    }

    #[test]
    fn test_side_push() {
        let wall = Rect::new(100.0, 0.0, 20.0, 300.0);
        let mut pos = Vec2::new(75.0, 100.0);
        let mut vel = Vec2::new(4.0, 0.0);

        let side = resolve_aabb(&mut pos, Vec2::new(30.0, 50.0), &mut vel, &wall);

        assert_eq!(side, Some(ContactSide::Left));
        assert_eq!(pos.x, 70.0);
        assert_eq!(vel.x, 0.0);
    }

    #[test]
    fn test_against_travel_is_ignored() {
        // Shallowest face is the bottom, but the mover is falling
        let solid = Rect::new(0.0, 500.0, 300.0, 20.0);
        let mut pos = Vec2::new(100.0, 510.0);
        let mut vel = Vec2::new(0.0, 0.0);

        let side = resolve_aabb(&mut pos, Vec2::new(30.0, 50.0), &mut vel, &solid);
        assert_eq!(side, None);
        assert_eq!(pos, Vec2::new(100.0, 510.0));
    }

    #[test]
    fn test_tie_prefers_top() {
        let p = Penetration {
            top: 2.0,
            bottom: 2.0,
            left: 2.0,
            right: 2.0,
        };
        assert_eq!(p.pick(Vec2::new(1.0, 1.0)), Some(ContactSide::Top));
        // Top still wins the tie, and rising does not match it
        assert_eq!(p.pick(Vec2::new(1.0, -1.0)), None);
        assert_eq!(p.pick(Vec2::new(-1.0, 0.0)), None);
    }

    #[test]
    fn test_corner_graze_does_not_snap_up() {
        // Shallowest face is the left one (2px), but the mover only falls
        let solid = Rect::new(100.0, 300.0, 100.0, 20.0);
        let mut pos = Vec2::new(72.0, 280.0);
        let mut vel = Vec2::new(0.0, 10.0);

        let side = resolve_aabb(&mut pos, Vec2::new(30.0, 50.0), &mut vel, &solid);

        assert_eq!(side, None);
        assert_eq!(pos, Vec2::new(72.0, 280.0));
        assert_eq!(vel, Vec2::new(0.0, 10.0));
    }

    #[test]
    fn test_shallow_side_with_matching_velocity_pushes_out() {
        let solid = Rect::new(100.0, 300.0, 100.0, 20.0);
        let mut pos = Vec2::new(72.0, 280.0);
        let mut vel = Vec2::new(3.0, 10.0);

        let side = resolve_aabb(&mut pos, Vec2::new(30.0, 50.0), &mut vel, &solid);

        assert_eq!(side, Some(ContactSide::Left));
        assert_eq!(pos.x, 70.0);
        assert_eq!(vel, Vec2::new(0.0, 10.0));
    }

    proptest! {
        #[test]
        fn resolution_is_idempotent(
            px in -40.0f32..340.0,
            py in 440.0f32..530.0,
            vx in -10.0f32..10.0,
            vy in 0.1f32..15.0,
        ) {
            let solid = Rect::new(0.0, 500.0, 300.0, 20.0);
            let size = Vec2::new(30.0, 50.0);
            let mut pos = Vec2::new(px, py);
            let mut vel = Vec2::new(vx, vy);

            let first = resolve_aabb(&mut pos, size, &mut vel, &solid);
            let settled = (pos, vel);
            if first.is_some() {
                prop_assert!(!Rect::from_pos_size(pos, size).overlaps(&solid));
            }

            let again = resolve_aabb(&mut pos, size, &mut vel, &solid);
            prop_assert_eq!(again, None);
            prop_assert_eq!((pos, vel), settled);
        }
    }
}
