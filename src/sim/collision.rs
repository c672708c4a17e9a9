//! Collision detection and response for axis-aligned boxes
//!
//! Everything here is stateless: functions take entities, report what they
//! hit and fix up the ball so the same contact isn't seen twice in a frame.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{Ball, Brick, Bullet, Paddle};
use crate::consts::PADDLE_MAX_BOUNCE;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self {
            min: pos,
            max: pos + size,
        }
    }

    pub fn from_center_half(center: Vec2, half: Vec2) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Strict overlap; touching edges don't count
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }
}

/// Contact between two boxes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Unit axis normal pointing from the obstacle toward the mover
    pub normal: Vec2,
    /// Penetration depth along `normal`
    pub penetration: f32,
}

/// Minimum-translation contact of `mover` against `obstacle`
pub fn aabb_contact(mover: &Aabb, obstacle: &Aabb) -> Option<Contact> {
    if !mover.intersects(obstacle) {
        return None;
    }

    let overlap_x = (mover.max.x - obstacle.min.x).min(obstacle.max.x - mover.min.x);
    let overlap_y = (mover.max.y - obstacle.min.y).min(obstacle.max.y - mover.min.y);
    let delta = mover.center() - obstacle.center();

    // Side faces only when the horizontal overlap is strictly shallower
    if overlap_x < overlap_y {
        let sign = if delta.x < 0.0 { -1.0 } else { 1.0 };
        Some(Contact {
            normal: Vec2::new(sign, 0.0),
            penetration: overlap_x,
        })
    } else {
        let sign = if delta.y < 0.0 { -1.0 } else { 1.0 };
        Some(Contact {
            normal: Vec2::new(0.0, sign),
            penetration: overlap_y,
        })
    }
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Bounce a ball off the paddle.
///
/// The outgoing angle depends on where the ball struck: dead center sends it
/// straight up, the edges send it off at `PADDLE_MAX_BOUNCE` from vertical.
/// Returns true if the ball was deflected.
pub fn check_ball_paddle_collision(ball: &mut Ball, paddle: &Paddle) -> bool {
    if ball.stuck || ball.vel.y <= 0.0 {
        return false;
    }
    if !ball.bounds().intersects(&paddle.bounds()) {
        return false;
    }

    let half_width = paddle.width / 2.0;
    let offset = ((ball.pos.x - paddle.center_x()) / half_width).clamp(-1.0, 1.0);
    let angle = offset * PADDLE_MAX_BOUNCE;
    ball.set_direction(Vec2::new(angle.sin(), -angle.cos()));
    ball.pos.y = paddle.pos.y - ball.radius - 0.01;
    true
}

/// Resolve the ball against the first overlapping live brick.
///
/// Reflects the velocity component along the contact axis and pushes the ball
/// out of the brick. Returns the index of the struck brick. Only one brick is
/// resolved per call; ties go to the earliest brick in `bricks`.
pub fn check_ball_brick_collision(ball: &mut Ball, bricks: &[Brick]) -> Option<usize> {
    let ball_box = ball.bounds();

    for (i, brick) in bricks.iter().enumerate() {
        if brick.destroyed {
            continue;
        }
        let Some(contact) = aabb_contact(&ball_box, &brick.bounds()) else {
            continue;
        };

        // Only reflect if moving into the face; otherwise just separate
        if ball.vel.dot(contact.normal) < 0.0 {
            ball.vel = reflect_velocity(ball.vel, contact.normal);
        }
        ball.pos += contact.normal * (contact.penetration + 0.01);
        return Some(i);
    }

    None
}

/// First live brick the bullet overlaps
pub fn find_bullet_hit(bullet: &Bullet, bricks: &[Brick]) -> Option<usize> {
    let bullet_box = bullet.bounds();
    bricks
        .iter()
        .position(|b| !b.destroyed && bullet_box.intersects(&b.bounds()))
}
