//! Entity model: paddle, balls, bricks, power-up pickups and bullets
//!
//! Entities only mutate their own state. Anything that crosses entity
//! boundaries (scoring, spawning, effects) belongs to the orchestrator.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use crate::consts::*;

/// State machine phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title / level selection; no simulation
    Menu,
    /// Active gameplay
    Playing,
    /// Game is paused
    Paused,
    /// Run ended (lives exhausted or catalog finished)
    GameOver,
    /// All breakable bricks cleared, waiting for `next_level`
    LevelComplete,
}

/// Things that happened during a frame or command, drained by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    BrickDestroyed {
        center: Vec2,
        kind: BrickKind,
        points: u64,
    },
    PowerUpSpawned {
        kind: PowerUpKind,
        center: Vec2,
    },
    PowerUpCollected {
        kind: PowerUpKind,
    },
    PowerUpExpired {
        kind: PowerUpKind,
    },
    BallLost {
        remaining: usize,
    },
    LifeLost {
        lives: u32,
    },
    LevelComplete {
        level: u32,
    },
    GameOver {
        score: u64,
        new_high_score: bool,
    },
}

/// The player's paddle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paddle {
    /// Top-left corner
    pub pos: Vec2,
    pub width: f32,
    pub height: f32,
    /// Horizontal speed (units/s)
    pub speed: f32,
    moving_left: bool,
    moving_right: bool,
}

impl Default for Paddle {
    fn default() -> Self {
        Self::new()
    }
}

impl Paddle {
    pub fn new() -> Self {
        Self {
            pos: Vec2::new((PLAYFIELD_WIDTH - PADDLE_WIDTH) / 2.0, PADDLE_Y),
            width: PADDLE_WIDTH,
            height: PADDLE_HEIGHT,
            speed: PADDLE_SPEED,
            moving_left: false,
            moving_right: false,
        }
    }

    pub fn set_moving_left(&mut self, moving: bool) {
        self.moving_left = moving;
    }

    pub fn set_moving_right(&mut self, moving: bool) {
        self.moving_right = moving;
    }

    /// Move horizontally according to the movement flags
    pub fn update(&mut self, dt: f32) {
        let dir = match (self.moving_left, self.moving_right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        };
        self.pos.x += dir * self.speed * dt;
        self.clamp_to_playfield();
    }

    /// Widen the paddle around its current center
    pub fn expand(&mut self, factor: f32) {
        self.set_width(PADDLE_WIDTH * factor);
    }

    /// Narrow the paddle around its current center
    pub fn shrink(&mut self, factor: f32) {
        self.set_width(PADDLE_WIDTH * factor);
    }

    pub fn reset_size(&mut self) {
        self.set_width(PADDLE_WIDTH);
    }

    /// Restore nominal size, center the paddle and stop it
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn center(&self) -> Vec2 {
        self.pos + Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn center_x(&self) -> f32 {
        self.pos.x + self.width / 2.0
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_pos_size(self.pos, Vec2::new(self.width, self.height))
    }

    fn set_width(&mut self, width: f32) {
        let center = self.center_x();
        self.width = width.min(PLAYFIELD_WIDTH);
        self.pos.x = center - self.width / 2.0;
        self.clamp_to_playfield();
    }

    fn clamp_to_playfield(&mut self) {
        self.pos.x = self.pos.x.clamp(0.0, PLAYFIELD_WIDTH - self.width);
    }
}

/// How fast the render position chases the physics position (1/s)
const SMOOTHING_RATE: f32 = 30.0;

/// A ball entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    /// Physics position (center)
    pub pos: Vec2,
    /// Interpolated position for rendering
    smooth_pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Speed at multiplier 1.0
    pub base_speed: f32,
    speed_multiplier: f32,
    /// Attached to the paddle, waiting for launch
    pub stuck: bool,
}

impl Ball {
    /// New ball resting on top of the paddle
    pub fn on_paddle(paddle: &Paddle, base_speed: f32) -> Self {
        let mut ball = Self {
            pos: Vec2::ZERO,
            smooth_pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            radius: BALL_RADIUS,
            base_speed,
            speed_multiplier: 1.0,
            stuck: true,
        };
        ball.follow(paddle);
        ball.smooth_pos = ball.pos;
        ball
    }

    /// New free-moving ball heading along `angle` (radians, screen space)
    pub fn free(pos: Vec2, angle: f32, base_speed: f32) -> Self {
        Self {
            pos,
            smooth_pos: pos,
            vel: Vec2::from_angle(angle) * base_speed,
            radius: BALL_RADIUS,
            base_speed,
            speed_multiplier: 1.0,
            stuck: false,
        }
    }

    /// Current target speed (base scaled by active modifiers)
    pub fn speed(&self) -> f32 {
        self.base_speed * self.speed_multiplier
    }

    pub fn speed_multiplier(&self) -> f32 {
        self.speed_multiplier
    }

    pub fn smooth_pos(&self) -> Vec2 {
        self.smooth_pos
    }

    /// Heading in radians; stuck balls point straight up
    pub fn heading(&self) -> f32 {
        if self.stuck || self.vel.length_squared() == 0.0 {
            -std::f32::consts::FRAC_PI_2
        } else {
            self.vel.y.atan2(self.vel.x)
        }
    }

    /// Sit on the paddle's top center
    pub fn follow(&mut self, paddle: &Paddle) {
        if self.stuck {
            self.pos = Vec2::new(paddle.center_x(), paddle.pos.y - self.radius - 1.0);
        }
    }

    /// Release from the paddle, heading up and slightly right
    pub fn launch(&mut self) {
        if !self.stuck {
            return;
        }
        self.stuck = false;
        self.vel = Vec2::new(BALL_LAUNCH_ANGLE.sin(), -BALL_LAUNCH_ANGLE.cos()) * self.speed();
        self.smooth_pos = self.pos;
    }

    pub fn increase_speed(&mut self, factor: f32) {
        self.speed_multiplier = factor;
        self.rescale_velocity();
    }

    pub fn reset_speed(&mut self) {
        self.speed_multiplier = 1.0;
        self.rescale_velocity();
    }

    /// Set direction while keeping the ball at its current speed
    pub fn set_direction(&mut self, dir: Vec2) {
        self.vel = dir.normalize_or_zero() * self.speed();
    }

    /// Advance by velocity and bounce off the side and top walls
    pub fn update(&mut self, dt: f32) {
        if self.stuck {
            self.smooth_pos = self.pos;
            return;
        }

        self.pos += self.vel * dt;

        if self.pos.x - self.radius < 0.0 {
            self.pos.x = self.radius;
            self.vel.x = self.vel.x.abs();
        } else if self.pos.x + self.radius > PLAYFIELD_WIDTH {
            self.pos.x = PLAYFIELD_WIDTH - self.radius;
            self.vel.x = -self.vel.x.abs();
        }
        if self.pos.y - self.radius < 0.0 {
            self.pos.y = self.radius;
            self.vel.y = self.vel.y.abs();
        }

        let t = (dt * SMOOTHING_RATE).min(1.0);
        self.smooth_pos = self.smooth_pos.lerp(self.pos, t);
    }

    pub fn update_default(&mut self) {
        self.update(DEFAULT_DT);
    }

    /// Fell past the bottom of the playfield
    pub fn is_out_of_bounds(&self) -> bool {
        self.pos.y - self.radius > PLAYFIELD_HEIGHT
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_center_half(self.pos, Vec2::splat(self.radius))
    }

    fn rescale_velocity(&mut self) {
        if !self.stuck {
            let speed = self.speed();
            self.vel = self.vel.normalize_or_zero() * speed;
        }
    }
}

/// Brick types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BrickKind {
    #[default]
    Normal,
    /// Two hits; `damaged` records the first
    Hard { damaged: bool },
    /// Never destroyed; doesn't count for level completion
    Unbreakable,
}

impl BrickKind {
    pub fn hard() -> Self {
        BrickKind::Hard { damaged: false }
    }

    pub fn is_breakable(&self) -> bool {
        !matches!(self, BrickKind::Unbreakable)
    }

    /// Points awarded on destruction
    pub fn score(&self) -> u64 {
        match self {
            BrickKind::Normal => SCORE_PER_BRICK,
            BrickKind::Hard { .. } => SCORE_PER_BRICK * SCORE_MULTIPLIER_HARD,
            BrickKind::Unbreakable => 0,
        }
    }
}

/// A brick entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brick {
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
    pub kind: BrickKind,
    /// 0xRRGGBB
    pub color: u32,
    pub destroyed: bool,
    /// Hit flash intensity (0-1, decays over time)
    #[serde(default)]
    pub flash: f32,
}

impl Brick {
    pub fn new(pos: Vec2, size: Vec2, kind: BrickKind, color: u32) -> Self {
        Self {
            pos,
            size,
            kind,
            color,
            destroyed: false,
            flash: 0.0,
        }
    }

    /// Register a hit. Returns true only on the hit that destroys the brick.
    pub fn hit(&mut self) -> bool {
        if self.destroyed {
            return false;
        }
        match self.kind {
            BrickKind::Normal => {
                self.destroyed = true;
            }
            BrickKind::Hard { damaged: false } => {
                self.kind = BrickKind::Hard { damaged: true };
                self.flash = 1.0;
            }
            BrickKind::Hard { damaged: true } => {
                self.destroyed = true;
            }
            BrickKind::Unbreakable => {
                self.flash = 1.0;
            }
        }
        self.destroyed
    }

    /// Decay hit flash
    pub fn update(&mut self, dt: f32) {
        if self.flash > 0.0 {
            self.flash = (self.flash - dt * 4.0).max(0.0);
        }
    }

    pub fn score(&self) -> u64 {
        self.kind.score()
    }

    /// True if this brick must be destroyed to clear the level
    pub fn counts_for_clear(&self) -> bool {
        !self.destroyed && self.kind.is_breakable()
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size / 2.0
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_pos_size(self.pos, self.size)
    }
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    ExpandPaddle,
    ShrinkPaddle,
    SpeedUpBall,
    MultiBall,
    Bullet,
}

impl PowerUpKind {
    /// Whether collecting this kind registers a timed effect
    pub fn is_timed(&self) -> bool {
        !matches!(self, PowerUpKind::MultiBall)
    }
}

/// A falling power-up pickup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    /// Top-left corner
    pub pos: Vec2,
    pub vel: Vec2,
    pub kind: PowerUpKind,
    collected: bool,
    /// Seconds of effect this pickup grants; seeds the active-effect
    /// registry on collection, which owns the countdown from then on
    duration: f32,
}

impl PowerUp {
    /// Spawn centered on `center`, falling
    pub fn new(center: Vec2, kind: PowerUpKind, duration: f32) -> Self {
        Self {
            pos: center - Vec2::splat(POWERUP_SIZE / 2.0),
            vel: Vec2::new(0.0, POWERUP_FALL_SPEED),
            kind,
            collected: false,
            duration,
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.pos += self.vel * dt;
    }

    pub fn update_default(&mut self) {
        self.update(DEFAULT_DT);
    }

    pub fn collect(&mut self) {
        self.collected = true;
    }

    pub fn is_collected(&self) -> bool {
        self.collected
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn is_out_of_bounds(&self) -> bool {
        self.pos.y > PLAYFIELD_HEIGHT
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_pos_size(self.pos, Vec2::splat(POWERUP_SIZE))
    }
}

/// Upward projectile fired while the bullet effect is active
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    /// Top-left corner
    pub pos: Vec2,
    pub vel: Vec2,
}

impl Bullet {
    /// Spawn centered horizontally on `x`, bottom edge resting at `bottom`
    pub fn new(x: f32, bottom: f32) -> Self {
        Self {
            pos: Vec2::new(x - BULLET_WIDTH / 2.0, bottom - BULLET_HEIGHT),
            vel: Vec2::new(0.0, -BULLET_SPEED),
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.pos += self.vel * dt;
    }

    pub fn update_default(&mut self) {
        self.update(DEFAULT_DT);
    }

    pub fn is_out_of_bounds(&self) -> bool {
        self.pos.y + BULLET_HEIGHT < 0.0 || self.pos.y > PLAYFIELD_HEIGHT
    }

    pub fn center_x(&self) -> f32 {
        self.pos.x + BULLET_WIDTH / 2.0
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_pos_size(self.pos, Vec2::new(BULLET_WIDTH, BULLET_HEIGHT))
    }
}
