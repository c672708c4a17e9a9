//! Simulation module
//!
//! All gameplay logic lives here:
//! - Variable timestep, clamped per frame
//! - Seeded RNG only (power-up rolls, generated levels)
//! - Stable iteration order (collection order)
//! - No rendering or platform dependencies

pub mod collision;
pub mod game;
pub mod level;
pub mod power_up;
pub mod score;
pub mod state;
pub mod tick;

pub use collision::{
    Aabb, Contact, aabb_contact, check_ball_brick_collision, check_ball_paddle_collision,
    find_bullet_hit, reflect_velocity,
};
pub use game::Game;
pub use level::{JsonLevelSource, Level, LevelCatalog, LevelError, LevelFile, LevelSource};
pub use power_up::{ActiveEffects, fan_out, kind_for_roll, roll_kind, roll_spawn};
pub use score::ScoreTracker;
pub use state::{
    Ball, Brick, BrickKind, Bullet, GameEvent, GamePhase, Paddle, PowerUp, PowerUpKind,
};
pub use tick::clamp_dt;
