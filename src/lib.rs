//! Brickfall - brick-breaker simulation core
//!
//! Core modules:
//! - `sim`: Simulation (entities, collisions, power-ups, levels, state machine)
//! - `audio`: Audio collaborator contract and cue names
//! - `timer`: Single-thread scheduler for the delayed stage-music task
//! - `highscores`: Ranked top-N score store
//! - `tuning`: Data-driven game balance
//! - `settings`: Player preferences and difficulty presets

pub mod audio;
pub mod highscores;
pub mod settings;
pub mod sim;
pub mod timer;
pub mod tuning;

pub use audio::{AudioSink, Cue, CueChannel};
pub use highscores::{HighScoreStore, HighScores};
pub use settings::{Difficulty, Settings};
pub use sim::{Game, GamePhase};
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Nominal step used by zero-argument `update_default` callers
    pub const DEFAULT_DT: f32 = 1.0 / 60.0;

    /// Playfield dimensions (origin top-left, +y down)
    pub const PLAYFIELD_WIDTH: f32 = 800.0;
    pub const PLAYFIELD_HEIGHT: f32 = 600.0;

    /// Paddle defaults
    pub const PADDLE_WIDTH: f32 = 200.0;
    pub const PADDLE_HEIGHT: f32 = 15.0;
    pub const PADDLE_Y: f32 = 550.0;
    pub const PADDLE_SPEED: f32 = 420.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 8.0;
    pub const BALL_SPEED: f32 = 300.0;
    /// Launch angle off vertical (radians, ~30 degrees)
    pub const BALL_LAUNCH_ANGLE: f32 = 0.523_598_8;
    /// Maximum paddle deflection off vertical (radians, ~60 degrees)
    pub const PADDLE_MAX_BOUNCE: f32 = 1.047_197_6;

    /// Brick grid
    pub const BRICK_WIDTH: f32 = 75.0;
    pub const BRICK_HEIGHT: f32 = 20.0;
    pub const BRICK_ROWS: usize = 8;
    pub const BRICK_COLS: usize = 10;
    pub const BRICK_PADDING: f32 = 5.0;
    pub const BRICK_OFFSET_X: f32 = 10.0;
    pub const BRICK_OFFSET_Y: f32 = 50.0;

    /// Row colors (0xRRGGBB): red, orange, yellow, green, cyan, blue, purple, pink
    pub const BRICK_COLORS: [u32; 8] = [
        0xFF0000, 0xFFA500, 0xFFFF00, 0x008000, 0x00FFFF, 0x0000FF, 0x800080, 0xFFC0CB,
    ];

    /// Power-up pickups
    pub const POWERUP_SIZE: f32 = 20.0;
    pub const POWERUP_FALL_SPEED: f32 = 120.0;

    /// Bullets
    pub const BULLET_WIDTH: f32 = 24.0;
    pub const BULLET_HEIGHT: f32 = 48.0;
    pub const BULLET_SPEED: f32 = 540.0;

    /// Scoring
    pub const SCORE_PER_BRICK: u64 = 10;
    pub const SCORE_MULTIPLIER_HARD: u64 = 2;

    pub const INITIAL_LIVES: u32 = 3;
}
