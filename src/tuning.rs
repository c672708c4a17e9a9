//! Data-driven game balance
//!
//! Every knob has a default; JSON overrides only need the fields they change.

use serde::{Deserialize, Serialize};

/// Which clock timed power-ups expire against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExpiryClock {
    /// Simulated time spent in PLAYING; pausing freezes effects
    #[default]
    Simulation,
    /// Real elapsed time; effects keep running while paused
    WallClock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Largest step `update` will simulate (seconds)
    pub max_frame_dt: f32,
    /// Multiplier applied to every level's ball speed
    pub ball_speed_scale: f32,
    /// Percent chance a destroyed brick drops a power-up
    pub powerup_spawn_chance: u32,
    /// Lifetime of timed effects (seconds)
    pub powerup_duration: f32,
    /// Bonus for catching a power-up
    pub powerup_score: u64,
    pub expiry_clock: ExpiryClock,
    pub paddle_expand_factor: f32,
    pub paddle_shrink_factor: f32,
    pub speed_up_factor: f32,
    /// Half-angle of the multi-ball fan (degrees)
    pub multi_ball_spread_deg: f32,
    /// Seconds between bullets while the bullet effect is active
    pub bullet_interval: f32,
    /// Delay before the stage intro hands over to background music (seconds)
    pub stage_music_delay: f32,
    /// How long shutdown waits for the timer thread (seconds)
    pub shutdown_timeout: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            max_frame_dt: 0.05,
            ball_speed_scale: 1.0,
            powerup_spawn_chance: 40,
            powerup_duration: 10.0,
            powerup_score: 50,
            expiry_clock: ExpiryClock::Simulation,
            paddle_expand_factor: 1.5,
            paddle_shrink_factor: 0.6,
            speed_up_factor: 1.3,
            multi_ball_spread_deg: 20.0,
            bullet_interval: 0.6,
            stage_music_delay: 5.0,
            shutdown_timeout: 2.0,
        }
    }
}

impl Tuning {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
