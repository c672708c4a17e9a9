//! Brickfall headless demo
//!
//! Runs the simulation with an autopilot paddle until the run ends, logging
//! audio cues and printing the resulting high score board.
//!
//! Usage: `brickfall [settings.json] [tuning.json]`

use std::sync::Arc;

use brickfall::audio::LogAudio;
use brickfall::consts::DEFAULT_DT;
use brickfall::sim::GameEvent;
use brickfall::{Game, GamePhase, HighScoreStore, HighScores, Settings, Tuning};

/// Give up after this many simulated frames (ten minutes at 60 Hz)
const MAX_FRAMES: u32 = 60 * 60 * 10;

/// How far ahead of the ball the autopilot aims (seconds of travel)
const LEAD_TIME: f32 = 0.05;

fn read_arg(index: usize) -> Option<String> {
    let path = std::env::args().nth(index)?;
    match std::fs::read_to_string(&path) {
        Ok(text) => Some(text),
        Err(e) => {
            log::warn!("Could not read {path}: {e}");
            None
        }
    }
}

/// Steer the paddle under the lowest descending ball and launch when stuck
fn autopilot(game: &mut Game, frame: u32) {
    if game.balls().iter().any(|b| b.stuck) {
        game.launch_ball();
    }

    let paddle_x = game.paddle().center_x();
    let target = game
        .balls()
        .iter()
        .filter(|b| !b.stuck && b.vel.y > 0.0)
        .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y))
        .map(|ball| ball.pos.x + ball.vel.x * LEAD_TIME)
        .unwrap_or(paddle_x);

    // Small oscillating offset so rallies don't loop forever
    let wobble = (frame as f32 * 0.02).sin() * game.paddle().width * 0.2;
    let error = target + wobble - paddle_x;
    game.set_moving_left(error < -4.0);
    game.set_moving_right(error > 4.0);
}

fn main() {
    env_logger::init();
    log::info!("Brickfall (headless) starting...");

    let settings = Settings::load_or_default(read_arg(1).as_deref());
    let base = match read_arg(2).map(|json| Tuning::from_json(&json)) {
        Some(Ok(tuning)) => tuning,
        Some(Err(e)) => {
            log::warn!("Invalid tuning ({e}); using defaults");
            Tuning::default()
        }
        None => Tuning::default(),
    };
    let tuning = settings.tuning(&base);

    let audio = Arc::new(LogAudio::from_settings(&settings));
    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let mut scores = HighScores::new();
    let mut game = Game::with_builtin_levels(tuning, audio, seed);
    if settings.unlock_all_levels {
        game.unlock_all_levels();
    }
    if let Some(best) = scores.best() {
        game.set_high_score(best);
    }

    game.start_game();
    for frame in 0..MAX_FRAMES {
        match game.phase() {
            GamePhase::Playing => {
                autopilot(&mut game, frame);
                game.update(DEFAULT_DT);
            }
            GamePhase::LevelComplete => {
                game.next_level();
            }
            GamePhase::GameOver => break,
            GamePhase::Menu | GamePhase::Paused => break,
        }

        for event in game.drain_events() {
            match event {
                GameEvent::LifeLost { lives } => log::info!("Life lost, {lives} left"),
                GameEvent::PowerUpCollected { kind } => log::info!("Caught {kind:?}"),
                GameEvent::LevelComplete { level } => log::info!("Cleared level {level}"),
                _ => {}
            }
        }
    }

    if game.phase() != GamePhase::GameOver {
        log::info!("Frame limit reached, ending run");
        game.set_current_state(GamePhase::GameOver);
    }

    let final_score = game.score().score();
    match game.submit_high_score(&mut scores, "Autopilot") {
        Some(rank) => println!("Final score {final_score} (rank {rank})"),
        None => println!("Final score {final_score}"),
    }
    match scores.to_json() {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("Could not serialize high scores: {e}"),
    }

    game.shutdown();
}
