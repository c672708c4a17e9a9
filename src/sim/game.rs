//! Game orchestrator and state machine
//!
//! [`Game`] owns every entity, the level catalog, the score tracker and the
//! services handed in by the host (audio, the stage-music timer). Hosts drive
//! it with commands (`start_game`, `pause_game`, ...) and one `update` call
//! per frame, then read entities back through the accessors for drawing.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::level::{Level, LevelCatalog};
use super::power_up::ActiveEffects;
use super::score::ScoreTracker;
use super::state::{Ball, Brick, Bullet, GameEvent, GamePhase, Paddle, PowerUp, PowerUpKind};
use crate::audio::{AudioSink, Cue};
use crate::highscores::HighScoreStore;
use crate::timer::{DelayedTaskScheduler, TaskHandle};
use crate::tuning::{ExpiryClock, Tuning};

pub struct Game {
    pub(super) phase: GamePhase,
    pub(super) tuning: Tuning,
    pub(super) paddle: Paddle,
    pub(super) balls: Vec<Ball>,
    pub(super) bricks: Vec<Brick>,
    pub(super) power_ups: Vec<PowerUp>,
    pub(super) bullets: Vec<Bullet>,
    pub(super) effects: ActiveEffects,
    /// Time banked toward the next bullet
    pub(super) bullet_accumulator: f32,
    pub(super) score: ScoreTracker,
    pub(super) levels: LevelCatalog,
    pub(super) rng: Pcg32,
    /// Seconds simulated while PLAYING
    pub(super) sim_time: f64,
    epoch: Instant,
    pub(super) audio: Arc<dyn AudioSink>,
    scheduler: DelayedTaskScheduler,
    stage_task: Option<TaskHandle>,
    pub(super) events: Vec<GameEvent>,
}

impl Game {
    /// Create a game sitting in the menu
    pub fn new(tuning: Tuning, levels: LevelCatalog, audio: Arc<dyn AudioSink>, seed: u64) -> Self {
        let mut game = Self {
            phase: GamePhase::Menu,
            tuning,
            paddle: Paddle::new(),
            balls: Vec::new(),
            bricks: Vec::new(),
            power_ups: Vec::new(),
            bullets: Vec::new(),
            effects: ActiveEffects::new(),
            bullet_accumulator: 0.0,
            score: ScoreTracker::default(),
            levels,
            rng: Pcg32::seed_from_u64(seed),
            sim_time: 0.0,
            epoch: Instant::now(),
            audio,
            scheduler: DelayedTaskScheduler::new(),
            stage_task: None,
            events: Vec::new(),
        };
        game.load_level_entities();
        log::info!("Game ready with {} levels", game.levels.len());
        game
    }

    /// Game over the levels shipped with the crate
    pub fn with_builtin_levels(tuning: Tuning, audio: Arc<dyn AudioSink>, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let levels = LevelCatalog::builtin(&mut rng);
        Self::new(tuning, levels, audio, seed)
    }

    // === Commands ===

    /// MENU -> PLAYING from the first level with a fresh score
    pub fn start_game(&mut self) {
        self.cancel_stage_task();
        self.score.reset();
        self.levels.restart_game();
        self.paddle.reset();
        self.load_level_entities();
        self.phase = GamePhase::Playing;

        self.stop_all_audio();
        self.begin_stage_music();
        log::info!("Game started at level 1");
    }

    /// Toggle PLAYING <-> PAUSED; ignored in other phases
    pub fn pause_game(&mut self) {
        self.phase = match self.phase {
            GamePhase::Playing => GamePhase::Paused,
            GamePhase::Paused => GamePhase::Playing,
            other => other,
        };
    }

    /// Release every ball still stuck to the paddle
    pub fn launch_ball(&mut self) {
        if self.phase != GamePhase::Playing {
            return;
        }
        for ball in self.balls.iter_mut().filter(|b| b.stuck) {
            ball.launch();
        }
    }

    pub fn set_moving_left(&mut self, moving: bool) {
        self.paddle.set_moving_left(moving);
    }

    pub fn set_moving_right(&mut self, moving: bool) {
        self.paddle.set_moving_right(moving);
    }

    /// Advance to the next level.
    ///
    /// Returns false when the catalog is exhausted; the run then ends in
    /// GAME_OVER with the title cue and the level counter stays put.
    pub fn next_level(&mut self) -> bool {
        if !self.levels.next_level() {
            log::info!("All levels cleared");
            self.enter_game_over(Cue::Title);
            return false;
        }

        self.score.next_level();
        self.load_level_entities();
        self.phase = GamePhase::Playing;
        self.begin_stage_music();
        log::info!("Advanced to level {}", self.score.level());
        true
    }

    /// Start a new run at an unlocked level. Unknown or locked indices are ignored.
    pub fn select_level(&mut self, index: usize) -> bool {
        if !self.levels.select_level(index) {
            log::debug!("Ignoring selection of level index {index}");
            return false;
        }

        self.cleanup();
        self.score.reset();
        self.score.set_level(index as u32 + 1);
        self.paddle.reset();
        self.load_level_entities();
        self.phase = GamePhase::Playing;
        self.begin_stage_music();
        log::info!("Selected level {}", index + 1);
        true
    }

    /// Any -> MENU with full cleanup and the title music
    pub fn return_to_menu(&mut self) {
        self.cleanup();
        self.phase = GamePhase::Menu;
        self.stop_all_audio();
        self.audio.play(Cue::Title);
    }

    /// Force a phase, with the side effects that phase requires
    pub fn set_current_state(&mut self, phase: GamePhase) {
        if phase == GamePhase::Menu && self.phase != GamePhase::Menu {
            self.cleanup();
        }
        if phase == GamePhase::GameOver {
            self.cancel_stage_task();
            if let Err(e) = self.audio.stop_background_alternating() {
                log::warn!("Error stopping background music: {e}");
            }
        }
        self.phase = phase;
    }

    /// Drop all transient entities and effects and silence audio
    pub fn cleanup(&mut self) {
        self.cancel_stage_task();
        self.balls.clear();
        self.bricks.clear();
        self.power_ups.clear();
        self.bullets.clear();
        self.effects.clear();
        self.bullet_accumulator = 0.0;
        self.stop_all_audio();
    }

    /// Restore the current level's original layout, paddle and ball
    pub fn reset_level(&mut self) {
        self.load_level_entities();
    }

    /// Stop the timer thread. Waits at most `Tuning::shutdown_timeout`.
    pub fn shutdown(&mut self) {
        self.cancel_stage_task();
        let timeout =
            Duration::try_from_secs_f32(self.tuning.shutdown_timeout.max(0.0)).unwrap_or_default();
        self.scheduler.shutdown(timeout);
    }

    /// Seed the best score from the persisted board
    pub fn set_high_score(&mut self, best: u64) {
        self.score.set_high_score(best);
    }

    /// Record the final score. Only valid in GAME_OVER.
    pub fn submit_high_score(&self, store: &mut dyn HighScoreStore, name: &str) -> Option<usize> {
        if self.phase != GamePhase::GameOver {
            return None;
        }
        store.submit(name, self.score.score())
    }

    /// Events produced since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn unlock_all_levels(&mut self) {
        self.levels.unlock_all();
    }

    // === Accessors ===

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn paddle(&self) -> &Paddle {
        &self.paddle
    }

    pub fn balls(&self) -> &[Ball] {
        &self.balls
    }

    pub fn bricks(&self) -> &[Brick] {
        &self.bricks
    }

    pub fn power_ups(&self) -> &[PowerUp] {
        &self.power_ups
    }

    pub fn bullets(&self) -> &[Bullet] {
        &self.bullets
    }

    pub fn score(&self) -> &ScoreTracker {
        &self.score
    }

    pub fn levels(&self) -> &LevelCatalog {
        &self.levels
    }

    pub fn current_level(&self) -> &Level {
        self.levels.current()
    }

    pub fn active_effects(&self) -> &ActiveEffects {
        &self.effects
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Seconds simulated while PLAYING
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    /// Current reading of the clock effects expire against
    pub fn effect_now(&self) -> f64 {
        match self.tuning.expiry_clock {
            ExpiryClock::Simulation => self.sim_time,
            ExpiryClock::WallClock => self.epoch.elapsed().as_secs_f64(),
        }
    }

    /// Current level's ball speed after tuning
    pub fn nominal_ball_speed(&self) -> f32 {
        self.levels.current().ball_speed * self.tuning.ball_speed_scale
    }

    pub fn is_level_complete(&self) -> bool {
        self.levels.current().is_completed(&self.bricks)
    }

    // === Internals ===

    /// Entities for the current level: layout, centered paddle, one stuck ball
    fn load_level_entities(&mut self) {
        let level = self.levels.current();
        self.bricks = level.bricks();
        self.score.set_lives(level.initial_lives);

        self.paddle.reset();
        self.power_ups.clear();
        self.bullets.clear();
        self.effects.clear();
        self.bullet_accumulator = 0.0;
        self.reset_ball();
    }

    /// Replace all balls with one stuck to the paddle center, carrying any
    /// active speed-up
    pub(super) fn reset_ball(&mut self) {
        let mut ball = Ball::on_paddle(&self.paddle, self.nominal_ball_speed());
        if self
            .effects
            .is_active(PowerUpKind::SpeedUpBall, self.effect_now())
        {
            ball.increase_speed(self.tuning.speed_up_factor);
        }
        self.balls.clear();
        self.balls.push(ball);
    }

    /// End the run: cancel pending music, play `cue`, fold in the high score
    pub(super) fn enter_game_over(&mut self, cue: Cue) {
        self.cancel_stage_task();
        self.stop_all_audio();
        self.audio.play(cue);

        let new_high_score = self.score.commit_high_score();
        self.events.push(GameEvent::GameOver {
            score: self.score.score(),
            new_high_score,
        });
        self.phase = GamePhase::GameOver;
        log::info!(
            "Game over: score {} (best {})",
            self.score.score(),
            self.score.high_score()
        );
    }

    /// Intro sting now, background loop after the configured delay
    fn begin_stage_music(&mut self) {
        self.cancel_stage_task();
        self.audio.play(Cue::StageStart);

        let audio = Arc::clone(&self.audio);
        let delay = Duration::try_from_secs_f32(self.tuning.stage_music_delay.max(0.0))
            .unwrap_or_default();
        self.stage_task = Some(self.scheduler.schedule(delay, move || {
            audio.stop(Cue::StageStart);
            audio.start_background_alternating();
            audio.play(Cue::Ambient);
        }));
    }

    fn cancel_stage_task(&mut self) {
        if let Some(task) = self.stage_task.take() {
            task.cancel();
        }
    }

    fn stop_all_audio(&self) {
        if let Err(e) = self.audio.stop_all() {
            log::warn!("Error stopping sounds: {e}");
        }
    }

    #[cfg(test)]
    pub(super) fn stage_task(&self) -> Option<&TaskHandle> {
        self.stage_task.as_ref()
    }
}
