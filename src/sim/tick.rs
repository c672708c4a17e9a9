//! Per-frame simulation step
//!
//! Order within a frame: paddle and brick timers, balls (movement, loss,
//! collisions), falling power-ups, effect expiry, bullets, then the level
//! completion check.

use super::collision;
use super::game::Game;
use super::power_up;
use super::state::{Ball, Bullet, GameEvent, GamePhase, PowerUp, PowerUpKind};
use crate::audio::Cue;

/// Shortest bullet interval honored, keeps a bad config from flooding the field
const MIN_BULLET_INTERVAL: f32 = 0.05;

/// Clamp a host frame time into something safe to simulate
pub fn clamp_dt(dt: f32, max_dt: f32) -> f32 {
    if !dt.is_finite() {
        return 0.0;
    }
    dt.max(0.0).min(max_dt.max(0.0))
}

impl Game {
    /// Advance the simulation by `dt` seconds. Does nothing outside PLAYING.
    pub fn update(&mut self, dt: f32) {
        if self.phase != GamePhase::Playing {
            return;
        }

        let dt = clamp_dt(dt, self.tuning.max_frame_dt);
        self.sim_time += f64::from(dt);

        self.paddle.update(dt);
        for brick in &mut self.bricks {
            brick.update(dt);
        }

        if self.update_balls(dt) {
            return;
        }
        self.update_power_ups(dt);
        self.expire_effects();
        self.update_bullets(dt);

        if self.is_level_complete() {
            self.phase = GamePhase::LevelComplete;
            self.events.push(GameEvent::LevelComplete {
                level: self.score.level(),
            });
            log::info!("Level {} complete", self.score.level());
        }
    }

    /// Returns true when the run ended this frame
    fn update_balls(&mut self, dt: f32) -> bool {
        let mut i = 0;
        while i < self.balls.len() {
            let ball = &mut self.balls[i];
            ball.follow(&self.paddle);
            ball.update(dt);
            let stuck = ball.stuck;

            if ball.is_out_of_bounds() {
                self.balls.remove(i);
                self.events.push(GameEvent::BallLost {
                    remaining: self.balls.len(),
                });
                if self.balls.is_empty() {
                    if self.on_last_ball_lost() {
                        return true;
                    }
                    // The replacement ball waits on the paddle until next frame
                    break;
                }
                continue;
            }

            if !stuck {
                self.resolve_ball_collisions(i);
            }
            i += 1;
        }
        false
    }

    /// Spend a life; returns true if that was the last one
    fn on_last_ball_lost(&mut self) -> bool {
        let game_over = self.score.lose_life();
        self.events.push(GameEvent::LifeLost {
            lives: self.score.lives(),
        });

        if game_over {
            self.enter_game_over(Cue::GameOver);
            return true;
        }

        log::debug!("Life lost, {} remaining", self.score.lives());
        self.reset_ball();
        false
    }

    fn resolve_ball_collisions(&mut self, index: usize) {
        let ball = &mut self.balls[index];
        collision::check_ball_paddle_collision(ball, &self.paddle);

        let Some(hit) = collision::check_ball_brick_collision(ball, &self.bricks) else {
            return;
        };
        if self.bricks[hit].hit() {
            self.destroy_brick(hit, true);
        }
    }

    /// Remove a broken brick, award its points and maybe drop a power-up
    fn destroy_brick(&mut self, index: usize, can_drop: bool) {
        let brick = self.bricks.remove(index);
        let points = brick.score();
        self.score.add_score(points);
        self.audio.play(Cue::Brick);
        self.audio.play(Cue::Score);
        self.events.push(GameEvent::BrickDestroyed {
            center: brick.center(),
            kind: brick.kind,
            points,
        });

        if !can_drop {
            return;
        }
        if let Some(kind) = power_up::roll_spawn(&mut self.rng, self.tuning.powerup_spawn_chance) {
            let center = brick.center();
            self.power_ups
                .push(PowerUp::new(center, kind, self.tuning.powerup_duration));
            self.events.push(GameEvent::PowerUpSpawned { kind, center });
        }
    }

    fn update_power_ups(&mut self, dt: f32) {
        let paddle_box = self.paddle.bounds();

        // Collect pickups to apply (deferred to avoid borrow issues)
        let mut collected: Vec<(PowerUpKind, f32)> = Vec::new();
        self.power_ups.retain_mut(|power_up| {
            power_up.update(dt);
            if power_up.is_out_of_bounds() {
                return false;
            }
            if !power_up.is_collected() && power_up.bounds().intersects(&paddle_box) {
                power_up.collect();
                collected.push((power_up.kind, power_up.duration()));
                return false;
            }
            true
        });

        for (kind, duration) in collected {
            self.score.add_score(self.tuning.powerup_score);
            self.apply_power_up_for(kind, duration);
            self.events.push(GameEvent::PowerUpCollected { kind });
        }
    }

    /// Apply `kind` with the configured effect duration
    pub(super) fn apply_power_up(&mut self, kind: PowerUpKind) {
        self.apply_power_up_for(kind, self.tuning.powerup_duration);
    }

    fn apply_power_up_for(&mut self, kind: PowerUpKind, duration: f32) {
        log::debug!("Power-up collected: {kind:?}");

        match kind {
            PowerUpKind::ExpandPaddle => {
                if self.effects.remove(PowerUpKind::ShrinkPaddle) {
                    self.paddle.reset_size();
                }
                self.paddle.expand(self.tuning.paddle_expand_factor);
            }
            PowerUpKind::ShrinkPaddle => {
                if self.effects.remove(PowerUpKind::ExpandPaddle) {
                    self.paddle.reset_size();
                }
                self.paddle.shrink(self.tuning.paddle_shrink_factor);
            }
            PowerUpKind::SpeedUpBall => {
                for ball in &mut self.balls {
                    ball.increase_speed(self.tuning.speed_up_factor);
                }
            }
            PowerUpKind::MultiBall => self.spawn_multi_ball(),
            PowerUpKind::Bullet => {}
        }

        if kind.is_timed() {
            let now = self.effect_now();
            self.effects.activate(kind, now, f64::from(duration));
        }
    }

    /// Two extra balls per existing ball, fanned around its heading
    fn spawn_multi_ball(&mut self) {
        let speed = self.nominal_ball_speed();
        let spread = self.tuning.multi_ball_spread_deg.to_radians();
        let extra: Vec<Ball> = self
            .balls
            .iter()
            .flat_map(|ball| power_up::fan_out(ball, speed, spread))
            .collect();
        self.balls.extend(extra);
    }

    fn expire_effects(&mut self) {
        let now = self.effect_now();
        for kind in self.effects.sweep(now) {
            match kind {
                PowerUpKind::ExpandPaddle | PowerUpKind::ShrinkPaddle => self.paddle.reset_size(),
                PowerUpKind::SpeedUpBall => {
                    for ball in &mut self.balls {
                        ball.reset_speed();
                    }
                }
                PowerUpKind::MultiBall | PowerUpKind::Bullet => {}
            }
            log::debug!("Power-up expired: {kind:?}");
            self.events.push(GameEvent::PowerUpExpired { kind });
        }
    }

    fn update_bullets(&mut self, dt: f32) {
        if self.effects.is_active(PowerUpKind::Bullet, self.effect_now()) {
            let interval = self.tuning.bullet_interval.max(MIN_BULLET_INTERVAL);
            self.bullet_accumulator += dt;
            while self.bullet_accumulator >= interval {
                self.bullet_accumulator -= interval;
                self.bullets
                    .push(Bullet::new(self.paddle.center_x(), self.paddle.pos.y));
            }
        } else {
            self.bullet_accumulator = 0.0;
        }

        let mut i = 0;
        while i < self.bullets.len() {
            self.bullets[i].update(dt);
            if self.bullets[i].is_out_of_bounds() {
                self.bullets.remove(i);
                continue;
            }

            if let Some(hit) = collision::find_bullet_hit(&self.bullets[i], &self.bricks) {
                self.bullets.remove(i);
                // Unbreakable bricks just absorb the bullet
                if self.bricks[hit].kind.is_breakable() && self.bricks[hit].hit() {
                    self.destroy_brick(hit, false);
                }
                continue;
            }
            i += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::Vec2;

    use super::*;
    use crate::audio::CueRecorder;
    use crate::consts::*;
    use crate::sim::state::{Brick, BrickKind};
    use crate::tuning::{ExpiryClock, Tuning};

    fn playing_game(tuning: Tuning) -> (Game, Arc<CueRecorder>) {
        let audio = Arc::new(CueRecorder::new());
        let mut game = Game::with_builtin_levels(tuning, Arc::clone(&audio) as _, 12345);
        game.start_game();
        (game, audio)
    }

    fn brick_at(x: f32, y: f32, kind: BrickKind) -> Brick {
        Brick::new(
            Vec2::new(x, y),
            Vec2::new(BRICK_WIDTH, BRICK_HEIGHT),
            kind,
            BRICK_COLORS[0],
        )
    }

    #[test]
    fn test_clamp_dt() {
        assert_eq!(clamp_dt(f32::NAN, 0.05), 0.0);
        assert_eq!(clamp_dt(f32::INFINITY, 0.05), 0.0);
        assert_eq!(clamp_dt(-1.0, 0.05), 0.0);
        assert_eq!(clamp_dt(0.5, 0.05), 0.05);
        assert_eq!(clamp_dt(0.01, 0.05), 0.01);
    }

    #[test]
    fn test_update_ignored_unless_playing() {
        let (mut game, _) = playing_game(Tuning::default());
        game.launch_ball();
        game.pause_game();
        let before = game.balls()[0].pos;
        let time = game.sim_time();
        for _ in 0..30 {
            game.update(DEFAULT_DT);
        }
        assert_eq!(game.balls()[0].pos, before);
        assert_eq!(game.sim_time(), time);
        game.shutdown();
    }

    #[test]
    fn test_multi_ball_fans_out() {
        let (mut game, _) = playing_game(Tuning::default());
        let source = game.balls()[0].pos;
        game.apply_power_up(PowerUpKind::MultiBall);

        assert_eq!(game.balls().len(), 3);
        let up = -std::f32::consts::FRAC_PI_2;
        let spread = 20f32.to_radians();
        let mut headings: Vec<f32> = game.balls()[1..].iter().map(Ball::heading).collect();
        headings.sort_by(f32::total_cmp);
        assert!((headings[0] - (up - spread)).abs() < 1e-4);
        assert!((headings[1] - (up + spread)).abs() < 1e-4);
        for ball in &game.balls()[1..] {
            assert_eq!(ball.pos, source);
            assert!(!ball.stuck);
        }
        assert!(game.active_effects().is_empty());
        game.shutdown();
    }

    #[test]
    fn test_expand_reverts_after_duration() {
        let tuning = Tuning {
            powerup_duration: 1.0,
            ..Tuning::default()
        };
        let (mut game, _) = playing_game(tuning);
        game.apply_power_up(PowerUpKind::ExpandPaddle);
        let expanded = PADDLE_WIDTH * 1.5;
        assert!((game.paddle().width - expanded).abs() < 1e-3);

        for _ in 0..19 {
            game.update(0.05);
        }
        assert!((game.paddle().width - expanded).abs() < 1e-3);
        assert!(
            game.active_effects()
                .is_active(PowerUpKind::ExpandPaddle, game.effect_now())
        );

        // Pausing freezes the simulation clock
        game.pause_game();
        for _ in 0..100 {
            game.update(0.05);
        }
        game.pause_game();
        assert!((game.paddle().width - expanded).abs() < 1e-3);

        for _ in 0..2 {
            game.update(0.05);
        }
        assert_eq!(game.paddle().width, PADDLE_WIDTH);
        assert!(game.active_effects().is_empty());
        assert!(
            game.drain_events()
                .contains(&GameEvent::PowerUpExpired {
                    kind: PowerUpKind::ExpandPaddle
                })
        );
        game.shutdown();
    }

    #[test]
    fn test_expand_and_shrink_exclusive() {
        let (mut game, _) = playing_game(Tuning::default());
        game.apply_power_up(PowerUpKind::ShrinkPaddle);
        game.apply_power_up(PowerUpKind::ExpandPaddle);
        assert!((game.paddle().width - PADDLE_WIDTH * 1.5).abs() < 1e-3);
        assert_eq!(game.active_effects().len(), 1);
        assert!(game.active_effects().expiry(PowerUpKind::ShrinkPaddle).is_none());
        game.shutdown();
    }

    #[test]
    fn test_speed_up_reverts() {
        let tuning = Tuning {
            powerup_duration: 0.1,
            ..Tuning::default()
        };
        let (mut game, _) = playing_game(tuning);
        game.apply_power_up(PowerUpKind::SpeedUpBall);
        assert!((game.balls()[0].speed_multiplier() - 1.3).abs() < 1e-6);
        for _ in 0..3 {
            game.update(0.05);
        }
        assert_eq!(game.balls()[0].speed_multiplier(), 1.0);
        game.shutdown();
    }

    #[test]
    fn test_last_ball_lost_ends_game() {
        let (mut game, audio) = playing_game(Tuning::default());
        game.score.set_lives(1);
        game.balls[0] = Ball::free(
            Vec2::new(400.0, PLAYFIELD_HEIGHT + 20.0),
            std::f32::consts::FRAC_PI_2,
            300.0,
        );
        game.update(DEFAULT_DT);

        assert_eq!(game.phase(), GamePhase::GameOver);
        assert_eq!(game.score().lives(), 0);
        assert_eq!(audio.played().last(), Some(&Cue::GameOver));
        game.shutdown();
    }

    #[test]
    fn test_last_ball_lost_resets_ball() {
        let (mut game, _) = playing_game(Tuning::default());
        let lives = game.score().lives();
        game.balls[0] = Ball::free(
            Vec2::new(100.0, PLAYFIELD_HEIGHT + 20.0),
            std::f32::consts::FRAC_PI_2,
            300.0,
        );
        game.update(DEFAULT_DT);

        assert_eq!(game.phase(), GamePhase::Playing);
        assert_eq!(game.score().lives(), lives - 1);
        assert_eq!(game.balls().len(), 1);
        let ball = &game.balls()[0];
        assert!(ball.stuck);
        assert!((ball.pos.x - game.paddle().center_x()).abs() < 1e-3);
        game.shutdown();
    }

    #[test]
    fn test_losing_one_of_many_balls_keeps_lives() {
        let (mut game, _) = playing_game(Tuning::default());
        let lives = game.score().lives();
        game.balls.push(Ball::free(
            Vec2::new(100.0, PLAYFIELD_HEIGHT + 20.0),
            std::f32::consts::FRAC_PI_2,
            300.0,
        ));
        game.update(DEFAULT_DT);
        assert_eq!(game.balls().len(), 1);
        assert_eq!(game.score().lives(), lives);
        game.shutdown();
    }

    #[test]
    fn test_only_unbreakable_left_completes_level() {
        let (mut game, _) = playing_game(Tuning::default());
        game.bricks = vec![brick_at(10.0, 50.0, BrickKind::Unbreakable)];
        game.update(DEFAULT_DT);
        assert_eq!(game.phase(), GamePhase::LevelComplete);
        assert!(
            game.drain_events()
                .contains(&GameEvent::LevelComplete { level: 1 })
        );
        game.shutdown();
    }

    #[test]
    fn test_ball_destroys_brick() {
        let tuning = Tuning {
            powerup_spawn_chance: 0,
            ..Tuning::default()
        };
        let (mut game, audio) = playing_game(tuning);
        game.bricks = vec![
            brick_at(360.0, 200.0, BrickKind::Normal),
            brick_at(10.0, 50.0, BrickKind::Normal),
        ];
        game.balls[0] = Ball::free(Vec2::new(397.0, 230.0), -std::f32::consts::FRAC_PI_2, 300.0);
        audio.clear();

        game.update(DEFAULT_DT);
        assert_eq!(game.bricks().len(), 1);
        assert_eq!(game.score().score(), SCORE_PER_BRICK);
        assert!(game.balls()[0].vel.y > 0.0);
        assert_eq!(audio.played(), vec![Cue::Brick, Cue::Score]);
        assert!(game.power_ups().is_empty());
        game.shutdown();
    }

    #[test]
    fn test_power_up_pickup_awards_bonus() {
        let (mut game, _) = playing_game(Tuning::default());
        let center = game.paddle().center() - Vec2::new(0.0, 5.0);
        game.power_ups
            .push(PowerUp::new(center, PowerUpKind::Bullet, 10.0));
        game.update(DEFAULT_DT);

        assert!(game.power_ups().is_empty());
        assert_eq!(game.score().score(), 50);
        assert!(
            game.active_effects()
                .is_active(PowerUpKind::Bullet, game.effect_now())
        );
        game.shutdown();
    }

    #[test]
    fn test_bullets_fire_while_active() {
        let (mut game, _) = playing_game(Tuning::default());
        game.apply_power_up(PowerUpKind::Bullet);
        for _ in 0..13 {
            game.update(0.05);
        }
        assert_eq!(game.bullets().len(), 1);
        assert!((game.bullets()[0].center_x() - game.paddle().center_x()).abs() < 1e-3);
        game.shutdown();
    }

    #[test]
    fn test_bullet_absorbed_by_unbreakable() {
        let (mut game, _) = playing_game(Tuning::default());
        let center_x = game.paddle().center_x();
        game.bricks = vec![
            brick_at(center_x - BRICK_WIDTH / 2.0, 400.0, BrickKind::Unbreakable),
            brick_at(10.0, 50.0, BrickKind::Normal),
        ];
        game.bullets.push(Bullet::new(center_x, 440.0));
        game.update(DEFAULT_DT);

        assert!(game.bullets().is_empty());
        assert_eq!(game.bricks().len(), 2);
        assert!(!game.bricks()[0].destroyed);
        game.shutdown();
    }

    #[test]
    fn test_replacement_ball_keeps_speed_up() {
        let (mut game, _) = playing_game(Tuning::default());
        game.launch_ball();
        game.apply_power_up(PowerUpKind::SpeedUpBall);
        game.balls[0].pos = Vec2::new(100.0, PLAYFIELD_HEIGHT + 20.0);
        game.update(DEFAULT_DT);

        assert_eq!(game.balls().len(), 1);
        assert!(game.balls()[0].stuck);
        assert!(
            game.active_effects()
                .is_active(PowerUpKind::SpeedUpBall, game.effect_now())
        );
        assert!((game.balls()[0].speed_multiplier() - 1.3).abs() < 1e-6);
        game.shutdown();
    }

    #[test]
    fn test_hard_brick_takes_two_bullets_and_drops_nothing() {
        let tuning = Tuning {
            powerup_spawn_chance: 100,
            ..Tuning::default()
        };
        let (mut game, _) = playing_game(tuning);
        let center_x = game.paddle().center_x();
        game.bricks = vec![
            brick_at(center_x - BRICK_WIDTH / 2.0, 400.0, BrickKind::hard()),
            brick_at(10.0, 50.0, BrickKind::Normal),
        ];

        game.bullets.push(Bullet::new(center_x, 440.0));
        game.update(DEFAULT_DT);
        assert!(game.bullets().is_empty());
        assert_eq!(game.bricks().len(), 2);
        assert_eq!(game.bricks()[0].kind, BrickKind::Hard { damaged: true });
        assert_eq!(game.score().score(), 0);

        game.bullets.push(Bullet::new(center_x, 440.0));
        game.update(DEFAULT_DT);
        assert_eq!(game.bricks().len(), 1);
        assert_eq!(game.score().score(), 20);
        assert!(game.power_ups().is_empty());
        assert!(
            !game
                .drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::PowerUpSpawned { .. }))
        );
        game.shutdown();
    }

    #[test]
    fn test_ball_destroyed_brick_drops_power_up_at_center() {
        let tuning = Tuning {
            powerup_spawn_chance: 100,
            ..Tuning::default()
        };
        let (mut game, _) = playing_game(tuning);
        game.bricks = vec![
            brick_at(360.0, 200.0, BrickKind::Normal),
            brick_at(10.0, 50.0, BrickKind::Normal),
        ];
        game.balls[0] = Ball::free(Vec2::new(397.0, 230.0), -std::f32::consts::FRAC_PI_2, 300.0);
        game.update(DEFAULT_DT);

        assert_eq!(game.bricks().len(), 1);
        assert_eq!(game.power_ups().len(), 1);
        let brick_center = Vec2::new(397.5, 210.0);
        let fallen = Vec2::new(0.0, POWERUP_FALL_SPEED * DEFAULT_DT);
        let pickup_center = game.power_ups()[0].bounds().center();
        assert!((pickup_center - (brick_center + fallen)).length() < 1e-3);
        assert!(game.drain_events().iter().any(|e| matches!(
            e,
            GameEvent::PowerUpSpawned { center, .. } if *center == brick_center
        )));
        game.shutdown();
    }

    #[test]
    fn test_wall_clock_effects_expire_while_paused() {
        let tuning = Tuning {
            powerup_duration: 0.1,
            expiry_clock: ExpiryClock::WallClock,
            ..Tuning::default()
        };
        let (mut game, _) = playing_game(tuning);
        game.apply_power_up(PowerUpKind::ExpandPaddle);
        game.pause_game();
        std::thread::sleep(std::time::Duration::from_millis(200));

        // Nothing reverts until the next simulated frame
        assert!((game.paddle().width - PADDLE_WIDTH * 1.5).abs() < 1e-3);
        assert!(
            !game
                .active_effects()
                .is_active(PowerUpKind::ExpandPaddle, game.effect_now())
        );

        game.pause_game();
        game.update(DEFAULT_DT);
        assert_eq!(game.paddle().width, PADDLE_WIDTH);
        assert!(game.active_effects().is_empty());
        game.shutdown();
    }

    #[test]
    fn test_caught_power_up_uses_its_own_duration() {
        let (mut game, _) = playing_game(Tuning::default());
        let center = game.paddle().center() - Vec2::new(0.0, 5.0);
        game.power_ups
            .push(PowerUp::new(center, PowerUpKind::ExpandPaddle, 2.0));
        game.update(DEFAULT_DT);

        let remaining = game
            .active_effects()
            .remaining(PowerUpKind::ExpandPaddle, game.effect_now());
        assert!(remaining.is_some_and(|r| (r - 2.0).abs() < 1e-3));
        game.shutdown();
    }

    #[test]
    fn test_determinism() {
        let (mut a, _) = playing_game(Tuning::default());
        let (mut b, _) = playing_game(Tuning::default());
        a.launch_ball();
        b.launch_ball();
        for frame in 0..600 {
            let left = frame % 90 < 45;
            a.set_moving_left(left);
            b.set_moving_left(left);
            a.update(DEFAULT_DT);
            b.update(DEFAULT_DT);
        }
        assert_eq!(a.score().score(), b.score().score());
        assert_eq!(a.bricks().len(), b.bricks().len());
        assert_eq!(a.balls().len(), b.balls().len());
        a.shutdown();
        b.shutdown();
    }
}
