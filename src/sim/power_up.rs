//! Power-up spawning and the active effect registry

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::{Ball, PowerUpKind};

/// Map a 0-99 roll onto a power-up kind.
///
/// Bands: Bullet 0-29, MultiBall 30-59, ExpandPaddle 60-74,
/// ShrinkPaddle 75-89, SpeedUpBall 90-99.
pub fn kind_for_roll(roll: u32) -> PowerUpKind {
    match roll {
        0..=29 => PowerUpKind::Bullet,
        30..=59 => PowerUpKind::MultiBall,
        60..=74 => PowerUpKind::ExpandPaddle,
        75..=89 => PowerUpKind::ShrinkPaddle,
        _ => PowerUpKind::SpeedUpBall,
    }
}

/// Weighted kind roll, assuming a spawn is happening
pub fn roll_kind<R: Rng>(rng: &mut R) -> PowerUpKind {
    kind_for_roll(rng.random_range(0..100))
}

/// Spawn roll for one destroyed brick: `chance` percent to drop anything
pub fn roll_spawn<R: Rng>(rng: &mut R, chance: u32) -> Option<PowerUpKind> {
    if rng.random_range(0..100) < chance {
        Some(roll_kind(rng))
    } else {
        None
    }
}

/// Two extra balls fanned `spread` radians either side of `source`'s heading
pub fn fan_out(source: &Ball, base_speed: f32, spread: f32) -> [Ball; 2] {
    let center = source.heading();
    [
        Ball::free(source.pos, center + spread, base_speed),
        Ball::free(source.pos, center - spread, base_speed),
    ]
}

/// Timed effects currently in force, keyed by kind, valued by expiry time
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActiveEffects {
    expiry: BTreeMap<PowerUpKind, f64>,
}

impl ActiveEffects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or refresh) an effect lasting `duration` seconds from `now`
    pub fn activate(&mut self, kind: PowerUpKind, now: f64, duration: f64) {
        self.expiry.insert(kind, now + duration);
    }

    /// Drop an effect without reporting it as expired
    pub fn remove(&mut self, kind: PowerUpKind) -> bool {
        self.expiry.remove(&kind).is_some()
    }

    pub fn is_active(&self, kind: PowerUpKind, now: f64) -> bool {
        self.expiry.get(&kind).is_some_and(|&until| now < until)
    }

    /// Seconds left on `kind`, if registered
    pub fn remaining(&self, kind: PowerUpKind, now: f64) -> Option<f64> {
        self.expiry.get(&kind).map(|&until| (until - now).max(0.0))
    }

    pub fn expiry(&self, kind: PowerUpKind) -> Option<f64> {
        self.expiry.get(&kind).copied()
    }

    /// Remove every entry whose expiry has been reached; returns them in kind order
    pub fn sweep(&mut self, now: f64) -> Vec<PowerUpKind> {
        let expired: Vec<PowerUpKind> = self
            .expiry
            .iter()
            .filter(|&(_, &until)| now >= until)
            .map(|(&kind, _)| kind)
            .collect();
        for kind in &expired {
            self.expiry.remove(kind);
        }
        expired
    }

    pub fn clear(&mut self) {
        self.expiry.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.expiry.is_empty()
    }

    pub fn len(&self) -> usize {
        self.expiry.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PowerUpKind, f64)> + '_ {
        self.expiry.iter().map(|(&k, &v)| (k, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_roll_bands() {
        assert_eq!(kind_for_roll(0), PowerUpKind::Bullet);
        assert_eq!(kind_for_roll(29), PowerUpKind::Bullet);
        assert_eq!(kind_for_roll(30), PowerUpKind::MultiBall);
        assert_eq!(kind_for_roll(59), PowerUpKind::MultiBall);
        assert_eq!(kind_for_roll(60), PowerUpKind::ExpandPaddle);
        assert_eq!(kind_for_roll(74), PowerUpKind::ExpandPaddle);
        assert_eq!(kind_for_roll(75), PowerUpKind::ShrinkPaddle);
        assert_eq!(kind_for_roll(89), PowerUpKind::ShrinkPaddle);
        assert_eq!(kind_for_roll(90), PowerUpKind::SpeedUpBall);
        assert_eq!(kind_for_roll(99), PowerUpKind::SpeedUpBall);
    }

    #[test]
    fn test_kind_distribution() {
        let mut rng = Pcg32::seed_from_u64(7);
        let n = 100_000;
        let mut counts: BTreeMap<PowerUpKind, u32> = BTreeMap::new();
        for _ in 0..n {
            *counts.entry(roll_kind(&mut rng)).or_default() += 1;
        }
        let pct = |k: PowerUpKind| counts.get(&k).copied().unwrap_or(0) as f64 / n as f64 * 100.0;
        assert!((pct(PowerUpKind::Bullet) - 30.0).abs() < 1.0);
        assert!((pct(PowerUpKind::MultiBall) - 30.0).abs() < 1.0);
        assert!((pct(PowerUpKind::ExpandPaddle) - 15.0).abs() < 1.0);
        assert!((pct(PowerUpKind::ShrinkPaddle) - 15.0).abs() < 1.0);
        assert!((pct(PowerUpKind::SpeedUpBall) - 10.0).abs() < 1.0);
    }

    #[test]
    fn test_spawn_chance_bounds() {
        let mut rng = Pcg32::seed_from_u64(1);
        assert!((0..1000).all(|_| roll_spawn(&mut rng, 0).is_none()));
        assert!((0..1000).all(|_| roll_spawn(&mut rng, 100).is_some()));

        let spawned = (0..10_000).filter(|_| roll_spawn(&mut rng, 40).is_some()).count();
        assert!((3_700..4_300).contains(&spawned));
    }

    #[test]
    fn test_fan_out_angles() {
        let source = Ball::free(Vec2::new(200.0, 300.0), -1.0, 250.0);
        let spread = 20f32.to_radians();
        let [a, b] = fan_out(&source, 300.0, spread);
        assert_eq!(a.pos, source.pos);
        assert_eq!(b.pos, source.pos);
        assert!((a.heading() - (-1.0 + spread)).abs() < 1e-4);
        assert!((b.heading() - (-1.0 - spread)).abs() < 1e-4);
        assert!((a.vel.length() - 300.0).abs() < 0.01);
        assert!(!a.stuck && !b.stuck);
    }

    #[test]
    fn test_expiry_not_before_deadline() {
        let mut effects = ActiveEffects::new();
        effects.activate(PowerUpKind::ExpandPaddle, 2.0, 10.0);
        assert!(effects.sweep(11.999).is_empty());
        assert!(effects.is_active(PowerUpKind::ExpandPaddle, 11.999));
        assert_eq!(effects.sweep(12.0), vec![PowerUpKind::ExpandPaddle]);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_refresh_extends_expiry() {
        let mut effects = ActiveEffects::new();
        effects.activate(PowerUpKind::Bullet, 0.0, 10.0);
        effects.activate(PowerUpKind::Bullet, 5.0, 10.0);
        assert_eq!(effects.len(), 1);
        assert!(effects.sweep(12.0).is_empty());
        assert_eq!(effects.remaining(PowerUpKind::Bullet, 12.0), Some(3.0));
    }
}
