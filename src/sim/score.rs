//! Score, lives and level counter

use serde::{Deserialize, Serialize};

use crate::consts::INITIAL_LIVES;

/// Per-session score and lives state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreTracker {
    score: u64,
    lives: u32,
    /// 1-based level counter shown to the player
    level: u32,
    /// Best score seen (seeded from the high score store)
    high_score: u64,
    initial_lives: u32,
}

impl Default for ScoreTracker {
    fn default() -> Self {
        Self::new(INITIAL_LIVES)
    }
}

impl ScoreTracker {
    pub fn new(initial_lives: u32) -> Self {
        Self {
            score: 0,
            lives: initial_lives,
            level: 1,
            high_score: 0,
            initial_lives,
        }
    }

    pub fn add_score(&mut self, points: u64) {
        self.score = self.score.saturating_add(points);
    }

    /// Returns true if that was the last life
    pub fn lose_life(&mut self) -> bool {
        self.lives = self.lives.saturating_sub(1);
        self.is_game_over()
    }

    pub fn is_game_over(&self) -> bool {
        self.lives == 0
    }

    pub fn set_lives(&mut self, lives: u32) {
        self.lives = lives;
    }

    pub fn next_level(&mut self) {
        self.level += 1;
    }

    pub fn set_level(&mut self, level: u32) {
        self.level = level.max(1);
    }

    /// Fresh game: score, lives and level back to initial values
    pub fn reset(&mut self) {
        self.score = 0;
        self.lives = self.initial_lives;
        self.level = 1;
    }

    pub fn set_high_score(&mut self, best: u64) {
        self.high_score = best;
    }

    /// Fold the current score into the best; true if it's a new record
    pub fn commit_high_score(&mut self) -> bool {
        if self.score > self.high_score {
            self.high_score = self.score;
            true
        } else {
            false
        }
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn high_score(&self) -> u64 {
        self.high_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lose_life_to_game_over() {
        let mut s = ScoreTracker::new(2);
        assert!(!s.lose_life());
        assert_eq!(s.lives(), 1);
        assert!(s.lose_life());
        assert!(s.is_game_over());
        // Never underflows
        assert!(s.lose_life());
        assert_eq!(s.lives(), 0);
    }

    #[test]
    fn test_reset_restores_initial() {
        let mut s = ScoreTracker::new(3);
        s.add_score(120);
        s.lose_life();
        s.next_level();
        s.set_high_score(50);
        s.reset();
        assert_eq!(s.score(), 0);
        assert_eq!(s.lives(), 3);
        assert_eq!(s.level(), 1);
        // Best survives a reset
        assert_eq!(s.high_score(), 50);
    }

    #[test]
    fn test_commit_high_score() {
        let mut s = ScoreTracker::default();
        s.set_high_score(100);
        s.add_score(90);
        assert!(!s.commit_high_score());
        s.add_score(20);
        assert!(s.commit_high_score());
        assert_eq!(s.high_score(), 110);
    }
}
