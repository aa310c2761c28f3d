use crate::core::config::Progression;
use log::info;
use serde::{Deserialize, Serialize};

/// Score, lives and level counters with the level-up rule.
///
/// Score and level never decrease; lives stay within `0..=max_lives`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBoard {
    score: u32,
    player_lives: u32,
    current_level: u32,
    score_for_next_level: u32,
    max_lives: u32,
    score_per_level: u32,
}

impl ScoreBoard {
    /// Fresh board: level 1, initial lives, first threshold at one level's worth
    pub fn new(progression: &Progression) -> Self {
        Self {
            score: 0,
            player_lives: progression.initial_lives.min(progression.max_lives),
            current_level: 1,
            score_for_next_level: progression.score_per_level,
            max_lives: progression.max_lives,
            score_per_level: progression.score_per_level,
        }
    }

    /// Board continuing from saved counters. Lives are capped at the maximum.
    pub fn resume(
        progression: &Progression,
        score: u32,
        player_lives: u32,
        current_level: u32,
        score_for_next_level: u32,
    ) -> Self {
        Self {
            score,
            player_lives: player_lives.min(progression.max_lives),
            current_level: current_level.max(1),
            score_for_next_level,
            max_lives: progression.max_lives,
            score_per_level: progression.score_per_level,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn player_lives(&self) -> u32 {
        self.player_lives
    }

    pub fn max_lives(&self) -> u32 {
        self.max_lives
    }

    pub fn current_level(&self) -> u32 {
        self.current_level
    }

    pub fn score_for_next_level(&self) -> u32 {
        self.score_for_next_level
    }

    pub fn is_out_of_lives(&self) -> bool {
        self.player_lives == 0
    }

    /// Remove one life, never going below zero. Returns lives remaining.
    pub fn lose_life(&mut self) -> u32 {
        self.player_lives = self.player_lives.saturating_sub(1);
        self.player_lives
    }

    /// Add `points` and apply every level threshold crossed.
    ///
    /// Returns the number of levels gained.
    pub fn award(&mut self, points: u32) -> u32 {
        self.score = self.score.saturating_add(points);
        let mut gained = 0;
        while self.score >= self.score_for_next_level && self.score_per_level > 0 {
            self.current_level += 1;
            self.score_for_next_level += self.score_per_level;
            self.player_lives = (self.player_lives + 1).min(self.max_lives);
            gained += 1;
            info!(
                "[ScoreBoard] LEVEL UP! Level {}. Lives: {}/{}. Next level at {} points",
                self.current_level, self.player_lives, self.max_lives, self.score_for_next_level
            );
        }
        gained
    }
}
