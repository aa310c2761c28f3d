//! Configuration for a diner session.
//!
//! The defaults are the game's fixed tuning table. Everything is grouped the
//! way the subsystems consume it: service timings for the customer state
//! machine, progression for score/lives, arrival timing for the background
//! generator and frame timing for the tick loop.

use crate::core::error::{DinerError, DinerResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Customer service timings, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServiceTiming {
    /// Patience units drained per second, before the type multiplier
    pub patience_decrease_rate: f32,
    pub order_ready_delay: f32,
    pub cook_duration: f32,
    pub eating_duration: f32,
}

impl Default for ServiceTiming {
    fn default() -> Self {
        Self {
            patience_decrease_rate: 2.0,
            order_ready_delay: 5.0,
            cook_duration: 8.0,
            eating_duration: 10.0,
        }
    }
}

/// Lives and level progression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression {
    pub initial_lives: u32,
    pub max_lives: u32,
    pub score_per_level: u32,
}

impl Default for Progression {
    fn default() -> Self {
        Self {
            initial_lives: 5,
            max_lives: 7,
            score_per_level: 500,
        }
    }
}

/// Adaptive arrival timing, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrivalTiming {
    pub base_min_sleep_ms: u64,
    pub base_max_sleep_ms: u64,
    /// Every full multiple of this score shortens the window
    pub score_threshold: u32,
    pub reduction_per_threshold_ms: u64,
    /// Floor for the upper bound of the window
    pub absolute_min_ms: u64,
    /// Minimum spread kept between the lower and upper bound
    pub min_gap_ms: u64,
    pub queue_capacity: usize,
}

impl Default for ArrivalTiming {
    fn default() -> Self {
        Self {
            base_min_sleep_ms: 2500,
            base_max_sleep_ms: 8000,
            score_threshold: 150,
            reduction_per_threshold_ms: 300,
            absolute_min_ms: 1500,
            min_gap_ms: 500,
            queue_capacity: 10,
        }
    }
}

/// Tick loop pacing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameTiming {
    pub target_fps: u32,
    pub arrival_interval_ms: u64,
    pub pause_poll_ms: u64,
    /// Extra idle per frame once game over has been handled
    pub game_over_idle_ms: u64,
    /// Upper clamp for a single dt, in frames
    pub max_dt_frames: u32,
}

impl Default for FrameTiming {
    fn default() -> Self {
        Self {
            target_fps: 60,
            arrival_interval_ms: 3000,
            pause_poll_ms: 50,
            game_over_idle_ms: 50,
            max_dt_frames: 2,
        }
    }
}

impl FrameTiming {
    pub fn optimal_frame_time(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.target_fps.max(1)))
    }

    pub fn max_frame_delta(&self) -> Duration {
        self.optimal_frame_time() * self.max_dt_frames.max(1)
    }

    pub fn arrival_interval(&self) -> Duration {
        Duration::from_millis(self.arrival_interval_ms)
    }

    pub fn pause_poll(&self) -> Duration {
        Duration::from_millis(self.pause_poll_ms)
    }

    pub fn game_over_idle(&self) -> Duration {
        Duration::from_millis(self.game_over_idle_ms)
    }
}

/// Full session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DinerConfig {
    pub service: ServiceTiming,
    pub progression: Progression,
    pub arrivals: ArrivalTiming,
    pub frames: FrameTiming,
    /// Seed for customer types and arrival jitter; `None` draws from entropy
    pub random_seed: Option<u64>,
}

impl Default for DinerConfig {
    fn default() -> Self {
        Self {
            service: ServiceTiming::default(),
            progression: Progression::default(),
            arrivals: ArrivalTiming::default(),
            frames: FrameTiming::default(),
            random_seed: None,
        }
    }
}

impl DinerConfig {
    /// Create a configuration with the stock game constants
    ///
    /// Arrivals draw from entropy until a seed is set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the seed for customer types and arrival jitter
    ///
    /// # Arguments
    /// * `seed` - `Some` for a reproducible run, `None` for OS entropy
    ///
    /// # Returns
    /// The configuration with the seed applied
    pub fn with_random_seed(mut self, seed: Option<u64>) -> Self {
        self.random_seed = seed;
        self
    }

    /// Replace the patience rate and service durations
    ///
    /// # Arguments
    /// * `service` - Patience drain rate and order/cook/eat durations in seconds
    ///
    /// # Returns
    /// The configuration with the new service timing
    pub fn with_service_timing(mut self, service: ServiceTiming) -> Self {
        self.service = service;
        self
    }

    /// Replace the lives and level settings
    ///
    /// # Arguments
    /// * `progression` - Starting lives, lives cap and points per level
    ///
    /// # Returns
    /// The configuration with the new progression
    pub fn with_progression(mut self, progression: Progression) -> Self {
        self.progression = progression;
        self
    }

    /// Replace the arrival generator timing
    ///
    /// # Arguments
    /// * `arrivals` - Sleep window, score scaling and queue capacity
    ///
    /// # Returns
    /// The configuration with the new arrival timing
    pub fn with_arrival_timing(mut self, arrivals: ArrivalTiming) -> Self {
        self.arrivals = arrivals;
        self
    }

    /// Replace the tick loop pacing
    ///
    /// # Arguments
    /// * `frames` - Frame rate, arrival intake interval and idle intervals
    ///
    /// # Returns
    /// The configuration with the new frame timing
    pub fn with_frame_timing(mut self, frames: FrameTiming) -> Self {
        self.frames = frames;
        self
    }

    pub fn with_initial_lives(mut self, lives: u32) -> Self {
        self.progression.initial_lives = lives;
        self
    }

    /// Set the arrival queue capacity
    ///
    /// # Note
    /// Arrivals offered to a full queue are dropped, not retried
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.arrivals.queue_capacity = capacity;
        self
    }

    pub fn with_arrival_interval_ms(mut self, interval_ms: u64) -> Self {
        self.frames.arrival_interval_ms = interval_ms;
        self
    }

    /// Check the configuration for values the simulation cannot run with
    ///
    /// # Returns
    /// `Ok(())`, or `InvalidConfig` naming the first rejected setting
    pub fn validate(&self) -> DinerResult<()> {
        let service = &self.service;
        if service.patience_decrease_rate <= 0.0 {
            return invalid("patience decrease rate must be greater than 0");
        }
        if service.order_ready_delay <= 0.0
            || service.cook_duration <= 0.0
            || service.eating_duration <= 0.0
        {
            return invalid("service durations must be greater than 0");
        }

        let progression = &self.progression;
        if progression.initial_lives == 0 {
            return invalid("initial lives must be at least 1");
        }
        if progression.initial_lives > progression.max_lives {
            return invalid("initial lives cannot exceed max lives");
        }
        if progression.score_per_level == 0 {
            return invalid("score per level must be greater than 0");
        }

        let arrivals = &self.arrivals;
        if arrivals.base_min_sleep_ms > arrivals.base_max_sleep_ms {
            return invalid("base min sleep cannot be greater than base max sleep");
        }
        if arrivals.score_threshold == 0 {
            return invalid("arrival score threshold must be greater than 0");
        }
        if arrivals.queue_capacity == 0 {
            return invalid("arrival queue capacity must be greater than 0");
        }

        if self.frames.target_fps == 0 {
            return invalid("target fps must be greater than 0");
        }

        Ok(())
    }
}

fn invalid(reason: &str) -> DinerResult<()> {
    Err(DinerError::InvalidConfig(reason.to_string()))
}
