use log::{error, info};
use std::sync::{Arc, Mutex};

/// Persistence seam for the best score
pub trait HighScoreStore: Send {
    fn load(&self) -> u32;
    fn save(&mut self, score: u32);
}

/// Shared in-process store; clones see the same value
#[derive(Debug, Clone, Default)]
pub struct InMemoryHighScore {
    value: Arc<Mutex<u32>>,
}

impl InMemoryHighScore {
    pub fn new(initial: u32) -> Self {
        Self {
            value: Arc::new(Mutex::new(initial)),
        }
    }
}

impl HighScoreStore for InMemoryHighScore {
    fn load(&self) -> u32 {
        match self.value.lock() {
            Ok(value) => *value,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn save(&mut self, score: u32) {
        match self.value.lock() {
            Ok(mut value) => *value = score,
            Err(poisoned) => {
                error!("[HighScore] Store lock poisoned, overwriting");
                *poisoned.into_inner() = score;
            }
        }
    }
}

/// Reads the stored best once and writes back only a strictly better score
pub struct HighScoreKeeper {
    store: Box<dyn HighScoreStore>,
    best: u32,
}

impl HighScoreKeeper {
    pub fn new(store: Box<dyn HighScoreStore>) -> Self {
        let best = store.load();
        info!("[HighScore] Loaded high score {}", best);
        Self { store, best }
    }

    pub fn best(&self) -> u32 {
        self.best
    }

    /// Returns true if `score` set a new record and was saved
    pub fn record_final_score(&mut self, score: u32) -> bool {
        if score > self.best {
            info!("[HighScore] New high score {} (previous {})", score, self.best);
            self.best = score;
            self.store.save(score);
            true
        } else {
            info!("[HighScore] Score {} not higher than {}, not saving", score, self.best);
            false
        }
    }
}
