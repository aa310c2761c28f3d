//! Background producer of new customers.
//!
//! The generator runs on its own thread, sleeps a score-dependent random
//! interval, then offers one customer to the [`ArrivalQueue`]. Control
//! (pause/resume/stop) arrives over a command channel so that any sleep or
//! pause-wait is interrupted as soon as a command is sent.

use crate::core::arrivals::queue::ArrivalQueue;
use crate::core::config::ArrivalTiming;
use crate::core::customer::CustomerFactory;
use crate::core::error::{DinerError, DinerResult};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Uniform};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Read-only view of the game the generator adapts to
pub trait ScoreProbe: Send + Sync {
    fn score(&self) -> u32;
    fn is_game_over(&self) -> bool;
}

/// Inclusive window the next arrival delay is drawn from, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SleepBounds {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl SleepBounds {
    /// Window for the given score.
    ///
    /// Each full `score_threshold` points take `reduction_per_threshold_ms`
    /// off the upper bound, which never drops below `absolute_min_ms`. The
    /// lower bound stays at least `min_gap_ms` under the upper bound.
    ///
    /// # Arguments
    /// * `score` - Current player score
    /// * `timing` - Arrival timing constants
    ///
    /// # Returns
    /// The window, or `InvalidConfig` if the threshold is zero or the window
    /// would be empty
    pub fn for_score(score: u32, timing: &ArrivalTiming) -> DinerResult<Self> {
        if timing.score_threshold == 0 {
            return Err(DinerError::InvalidConfig(
                "arrival score threshold is zero".to_string(),
            ));
        }

        let steps = u64::from(score / timing.score_threshold);
        let reduction = steps.saturating_mul(timing.reduction_per_threshold_ms);
        let max_ms = timing
            .absolute_min_ms
            .max(timing.base_max_sleep_ms.saturating_sub(reduction));
        let mut min_ms = timing
            .base_min_sleep_ms
            .min(max_ms.saturating_sub(timing.min_gap_ms));
        if min_ms >= max_ms {
            min_ms = timing.min_gap_ms.max(max_ms.saturating_sub(timing.min_gap_ms));
        }

        if min_ms > max_ms {
            return Err(DinerError::InvalidConfig(format!(
                "empty arrival window [{}, {}]ms at score {}",
                min_ms, max_ms, score
            )));
        }
        Ok(Self { min_ms, max_ms })
    }

    pub fn sample(&self, rng: &mut StdRng) -> Duration {
        let millis = Uniform::new_inclusive(self.min_ms, self.max_ms).sample(rng);
        Duration::from_millis(millis)
    }
}

/// How an interruptible sleep ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wake {
    Elapsed,
    Interrupted,
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GeneratorCommand {
    Pause,
    Resume,
    Stop,
}

/// Cloneable control surface for a running generator
#[derive(Debug, Clone)]
pub struct GeneratorHandle {
    commands: Sender<GeneratorCommand>,
    paused: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
}

impl GeneratorHandle {
    pub fn pause_generation(&self) {
        self.paused.store(true, Ordering::SeqCst);
        self.signal(GeneratorCommand::Pause);
        debug!("[ArrivalGenerator] Pause signaled");
    }

    /// Clear a pause. Resuming a generator that is not paused does nothing,
    /// so the pending arrival keeps its deadline.
    pub fn resume_generation(&self) {
        if !self.paused.swap(false, Ordering::SeqCst) {
            return;
        }
        self.signal(GeneratorCommand::Resume);
        debug!("[ArrivalGenerator] Resume signaled");
    }

    /// Stop the generator, waking it from any sleep or pause-wait.
    ///
    /// Returns false if the generator thread is already gone.
    pub fn stop_generating(&self) -> bool {
        info!("[ArrivalGenerator] Stop signaled");
        self.running.store(false, Ordering::SeqCst);
        self.paused.store(false, Ordering::SeqCst);
        self.signal(GeneratorCommand::Stop)
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn signal(&self, command: GeneratorCommand) -> bool {
        match self.commands.try_send(command) {
            Ok(()) => true,
            Err(e) if e.is_full() => true,
            Err(_) => {
                debug!("[ArrivalGenerator] {:?} not delivered, generator has exited", command);
                false
            }
        }
    }
}

/// Background customer producer.
///
/// Construct, grab a [`GeneratorHandle`], then [`spawn`](Self::spawn).
pub struct ArrivalGenerator {
    queue: ArrivalQueue,
    probe: Arc<dyn ScoreProbe>,
    timing: ArrivalTiming,
    factory: CustomerFactory,
    rng: StdRng,
    commands: Receiver<GeneratorCommand>,
    handle: GeneratorHandle,
}

impl ArrivalGenerator {
    pub fn new(
        queue: ArrivalQueue,
        probe: Arc<dyn ScoreProbe>,
        timing: ArrivalTiming,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_entropy(),
        };
        Self::with_factory(queue, probe, timing, CustomerFactory::from_optional_seed(seed), rng)
    }

    /// Generator with an explicit factory and jitter RNG
    pub fn with_factory(
        queue: ArrivalQueue,
        probe: Arc<dyn ScoreProbe>,
        timing: ArrivalTiming,
        factory: CustomerFactory,
        rng: StdRng,
    ) -> Self {
        // Commands only ever wake the loop; the flags carry the real state,
        // so a small buffer is enough.
        let (sender, commands) = crossbeam_channel::bounded(8);
        let handle = GeneratorHandle {
            commands: sender,
            paused: Arc::new(AtomicBool::new(false)),
            running: Arc::new(AtomicBool::new(true)),
        };
        Self {
            queue,
            probe,
            timing,
            factory,
            rng,
            commands,
            handle,
        }
    }

    pub fn handle(&self) -> GeneratorHandle {
        self.handle.clone()
    }

    /// Run the loop on a dedicated `arrival-generator` thread
    pub fn spawn(self) -> DinerResult<JoinHandle<()>> {
        thread::Builder::new()
            .name("arrival-generator".to_string())
            .spawn(move || self.run())
            .map_err(|e| DinerError::ThreadSpawn(e.to_string()))
    }

    /// Delay before the next arrival, falling back to the base minimum if
    /// the window cannot be computed.
    pub fn next_sleep(&mut self) -> Duration {
        let score = self.probe.score();
        match SleepBounds::for_score(score, &self.timing) {
            Ok(bounds) => {
                let sleep = bounds.sample(&mut self.rng);
                debug!(
                    "[ArrivalGenerator] Score {} => window [{}-{}]ms, sleeping {}ms",
                    score,
                    bounds.min_ms,
                    bounds.max_ms,
                    sleep.as_millis()
                );
                sleep
            }
            Err(e) => {
                error!("[ArrivalGenerator] Error calculating sleep time: {}", e);
                Duration::from_millis(self.timing.base_min_sleep_ms)
            }
        }
    }

    /// Create one customer and offer it, unless the game is over.
    ///
    /// Returns true if a customer was enqueued.
    pub fn produce_once(&mut self) -> bool {
        if self.probe.is_game_over() {
            debug!("[ArrivalGenerator] Game over, skipping production");
            return false;
        }
        let customer = self.factory.create();
        let display_id = customer.display_id();
        let added = self.queue.offer(customer);
        if added {
            debug!("[ArrivalGenerator] Enqueued {}", display_id);
        } else {
            warn!("[ArrivalGenerator] Arrival queue full, {} was not added", display_id);
        }
        added
    }

    fn is_running(&self) -> bool {
        self.handle.is_running()
    }

    fn is_paused(&self) -> bool {
        self.handle.is_paused()
    }

    /// Block until resumed or stopped. Returns false if the loop should exit.
    fn wait_while_paused(&mut self) -> bool {
        while self.is_paused() && self.is_running() {
            debug!("[ArrivalGenerator] Paused, waiting");
            if self.commands.recv().is_err() {
                return false;
            }
        }
        self.is_running()
    }

    /// Sleep until `deadline`. Only a pause or a stop cuts the sleep short;
    /// stale commands that leave the generator running are ignored.
    fn sleep_until(&self, deadline: Instant) -> Wake {
        loop {
            match self.commands.recv_deadline(deadline) {
                Err(RecvTimeoutError::Timeout) => return Wake::Elapsed,
                Err(RecvTimeoutError::Disconnected) => return Wake::Disconnected,
                Ok(command) => {
                    if self.is_paused() || !self.is_running() {
                        return Wake::Interrupted;
                    }
                    debug!("[ArrivalGenerator] Ignoring {:?} while running", command);
                }
            }
        }
    }

    fn run(mut self) {
        info!("[ArrivalGenerator] Started");
        loop {
            if !self.wait_while_paused() {
                break;
            }

            let deadline = Instant::now() + self.next_sleep();
            match self.sleep_until(deadline) {
                Wake::Elapsed => {}
                Wake::Interrupted => continue,
                Wake::Disconnected => break,
            }

            if self.is_paused() || !self.is_running() {
                continue;
            }
            self.produce_once();
        }
        self.handle.running.store(false, Ordering::SeqCst);
        info!("[ArrivalGenerator] Finished");
    }
}
