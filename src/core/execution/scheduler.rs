//! Fixed-timestep tick loop.
//!
//! The scheduler drives [`DinerState::update`](crate::core::diner_state::DinerState::update)
//! at the configured frame rate on its own thread, runs arrival intake on a
//! fixed wall-clock interval, and forwards angry-leave and game-over events
//! to the [`FrameHooks`] collaborator.

use crate::core::config::FrameTiming;
use crate::core::diner_state::SharedDiner;
use crate::core::error::{DinerError, DinerResult};
use crate::core::execution::hooks::{guarded, FrameHooks};
use crate::core::highscore::HighScoreKeeper;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Smallest dt handed to the simulation
const MIN_FRAME_DELTA: Duration = Duration::from_nanos(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SchedulerCommand {
    Pause,
    Resume,
    Stop,
}

/// Result of one simulated frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub angry_leaves: u32,
    /// `Some(n)` when the arrival interval elapsed this frame
    pub arrivals_processed: Option<usize>,
    /// True only on the frame that first observed game over
    pub game_over_triggered: bool,
}

/// Clamp a measured frame time into `[1ns, max_frame_delta]` seconds
pub fn clamp_frame_delta(elapsed: Duration, frames: &FrameTiming) -> f32 {
    elapsed
        .max(MIN_FRAME_DELTA)
        .min(frames.max_frame_delta())
        .as_secs_f32()
}

/// The tick loop. Configure, then [`spawn`](Self::spawn) onto its own thread,
/// or drive it by hand with [`step`](Self::step).
pub struct Scheduler {
    diner: SharedDiner,
    hooks: Box<dyn FrameHooks>,
    frames: FrameTiming,
    high_score: Option<HighScoreKeeper>,
    game_over_handled: bool,
    interval_start: Instant,
}

impl Scheduler {
    pub fn new(diner: SharedDiner, hooks: Box<dyn FrameHooks>, frames: FrameTiming) -> Self {
        Self {
            diner,
            hooks,
            frames,
            high_score: None,
            game_over_handled: false,
            interval_start: Instant::now(),
        }
    }

    /// Persist the final score through `keeper` on game over
    pub fn with_high_score(mut self, keeper: HighScoreKeeper) -> Self {
        self.high_score = Some(keeper);
        self
    }

    pub fn diner(&self) -> &SharedDiner {
        &self.diner
    }

    /// Restart the arrival interval and game-over bookkeeping from `now`
    pub fn reset_anchors(&mut self, now: Instant) {
        self.interval_start = now;
        self.game_over_handled = false;
    }

    /// Simulate one frame.
    ///
    /// Runs the diner tick, the one-time game-over handling, angry-leave
    /// effects, the view update, interval arrival intake and render, in
    /// that order. Collaborator panics are logged and skipped.
    ///
    /// # Arguments
    /// * `dt` - Simulated seconds for this frame (not clamped here)
    /// * `now` - Wall time of the frame, used for the arrival interval
    ///
    /// # Returns
    /// A [`FrameReport`] describing what happened this frame
    pub fn step(&mut self, dt: f32, now: Instant) -> FrameReport {
        let mut report = FrameReport::default();

        let diner = &self.diner;
        report.angry_leaves = guarded("diner update", || diner.lock().update(dt)).unwrap_or(0);

        let (game_over, score) = {
            let state = self.diner.lock();
            (state.is_game_over(), state.score())
        };
        if game_over && !self.game_over_handled {
            self.game_over_handled = true;
            report.game_over_triggered = true;
            info!("[Scheduler] Game over detected, final score {}", score);
            let new_record = self
                .high_score
                .as_mut()
                .map_or(false, |keeper| keeper.record_final_score(score));
            let hooks = &mut self.hooks;
            guarded("game over hook", || hooks.on_game_over(score, new_record));
        }

        if report.angry_leaves > 0 {
            debug!("[Scheduler] {} angry leavers this frame", report.angry_leaves);
            let hooks = &mut self.hooks;
            let count = report.angry_leaves;
            guarded("angry leave effects", || hooks.on_angry_leave(count));
        }

        let hooks = &mut self.hooks;
        guarded("view update", || hooks.update_view(dt));

        if now.saturating_duration_since(self.interval_start) >= self.frames.arrival_interval() {
            let hooks = &mut self.hooks;
            let diner = &self.diner;
            let moved = guarded("arrival intake", || hooks.trigger_process_arrivals(diner));
            report.arrivals_processed = Some(moved.unwrap_or(0));
            self.interval_start = now;
        }

        let hooks = &mut self.hooks;
        let diner = &self.diner;
        guarded("render", || hooks.render(diner));

        report
    }

    /// Run the loop on a dedicated `diner-scheduler` thread
    pub fn spawn(self) -> DinerResult<SchedulerHandle> {
        let (sender, commands) = crossbeam_channel::bounded(8);
        let paused = Arc::new(AtomicBool::new(false));
        let running = Arc::new(AtomicBool::new(true));

        let control = LoopControl {
            commands,
            paused: Arc::clone(&paused),
            running: Arc::clone(&running),
        };
        let join = thread::Builder::new()
            .name("diner-scheduler".to_string())
            .spawn(move || self.run(control))
            .map_err(|e| DinerError::ThreadSpawn(e.to_string()))?;

        Ok(SchedulerHandle {
            commands: sender,
            paused,
            running,
            join: Some(join),
        })
    }

    fn run(mut self, control: LoopControl) {
        info!("[Scheduler] Started at {} fps", self.frames.target_fps);
        let optimal = self.frames.optimal_frame_time();
        let mut last_tick = Instant::now();
        self.reset_anchors(last_tick);

        while control.running.load(Ordering::SeqCst) {
            if control.paused.load(Ordering::SeqCst) {
                if !control.wait(self.frames.pause_poll()) {
                    break;
                }
                // Paused time is never simulated
                last_tick = Instant::now();
                continue;
            }

            let frame_start = Instant::now();
            let elapsed = frame_start.saturating_duration_since(last_tick);
            let dt = clamp_frame_delta(elapsed, &self.frames);
            last_tick = frame_start;

            self.step(dt, frame_start);

            let mut sleep = optimal.saturating_sub(frame_start.elapsed());
            if self.game_over_handled {
                sleep += self.frames.game_over_idle();
            }
            if !sleep.is_zero() && !control.wait(sleep) {
                break;
            }
        }

        control.running.store(false, Ordering::SeqCst);
        info!("[Scheduler] Finished");
    }
}

/// The loop-side half of the control channel
struct LoopControl {
    commands: Receiver<SchedulerCommand>,
    paused: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
}

impl LoopControl {
    /// Interruptible sleep. Returns false once every handle is gone.
    fn wait(&self, timeout: Duration) -> bool {
        match self.commands.recv_timeout(timeout) {
            Ok(command) => {
                debug!("[Scheduler] Woken by {:?}", command);
                true
            }
            Err(RecvTimeoutError::Timeout) => true,
            Err(RecvTimeoutError::Disconnected) => false,
        }
    }
}

/// Lifecycle control for a spawned [`Scheduler`]
pub struct SchedulerHandle {
    commands: Sender<SchedulerCommand>,
    paused: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl SchedulerHandle {
    pub fn pause_game(&self) {
        self.paused.store(true, Ordering::SeqCst);
        self.signal(SchedulerCommand::Pause);
        debug!("[Scheduler] Paused");
    }

    pub fn resume_game(&self) {
        self.paused.store(false, Ordering::SeqCst);
        self.signal(SchedulerCommand::Resume);
        debug!("[Scheduler] Resumed");
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// `true` clears any pause; `false` stops the loop and wakes it.
    ///
    /// Stopping is final: once the loop thread has exited, `set_running(true)`
    /// cannot restart it and only logs a warning.
    pub fn set_running(&self, running: bool) {
        if running {
            if !self.is_running() {
                warn!("[Scheduler] Cannot restart a stopped tick loop");
                return;
            }
            self.resume_game();
        } else {
            self.running.store(false, Ordering::SeqCst);
            self.paused.store(false, Ordering::SeqCst);
            self.signal(SchedulerCommand::Stop);
        }
    }

    /// Stop the loop and wait up to `timeout` for the thread to finish
    pub fn stop(&mut self, timeout: Duration) -> bool {
        self.set_running(false);
        match self.join.take() {
            Some(join) => join_with_timeout(join, timeout, "diner-scheduler"),
            None => true,
        }
    }

    fn signal(&self, command: SchedulerCommand) {
        if let Err(e) = self.commands.try_send(command) {
            if !e.is_full() {
                debug!("[Scheduler] {:?} not delivered, loop has exited", command);
            }
        }
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        if self.join.is_some() {
            self.stop(Duration::from_millis(500));
        }
    }
}

/// Join `handle`, giving up after `timeout`. Returns true if it finished.
pub(crate) fn join_with_timeout(handle: JoinHandle<()>, timeout: Duration, name: &str) -> bool {
    let deadline = Instant::now() + timeout;
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            error!("[Scheduler] Timed out joining {} thread", name);
            return false;
        }
        thread::sleep(Duration::from_millis(5));
    }
    if handle.join().is_err() {
        warn!("[Scheduler] {} thread panicked", name);
    }
    debug!("[Scheduler] Joined {} thread", name);
    true
}
