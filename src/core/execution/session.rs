use crate::core::arrivals::{ArrivalGenerator, GeneratorHandle};
use crate::core::config::DinerConfig;
use crate::core::diner_state::{DinerLayout, DinerState, SharedDiner};
use crate::core::error::DinerResult;
use crate::core::execution::hooks::FrameHooks;
use crate::core::execution::scheduler::{join_with_timeout, Scheduler, SchedulerHandle};
use crate::core::highscore::HighScoreKeeper;
use log::info;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

const JOIN_TIMEOUT: Duration = Duration::from_millis(500);

/// A running game: the shared diner plus its generator and scheduler threads.
///
/// Dropping the session stops and joins both threads.
pub struct DinerSession {
    diner: SharedDiner,
    generator: GeneratorHandle,
    generator_thread: Option<JoinHandle<()>>,
    scheduler: SchedulerHandle,
}

impl DinerSession {
    /// Build the diner from `layout` and start both background threads
    pub fn start(
        config: &DinerConfig,
        layout: &DinerLayout,
        hooks: Box<dyn FrameHooks>,
        high_score: Option<HighScoreKeeper>,
    ) -> DinerResult<Self> {
        config.validate()?;

        let diner = SharedDiner::new(DinerState::with_layout(config, layout));
        let queue = diner.lock().arrival_queue().clone();
        let generator = ArrivalGenerator::new(
            queue,
            Arc::new(diner.clone()),
            config.arrivals,
            config.random_seed,
        );
        let generator_handle = generator.handle();
        diner.lock().set_generator(generator_handle.clone());
        let generator_thread = generator.spawn()?;

        let mut scheduler = Scheduler::new(diner.clone(), hooks, config.frames);
        if let Some(keeper) = high_score {
            scheduler = scheduler.with_high_score(keeper);
        }
        let scheduler = match scheduler.spawn() {
            Ok(handle) => handle,
            Err(e) => {
                generator_handle.stop_generating();
                join_with_timeout(generator_thread, JOIN_TIMEOUT, "arrival-generator");
                return Err(e);
            }
        };

        info!("[DinerSession] Session {} running", diner.lock().session_id());
        Ok(Self {
            diner,
            generator: generator_handle,
            generator_thread: Some(generator_thread),
            scheduler,
        })
    }

    pub fn diner(&self) -> &SharedDiner {
        &self.diner
    }

    pub fn generator(&self) -> &GeneratorHandle {
        &self.generator
    }

    pub fn scheduler(&self) -> &SchedulerHandle {
        &self.scheduler
    }

    /// Pause both the tick loop and arrivals
    pub fn pause_game(&self) {
        self.scheduler.pause_game();
        self.generator.pause_generation();
    }

    pub fn resume_game(&self) {
        self.generator.resume_generation();
        self.scheduler.resume_game();
    }

    pub fn is_paused(&self) -> bool {
        self.scheduler.is_paused()
    }

    /// Stop and join both threads. Safe to call more than once.
    pub fn stop(&mut self) {
        self.generator.resume_generation();
        self.generator.stop_generating();
        if let Some(thread) = self.generator_thread.take() {
            join_with_timeout(thread, JOIN_TIMEOUT, "arrival-generator");
        }
        self.scheduler.stop(JOIN_TIMEOUT);
    }
}

impl Drop for DinerSession {
    fn drop(&mut self) {
        self.stop();
    }
}
