use crate::core::diner_state::SharedDiner;
use log::error;
use std::panic::{self, AssertUnwindSafe};

/// Callbacks the tick loop makes into presentation and feedback collaborators.
///
/// Every method has a no-op default so collaborators implement only what
/// they care about. All calls happen on the scheduler thread.
pub trait FrameHooks: Send {
    /// Called exactly once per game-over transition
    fn on_game_over(&mut self, _final_score: u32, _new_high_score: bool) {}

    /// Customers who left angry during the last tick (sound/vibration)
    fn on_angry_leave(&mut self, _count: u32) {}

    /// Per-frame presentation update (animations, interpolation)
    fn update_view(&mut self, _dt: f32) {}

    /// Arrival intake on the fixed interval. Returns how many customers moved.
    fn trigger_process_arrivals(&mut self, diner: &SharedDiner) -> usize {
        diner.lock().process_arrivals()
    }

    fn render(&mut self, _diner: &SharedDiner) {}
}

/// Hooks that only perform the default arrival intake
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl FrameHooks for NoopHooks {}

/// Run a collaborator callback, logging instead of unwinding through the loop
pub(crate) fn guarded<R>(name: &str, f: impl FnOnce() -> R) -> Option<R> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(_) => {
            error!("[Scheduler] Exception during {}", name);
            None
        }
    }
}
