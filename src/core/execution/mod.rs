pub mod hooks;
pub mod scheduler;
pub mod session;

// Re-export commonly used types
pub use hooks::{FrameHooks, NoopHooks};
pub use scheduler::{clamp_frame_delta, FrameReport, Scheduler, SchedulerHandle};
pub use session::DinerSession;
