pub mod core;

// Re-export commonly used types
pub use crate::core::arrivals::{ArrivalGenerator, ArrivalQueue, GeneratorHandle, ScoreProbe, SleepBounds};
pub use crate::core::config::{ArrivalTiming, DinerConfig, FrameTiming, Progression, ServiceTiming};
pub use crate::core::customer::{Customer, CustomerFactory};
pub use crate::core::diner_state::{
    CustomerView, DinerLayout, DinerSnapshot, DinerState, SharedDiner, TableView,
};
pub use crate::core::error::{DinerError, DinerResult};
pub use crate::core::execution::{
    DinerSession, FrameHooks, FrameReport, NoopHooks, Scheduler, SchedulerHandle,
};
pub use crate::core::highscore::{HighScoreKeeper, HighScoreStore, InMemoryHighScore};
pub use crate::core::scoreboard::ScoreBoard;
pub use crate::core::table::Table;
pub use crate::core::types::{CustomerId, CustomerState, CustomerType, TableBounds, TableId};
