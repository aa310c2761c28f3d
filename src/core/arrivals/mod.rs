//! Customer arrivals: the bounded hand-off queue and the background
//! generator that feeds it.

pub mod generator;
pub mod queue;

pub use generator::{ArrivalGenerator, GeneratorHandle, ScoreProbe, SleepBounds};
pub use queue::ArrivalQueue;
