pub mod arrivals;
pub mod config;
pub mod customer;
pub mod diner_state;
pub mod error;
pub mod execution;
pub mod highscore;
pub mod scoreboard;
pub mod table;
pub mod types;

#[cfg(test)]
mod tests;
