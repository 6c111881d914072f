//! State module for tracking sync progress
//!
//! # Components
//!
//! - `CyclePhase`: Phase of the running sync cycle (idle, enumerating, scraping, pruning)
//! - `CycleMachine`: Guards phase transitions within one cycle
//! - `UpsertOutcome`: Result classification of a single listing upsert

mod cycle_phase;
mod outcome;

// Re-export main types
pub use cycle_phase::{CycleMachine, CyclePhase};
pub use outcome::UpsertOutcome;
