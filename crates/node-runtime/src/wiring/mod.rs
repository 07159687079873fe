//! # Wiring
//!
//! Drives the block lifecycle the way a consensus engine would.

pub mod driver;
pub mod runner;

pub use driver::{BlockSummary, HeightDriver, MAX_ROUNDS};
pub use runner::run_until_shutdown;
