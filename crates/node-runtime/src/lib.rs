//! # Node Runtime Library
//!
//! Single-node devnet around the block lifecycle. The binary in `main.rs`
//! loads configuration, builds genesis, and drives one height per block
//! interval; the pieces are exposed here for testing.

pub mod adapters;
pub mod container;
pub mod genesis;
pub mod logging;
pub mod wiring;

pub use container::{ConfigError, NodeConfig};
pub use wiring::{run_until_shutdown, BlockSummary, HeightDriver};
