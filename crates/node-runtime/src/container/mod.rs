//! # Node Container
//!
//! Configuration for the devnet node.

pub mod config;

pub use config::{ConfigError, NodeConfig};
