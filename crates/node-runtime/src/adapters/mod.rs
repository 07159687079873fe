//! # Adapters
//!
//! Port implementations the devnet node plugs into the block lifecycle.

pub mod devnet_middleware;

pub use devnet_middleware::{DevnetBlock, DevnetMiddleware};
