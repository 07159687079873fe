//! # Genesis Module
//!
//! Deterministic devnet genesis: the InitChain request the node feeds its own
//! lifecycle on first start.
//!
//! ## Layout
//!
//! ```text
//! app_state_bytes = {
//!   "<genesis module>": {
//!     "validators": [ { "pubkey": "0x…", "effective_balance": … }, … ]
//!   }
//! }
//! ```

pub mod builder;

pub use builder::{DevnetGenesis, GenesisError, GenesisState, GenesisValidator};
