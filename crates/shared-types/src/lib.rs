//! # Shared Types Crate
//!
//! Domain entities and consensus-engine message types used across the
//! block lifecycle workspace.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Heights, hashes, validator updates and
//!   consensus parameters are defined once here.
//! - **Two validator shapes**: `ValidatorUpdate` is what the state-transition
//!   middleware produces; `AbciValidatorUpdate` is what the consensus engine
//!   consumes. Conversion between them is fallible and lives here.
//! - **Engine messages** (`abci`) mirror the standard application callback
//!   contract: init, info, prepare, process, finalize, commit.

pub mod abci;
pub mod entities;
pub mod errors;

pub use abci::*;
pub use entities::*;
pub use errors::*;
