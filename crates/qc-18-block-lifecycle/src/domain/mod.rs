//! Domain layer for the Block Lifecycle subsystem

pub mod genesis;
pub mod phase;
pub mod retention;
pub mod validation;

pub use genesis::*;
pub use phase::*;
pub use retention::*;
pub use validation::*;
