//! Ports for the Block Lifecycle subsystem

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
