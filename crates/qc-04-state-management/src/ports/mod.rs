//! # Ports
//!
//! - `database`: the `VersionedStore` capability set consumed by the block
//!   lifecycle, and the `WorkingLayer` that branches read through and flush into.

pub mod database;

pub use database::*;
