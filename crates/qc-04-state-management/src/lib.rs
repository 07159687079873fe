//! # qc-04-state-management
//!
//! Multi-version state store for the Quantum-Chain block lifecycle.
//!
//! ## Role in System
//!
//! - **Working layer**: a single uncommitted key space that finalized blocks
//!   are flushed into before the durable commit.
//! - **Branches**: copy-on-write write buffers (`CacheBranch`) over the
//!   working layer, one per consensus phase. Dropping a branch discards its
//!   writes; `write()` merges them into the working layer.
//! - **Versions**: every commit freezes the working layer as version
//!   `N`, addressable by height and identified by its content hash.
//!   Historical versions are served as read-only `StoreView`s.
//!
//! ```text
//!   CacheBranch (prepare)   CacheBranch (process)   CacheBranch (finalize)
//!        │ discard               │ discard                 │ write()
//!        └───────────────────────┴─────────────────────────↓
//!                                               [ working layer ] ── commit() ──→ version N
//!                                                                                    │
//!                                                               load_at_version(N) ←─┘
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::*;
pub use domain::*;
pub use ports::*;
