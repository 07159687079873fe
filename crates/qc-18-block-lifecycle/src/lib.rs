//! # qc-18-block-lifecycle
//!
//! Application side of the consensus engine's block lifecycle.
//!
//! ## Overview
//!
//! This subsystem provides:
//! - **Phase orchestration**: InitChain, PrepareProposal, ProcessProposal,
//!   FinalizeBlock and Commit, each against its own isolated state
//! - **Retention policy**: the lowest height the engine must keep after a commit
//! - **Historical queries**: read-only views of committed heights, served
//!   concurrently with block execution
//!
//! ## Architecture
//!
//! ```text
//! Consensus Engine ──phase calls──→ BlockLifecycle ──PhaseState──→ Middleware
//!                                        │
//!                                        ├── branch / commit ──→ VersionedStore (4)
//!                                        │
//!                                        └── params ──→ ParamStore
//!
//! RPC readers ──→ QueryService ──load_at_version──→ VersionedStore (4)
//! ```
//!
//! ## State Isolation
//!
//! | Phase | Sees | Writes reach the store |
//! |-------|------|------------------------|
//! | PrepareProposal | working layer (+ genesis at the initial height) | never |
//! | ProcessProposal | working layer (+ genesis at the initial height) | never |
//! | FinalizeBlock | Finalize slot | on success, before Commit |
//!
//! ## Example
//!
//! ```rust,ignore
//! use qc_18_block_lifecycle::{BlockLifecycle, LifecycleConfig, LifecycleDependencies};
//! use qc_18_block_lifecycle::ports::BlockLifecycleApi;
//!
//! let mut lifecycle = BlockLifecycle::new(
//!     LifecycleConfig::from_env(),
//!     LifecycleDependencies { store, middleware, params },
//! );
//!
//! lifecycle.init_chain(&genesis)?;
//! let proposal = lifecycle.prepare_proposal(&prepare)?;
//! let finalized = lifecycle.finalize_block(&finalize)?;
//! let committed = lifecycle.commit()?;
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod query;
pub mod service;

pub use adapters::SharedParamStore;
pub use config::LifecycleConfig;
pub use domain::{
    retention_height, Phase, PhaseContext, PhaseState, RetentionPolicy, Slot, TransitionFlags,
};
pub use error::{LifecycleError, LifecycleResult, MiddlewareError, ValidatorSetMismatch};
pub use ports::{BlockLifecycleApi, BuiltProposal, Middleware, ParamStore, SlotData};
pub use query::{QueryContext, QueryService};
pub use service::{BlockLifecycle, LifecycleDependencies, LifecycleStatus};
