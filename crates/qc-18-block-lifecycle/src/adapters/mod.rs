//! Adapters for the Block Lifecycle ports

pub mod param_store;

pub use param_store::SharedParamStore;
