//! # Error Types
//!
//! Errors raised by shared-type conversions.

use thiserror::Error;

/// Errors converting a middleware validator update for the consensus engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidatorUpdateError {
    /// Effective balance does not fit the engine's signed 64-bit power.
    #[error("Validator {pubkey}: effective balance {effective_balance} overflows voting power")]
    PowerOverflow {
        pubkey: String,
        effective_balance: u64,
    },
}
