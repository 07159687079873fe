//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Chain**: `Height`, `Hash`, `BlockTime`, `CommitId`
//! - **Validators**: `BlsPubkey`, `ValidatorUpdate`, `AbciValidatorUpdate`
//! - **Chain Parameters**: `ConsensusParams` and its sections

use crate::errors::ValidatorUpdateError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use std::fmt;

// =============================================================================
// CLUSTER A: THE CHAIN
// =============================================================================

/// A 32-byte content hash.
pub type Hash = [u8; 32];

/// Block position in the chain. Height 0 is never a valid block.
pub type Height = u64;

/// Wall-clock time attached to a block by the consensus engine.
pub type BlockTime = DateTime<Utc>;

/// The all-zero hash, reported before anything has been committed.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Identifies one committed version of the state store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommitId {
    /// Committed version (equal to the block height that produced it).
    pub version: Height,
    /// Content hash of the store at that version.
    pub hash: Hash,
}

impl CommitId {
    pub fn new(version: Height, hash: Hash) -> Self {
        Self { version, hash }
    }

    /// True before the first commit.
    pub fn is_empty(&self) -> bool {
        self.version == 0
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.version, hex::encode(self.hash))
    }
}

// =============================================================================
// CLUSTER B: VALIDATORS
// =============================================================================

/// Length of a compressed BLS12-381 public key.
pub const BLS_PUBKEY_LEN: usize = 48;

/// Key type tag the consensus engine uses for BLS12-381 keys.
pub const BLS12_381_KEY_TYPE: &str = "bls12_381";

/// A compressed BLS12-381 public key.
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlsPubkey(#[serde_as(as = "Bytes")] pub [u8; BLS_PUBKEY_LEN]);

impl BlsPubkey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for BlsPubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlsPubkey(0x{})", hex::encode(&self.0[..8]))
    }
}

impl From<[u8; BLS_PUBKEY_LEN]> for BlsPubkey {
    fn from(bytes: [u8; BLS_PUBKEY_LEN]) -> Self {
        Self(bytes)
    }
}

/// Validator set delta produced by the state-transition middleware.
///
/// `effective_balance` is denominated in Gwei and becomes voting power
/// one-to-one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorUpdate {
    pub pubkey: BlsPubkey,
    pub effective_balance: u64,
}

impl ValidatorUpdate {
    pub fn new(pubkey: impl Into<BlsPubkey>, effective_balance: u64) -> Self {
        Self {
            pubkey: pubkey.into(),
            effective_balance,
        }
    }
}

/// Validator set delta in the shape the consensus engine consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbciValidatorUpdate {
    pub pub_key_bytes: Vec<u8>,
    pub pub_key_type: String,
    pub power: i64,
}

impl AbciValidatorUpdate {
    pub fn new(pub_key_bytes: impl Into<Vec<u8>>, pub_key_type: impl Into<String>, power: i64) -> Self {
        Self {
            pub_key_bytes: pub_key_bytes.into(),
            pub_key_type: pub_key_type.into(),
            power,
        }
    }

    /// Convert a middleware update, tagging the key with `key_type`.
    pub fn try_from_update(
        update: &ValidatorUpdate,
        key_type: &str,
    ) -> Result<Self, ValidatorUpdateError> {
        let power = i64::try_from(update.effective_balance).map_err(|_| {
            ValidatorUpdateError::PowerOverflow {
                pubkey: hex::encode(update.pubkey.as_bytes()),
                effective_balance: update.effective_balance,
            }
        })?;
        Ok(Self::new(update.pubkey.as_bytes(), key_type, power))
    }
}

/// Sort a validator list into canonical order: public key bytes, then key
/// type, then power. Duplicate keys still land in a fixed order.
pub fn sort_validator_updates(updates: &mut [AbciValidatorUpdate]) {
    updates.sort_by(|a, b| {
        a.pub_key_bytes
            .cmp(&b.pub_key_bytes)
            .then_with(|| a.pub_key_type.cmp(&b.pub_key_type))
            .then_with(|| a.power.cmp(&b.power))
    });
}

// =============================================================================
// CLUSTER C: CHAIN PARAMETERS
// =============================================================================

/// Chain-wide parameters agreed through consensus. May change over the
/// life of the chain, so readers fetch them fresh when needed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConsensusParams {
    pub block: BlockParams,
    pub evidence: EvidenceParams,
    pub validator: ValidatorParams,
    pub version: VersionParams,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockParams {
    pub max_bytes: i64,
    /// -1 means unlimited.
    pub max_gas: i64,
}

impl Default for BlockParams {
    fn default() -> Self {
        Self {
            max_bytes: 22_020_096,
            max_gas: -1,
        }
    }
}

/// Evidence aging. Evidence older than both limits is no longer valid, so
/// blocks older than `max_age_num_blocks` need not be retained for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceParams {
    pub max_age_num_blocks: u64,
    pub max_age_duration_secs: u64,
    pub max_bytes: i64,
}

impl Default for EvidenceParams {
    fn default() -> Self {
        Self {
            max_age_num_blocks: 100_000,
            max_age_duration_secs: 48 * 60 * 60,
            max_bytes: 1_048_576,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorParams {
    pub pub_key_types: Vec<String>,
}

impl Default for ValidatorParams {
    fn default() -> Self {
        Self {
            pub_key_types: vec![BLS12_381_KEY_TYPE.to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VersionParams {
    pub app: u64,
}
