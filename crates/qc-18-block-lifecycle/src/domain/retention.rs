//! # Retention Policy
//!
//! Decides the lowest block height the consensus engine must keep after a
//! commit. Two floors compete:
//!
//! - **Evidence floor**: `commit - evidence_max_age_blocks`. Evidence older
//!   than this can no longer be submitted, so its blocks are not needed.
//! - **Local floor**: `commit - min_retain_blocks`, the operator's minimum.
//!
//! The retain height is the smaller of the non-zero floors, so the policy
//! never discards more than either rule allows. A result of 0 retains
//! everything.
//!
//! Arithmetic is signed: a floor below zero is a real candidate (it wins the
//! minimum) rather than wrapping or saturating to a large height.

use shared_types::Height;

/// Inputs to the retention computation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Local retention floor in blocks. 0 disables pruning entirely.
    pub min_retain_blocks: u64,
    /// Evidence max age in blocks. 0 means evidence imposes no floor.
    pub evidence_max_age_blocks: u64,
}

impl RetentionPolicy {
    pub fn new(min_retain_blocks: u64, evidence_max_age_blocks: u64) -> Self {
        Self {
            min_retain_blocks,
            evidence_max_age_blocks,
        }
    }

    /// Lowest height to retain after committing `commit_height`.
    pub fn retain_height(&self, commit_height: Height) -> Height {
        retention_height(
            commit_height,
            self.evidence_max_age_blocks,
            self.min_retain_blocks,
        )
    }
}

/// Lowest height to retain after committing `commit_height`; 0 retains all.
pub fn retention_height(
    commit_height: Height,
    evidence_max_age_blocks: u64,
    min_retain_blocks: u64,
) -> Height {
    if min_retain_blocks == 0 {
        return 0;
    }

    let commit = i128::from(commit_height);
    let evidence_floor = if evidence_max_age_blocks > 0 {
        commit - i128::from(evidence_max_age_blocks)
    } else {
        0
    };
    let local_floor = commit - i128::from(min_retain_blocks);

    let retain = min_non_zero(evidence_floor, local_floor);
    if retain <= 0 {
        0
    } else {
        // retain <= commit_height, so it fits
        retain as Height
    }
}

/// Smaller of two candidates, treating 0 as "no candidate".
fn min_non_zero(a: i128, b: i128) -> i128 {
    match (a, b) {
        (0, b) => b,
        (a, 0) => a,
        (a, b) => a.min(b),
    }
}
