//! Request validation for the lifecycle entry points
//!
//! - Height checks shared by every phase
//! - The FinalizeBlock sequencing rule
//! - Conversion and reconciliation of validator sets

use super::phase::Phase;
use crate::error::{LifecycleError, LifecycleResult, ValidatorSetMismatch};
use rayon::prelude::*;
use shared_types::{
    sort_validator_updates, AbciValidatorUpdate, Height, ValidatorUpdate, ValidatorUpdateError,
};

/// Validator lists at or above this size are converted in parallel
pub const PARALLEL_THRESHOLD: usize = 128;

/// Reject heights below 1 for any phase request.
pub fn ensure_valid_height(phase: Phase, height: Height) -> LifecycleResult<()> {
    if height < 1 {
        return Err(LifecycleError::InvalidHeight { phase, height });
    }
    Ok(())
}

/// Height FinalizeBlock must carry next.
///
/// Before the first commit this is the chain's initial height; afterwards it
/// is always the height after the last committed one.
pub fn expected_finalize_height(last_committed: Height, initial_height: Height) -> Height {
    if last_committed == 0 {
        initial_height
    } else {
        last_committed + 1
    }
}

pub fn ensure_finalize_height(
    height: Height,
    last_committed: Height,
    initial_height: Height,
) -> LifecycleResult<()> {
    ensure_valid_height(Phase::Finalize, height)?;

    let expected = expected_finalize_height(last_committed, initial_height);
    if height != expected {
        return Err(LifecycleError::HeightMismatch {
            expected,
            actual: height,
        });
    }
    Ok(())
}

/// Convert middleware validator updates into the engine's shape.
///
/// Output order always matches input order.
pub fn convert_validator_updates(
    updates: &[ValidatorUpdate],
    key_type: &str,
) -> Result<Vec<AbciValidatorUpdate>, ValidatorUpdateError> {
    if updates.len() >= PARALLEL_THRESHOLD {
        updates
            .par_iter()
            .map(|update| AbciValidatorUpdate::try_from_update(update, key_type))
            .collect()
    } else {
        updates
            .iter()
            .map(|update| AbciValidatorUpdate::try_from_update(update, key_type))
            .collect()
    }
}

/// Check that genesis produced exactly the validator set the engine expects.
///
/// Both lists are compared in canonical order, so neither side needs to be
/// sorted by the caller. An empty `expected` list accepts anything.
pub fn reconcile_validator_sets(
    expected: &[AbciValidatorUpdate],
    computed: &[AbciValidatorUpdate],
) -> Result<(), ValidatorSetMismatch> {
    if expected.is_empty() {
        return Ok(());
    }
    if expected.len() != computed.len() {
        return Err(ValidatorSetMismatch::Count {
            expected: expected.len(),
            actual: computed.len(),
        });
    }

    let mut expected = expected.to_vec();
    let mut computed = computed.to_vec();
    sort_validator_updates(&mut expected);
    sort_validator_updates(&mut computed);

    for (index, (want, got)) in expected.iter().zip(&computed).enumerate() {
        if want.power != got.power {
            return Err(ValidatorSetMismatch::Power {
                index,
                expected: want.power,
                actual: got.power,
            });
        }
        if want.pub_key_bytes != got.pub_key_bytes {
            return Err(ValidatorSetMismatch::PubKeyBytes { index });
        }
        if want.pub_key_type != got.pub_key_type {
            return Err(ValidatorSetMismatch::PubKeyType {
                index,
                expected: want.pub_key_type.clone(),
                actual: got.pub_key_type.clone(),
            });
        }
    }
    Ok(())
}
