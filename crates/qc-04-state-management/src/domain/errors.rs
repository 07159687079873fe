use super::Height;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Version {version} not found (latest: {latest})")]
    VersionNotFound { version: Height, latest: Height },

    #[error("Initial version must be set before the first commit (latest: {latest})")]
    InitialVersionAfterCommit { latest: Height },

    #[error("Invalid initial version: {0}")]
    InvalidInitialVersion(Height),

    #[error("Cannot prune up to {retain_from}: latest committed version is {latest}")]
    PruneBeyondLatest { retain_from: Height, latest: Height },

    #[error("Database error: {0}")]
    DatabaseError(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
