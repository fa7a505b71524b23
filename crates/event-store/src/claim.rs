use serde::{Deserialize, Serialize};

/// A change to a named unique claim, applied atomically with an append.
///
/// A claim key can be held by at most one aggregate at a time. Acquiring a
/// key already held by the appending aggregate is a no-op; acquiring a key
/// held by another aggregate fails the whole append with
/// [`EventStoreError::ClaimConflict`](crate::EventStoreError::ClaimConflict).
/// Releasing a key the aggregate does not hold is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimChange {
    Acquire(String),
    Release(String),
}

impl ClaimChange {
    pub fn key(&self) -> &str {
        match self {
            ClaimChange::Acquire(key) | ClaimChange::Release(key) => key,
        }
    }
}
