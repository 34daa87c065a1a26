//! Unlock-attempt log, kept apart from the submission guard log.

use crate::StoreError;
use pmp_types::{IdentityHash, Timestamp};

/// Per-IP counter of claim attempts, bucketed by second.
pub trait AttemptStore {
    /// Record one attempt by `ip_hash` at `at`.
    fn record_attempt(&self, ip_hash: &IdentityHash, at: Timestamp) -> Result<(), StoreError>;

    /// Number of attempts by `ip_hash` with a timestamp `>= cutoff`.
    fn attempts_since(&self, ip_hash: &IdentityHash, cutoff: Timestamp)
        -> Result<u64, StoreError>;
}
