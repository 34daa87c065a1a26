//! Submission guard log.

use crate::StoreError;
use pmp_types::{IdentityHash, Timestamp};
use serde::{Deserialize, Serialize};

/// One accepted confession attempt. Append-only, never updated or deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardRecord {
    pub ip_hash: IdentityHash,
    pub fp_hash: IdentityHash,
    pub text_hash: IdentityHash,
    pub created_at: Timestamp,
}

/// Trait for the append-only submission guard log.
pub trait GuardStore {
    /// Append a record. Records with identical content are kept as separate rows.
    fn append_guard_record(&self, record: &GuardRecord) -> Result<(), StoreError>;

    /// Every record with `created_at >= cutoff`, oldest first.
    fn guard_records_since(&self, cutoff: Timestamp) -> Result<Vec<GuardRecord>, StoreError>;
}
