//! Confession storage trait.

use crate::StoreError;
use pmp_types::{ConfessionId, IdentityHash, Timestamp};
use serde::{Deserialize, Serialize};

/// A stored confession. Text is never edited after insertion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confession {
    pub id: ConfessionId,
    pub text: String,
    pub text_hash: IdentityHash,
    pub created_at: Timestamp,
}

/// Trait for confession storage operations.
pub trait ConfessionStore {
    /// Insert a confession and return its newly assigned id.
    fn insert_confession(
        &self,
        text: &str,
        text_hash: &IdentityHash,
        created_at: Timestamp,
    ) -> Result<ConfessionId, StoreError>;

    fn get_confession(&self, id: ConfessionId) -> Result<Option<Confession>, StoreError>;

    fn confession_exists(&self, id: ConfessionId) -> Result<bool, StoreError> {
        self.get_confession(id).map(|c| c.is_some())
    }

    /// A window of confessions, newest `created_at` first.
    fn list_confessions(&self, offset: u64, limit: u64) -> Result<Vec<Confession>, StoreError>;

    fn confession_count(&self) -> Result<u64, StoreError>;
}
