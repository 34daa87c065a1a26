//! Metadata storage trait.

use crate::StoreError;

/// Database bookkeeping that belongs to no campaign table: the schema
/// version and the id sequences.
pub trait MetaStore {
    /// Stored schema version, `0` for a fresh database.
    fn schema_version(&self) -> Result<u32, StoreError>;

    fn set_schema_version(&self, version: u32) -> Result<(), StoreError>;

    /// Last value handed out by the named id sequence, `0` if never used.
    fn sequence_value(&self, name: &str) -> Result<u64, StoreError>;
}
