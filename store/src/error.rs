use thiserror::Error;

/// Failure of a campaign storage operation.
///
/// Only [`StoreError::Duplicate`] is expected in normal operation; callers
/// turn it into a retry (ticket codes) or a business verdict (votes,
/// winners). Everything else is an infrastructure fault.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    Duplicate(String),

    #[error("storage unavailable: {0}")]
    Backend(String),

    #[error("record encoding failed: {0}")]
    Serialization(String),

    /// An index points at a row that is not there.
    #[error("inconsistent records: {0}")]
    Corruption(String),
}

impl StoreError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::Duplicate(_))
    }
}
