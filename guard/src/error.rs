use pmp_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GuardError {
    #[error("guard storage error: {0}")]
    Storage(#[from] StoreError),
}
