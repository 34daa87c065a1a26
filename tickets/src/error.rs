use pmp_crypto::EntropyError;
use pmp_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("no unique ticket code after {0} attempts")]
    Exhausted(u32),

    #[error("ticket storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("entropy error: {0}")]
    Entropy(#[from] EntropyError),
}
