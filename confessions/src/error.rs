use pmp_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// Malformed code, or a well-formed code that was never issued.
    #[error("Invalid or unknown ticket.")]
    UnknownTicket,

    #[error("ledger storage error: {0}")]
    Storage(#[from] StoreError),
}
