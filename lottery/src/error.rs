use pmp_crypto::EntropyError;
use pmp_guard::GuardError;
use pmp_store::StoreError;
use pmp_types::LotteryId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LotteryError {
    #[error("Lottery name is required")]
    EmptyName,

    #[error("Lottery not found")]
    LotteryNotFound(LotteryId),

    #[error("Winner count must be between 1 and {max}")]
    InvalidCount { count: u32, max: u32 },

    #[error("No tickets found")]
    NoTickets,

    #[error("No available tickets (all already selected)")]
    NoAvailableTickets,

    #[error("Invalid ticket code format")]
    InvalidTicketCode,

    /// Too many claim attempts from one IP.
    #[error("{0}")]
    RateLimited(String),

    #[error("lottery storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("draw entropy error: {0}")]
    Entropy(#[from] EntropyError),

    #[error("guard error: {0}")]
    Guard(#[from] GuardError),
}
