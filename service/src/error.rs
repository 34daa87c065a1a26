//! Error taxonomy surfaced to callers.
//!
//! Business refusals ("not a winner", "already voted", "already claimed")
//! are successful outcomes and never appear here.

use thiserror::Error;

use pmp_confessions::LedgerError;
use pmp_guard::{ContentError, GuardError};
use pmp_lottery::LotteryError;
use pmp_store::StoreError;
use pmp_tickets::IssueError;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Bad input; the message is safe to echo.
    #[error("{0}")]
    Validation(String),

    /// A guard refused the request; the message is the guard's reason.
    #[error("{0}")]
    RateLimited(String),

    #[error("{0}")]
    NotFound(String),

    /// A uniqueness conflict that was not recovered locally.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl ServiceError {
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::Validation(_) => 400,
            ServiceError::RateLimited(_) => 429,
            ServiceError::NotFound(_) => 404,
            ServiceError::Conflict(_) => 409,
            ServiceError::Configuration(_) | ServiceError::Storage(_) => 500,
        }
    }

    /// Message returned to the caller. Internal detail stays in the logs.
    pub fn public_message(&self) -> String {
        match self {
            ServiceError::Configuration(_) => "Server configuration error".to_string(),
            ServiceError::Storage(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    /// Label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation",
            ServiceError::RateLimited(_) => "rate_limited",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::Configuration(_) => "configuration",
            ServiceError::Storage(_) => "storage",
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate(msg) => ServiceError::Conflict(msg),
            other => ServiceError::Storage(other.to_string()),
        }
    }
}

impl From<GuardError> for ServiceError {
    fn from(e: GuardError) -> Self {
        ServiceError::Storage(e.to_string())
    }
}

impl From<ContentError> for ServiceError {
    fn from(e: ContentError) -> Self {
        ServiceError::Validation(e.to_string())
    }
}

impl From<IssueError> for ServiceError {
    fn from(e: IssueError) -> Self {
        match e {
            IssueError::Storage(store) => store.into(),
            other => ServiceError::Storage(other.to_string()),
        }
    }
}

impl From<LedgerError> for ServiceError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::UnknownTicket => ServiceError::Validation(e.to_string()),
            LedgerError::Storage(store) => store.into(),
        }
    }
}

impl From<LotteryError> for ServiceError {
    fn from(e: LotteryError) -> Self {
        match e {
            LotteryError::EmptyName
            | LotteryError::InvalidCount { .. }
            | LotteryError::NoTickets
            | LotteryError::NoAvailableTickets
            | LotteryError::InvalidTicketCode => ServiceError::Validation(e.to_string()),
            LotteryError::LotteryNotFound(_) => ServiceError::NotFound(e.to_string()),
            LotteryError::RateLimited(reason) => ServiceError::RateLimited(reason),
            LotteryError::Storage(store) => store.into(),
            LotteryError::Entropy(_) | LotteryError::Guard(_) => {
                ServiceError::Storage(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmp_types::LotteryId;

    #[test]
    fn status_codes() {
        assert_eq!(ServiceError::Validation("x".into()).status_code(), 400);
        assert_eq!(ServiceError::RateLimited("x".into()).status_code(), 429);
        assert_eq!(ServiceError::NotFound("x".into()).status_code(), 404);
        assert_eq!(ServiceError::Conflict("x".into()).status_code(), 409);
        assert_eq!(ServiceError::Storage("x".into()).status_code(), 500);
    }

    #[test]
    fn internal_detail_is_hidden() {
        let e = ServiceError::Storage("MDB_MAP_FULL at /var/lib/pmp".into());
        assert_eq!(e.public_message(), "Internal server error");
        let e = ServiceError::Configuration("ip_hash_salt missing".into());
        assert_eq!(e.public_message(), "Server configuration error");
    }

    #[test]
    fn lottery_errors_map_to_kinds() {
        let e: ServiceError = LotteryError::LotteryNotFound(LotteryId::new(3)).into();
        assert_eq!(e.status_code(), 404);
        assert_eq!(e.public_message(), "Lottery not found");

        let e: ServiceError = LotteryError::NoAvailableTickets.into();
        assert_eq!(e.status_code(), 400);
        assert_eq!(
            e.public_message(),
            "No available tickets (all already selected)"
        );
    }
}
