//! Top-level error type shared across crates.

use thiserror::Error;

/// Errors raised while parsing the fundamental types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PmpError {
    #[error("invalid ticket code format")]
    InvalidTicketCode,

    #[error("invalid identity hash: {0}")]
    InvalidHash(String),

    #[error("invalid id: {0}")]
    InvalidId(String),
}
