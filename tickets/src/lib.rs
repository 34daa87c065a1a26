//! Ticket issuance.
//!
//! Every accepted confession receives one `PMP-XXXX-XXXX` code. Codes carry
//! 40 bits of randomness; uniqueness is enforced by the ticket store, and a
//! collision simply draws a new code, up to [`MAX_ISSUE_ATTEMPTS`] times.

pub mod error;
pub mod issuer;

pub use error::IssueError;
pub use issuer::{validate, IssuedTicket, TicketIssuer, MAX_ISSUE_ATTEMPTS};
