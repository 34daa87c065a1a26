//! The ticket issuer.

use std::sync::Arc;

use pmp_crypto::EntropySource;
use pmp_store::{Ticket, TicketStore};
use pmp_types::{TicketCode, Timestamp, TICKET_SYMBOLS};

use crate::IssueError;

/// Upper bound on code generations per issued ticket.
pub const MAX_ISSUE_ATTEMPTS: u32 = 10;

/// A freshly persisted ticket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuedTicket {
    pub ticket: Ticket,
    /// Codes that were drawn and found already taken before this one.
    pub collisions: u32,
}

/// Generates and persists unique ticket codes.
#[derive(Clone)]
pub struct TicketIssuer {
    entropy: Arc<dyn EntropySource>,
}

impl TicketIssuer {
    pub fn new(entropy: Arc<dyn EntropySource>) -> Self {
        Self { entropy }
    }

    /// Draw a random code. Not checked against the store.
    pub fn generate(&self) -> Result<TicketCode, IssueError> {
        let seed = self.entropy.seed()?;
        let mut symbols = [0u8; TICKET_SYMBOLS];
        symbols.copy_from_slice(&seed[..TICKET_SYMBOLS]);
        Ok(TicketCode::from_entropy(&symbols))
    }

    /// Generate a code and persist it as a new ticket stamped `now`.
    ///
    /// A uniqueness violation draws a new code. Any other storage error ends
    /// the call immediately.
    pub fn issue<S: TicketStore + ?Sized>(
        &self,
        store: &S,
        now: Timestamp,
    ) -> Result<IssuedTicket, IssueError> {
        for attempt in 1..=MAX_ISSUE_ATTEMPTS {
            let ticket = Ticket {
                code: self.generate()?,
                created_at: now,
            };
            match store.insert_ticket(&ticket) {
                Ok(()) => {
                    tracing::debug!(attempt, "ticket issued");
                    return Ok(IssuedTicket {
                        ticket,
                        collisions: attempt - 1,
                    });
                }
                Err(e) if e.is_duplicate() => {
                    tracing::warn!(attempt, "ticket code collision, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }
        tracing::error!(
            attempts = MAX_ISSUE_ATTEMPTS,
            source = self.entropy.name(),
            "ticket issuance exhausted"
        );
        Err(IssueError::Exhausted(MAX_ISSUE_ATTEMPTS))
    }
}

/// Syntax check for user-supplied codes: trim, upper-case, then match
/// `PMP-XXXX-XXXX` over the ticket alphabet.
pub fn validate(code: &str) -> bool {
    TicketCode::is_valid(code)
}
