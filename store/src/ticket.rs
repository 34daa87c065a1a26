//! Ticket storage trait.

use crate::StoreError;
use pmp_types::{TicketCode, Timestamp};
use serde::{Deserialize, Serialize};

/// An issued ticket. Created once, immutable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub code: TicketCode,
    pub created_at: Timestamp,
}

/// Optional inclusive bounds on a ticket's `created_at`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TicketRange {
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
}

impl TicketRange {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn contains(&self, at: Timestamp) -> bool {
        self.from.map_or(true, |from| at >= from) && self.to.map_or(true, |to| at <= to)
    }
}

/// Trait for ticket storage operations.
pub trait TicketStore {
    /// Insert a new ticket.
    ///
    /// Fails with [`StoreError::Duplicate`] if the code already exists; the
    /// existing row is left untouched.
    fn insert_ticket(&self, ticket: &Ticket) -> Result<(), StoreError>;

    fn get_ticket(&self, code: &TicketCode) -> Result<Option<Ticket>, StoreError>;

    fn ticket_exists(&self, code: &TicketCode) -> Result<bool, StoreError> {
        self.get_ticket(code).map(|t| t.is_some())
    }

    /// All ticket codes whose `created_at` falls inside `range`.
    fn ticket_codes(&self, range: TicketRange) -> Result<Vec<TicketCode>, StoreError>;

    fn ticket_count(&self) -> Result<u64, StoreError>;
}
