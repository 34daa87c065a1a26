//! Vote ledger storage trait.

use std::collections::HashMap;

use crate::StoreError;
use pmp_types::{ConfessionId, TicketCode};
use serde::{Deserialize, Serialize};

/// A single vote. At most one exists per ticket code, across all confessions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub ticket_code: TicketCode,
    pub confession_id: ConfessionId,
}

/// Trait for vote storage operations.
pub trait VoteStore {
    /// Insert a vote.
    ///
    /// Fails with [`StoreError::Duplicate`] if the ticket has already voted,
    /// whichever confession that vote went to.
    fn insert_vote(&self, vote: &Vote) -> Result<(), StoreError>;

    /// The confession this ticket voted for, if any.
    fn vote_of(&self, ticket_code: &TicketCode) -> Result<Option<ConfessionId>, StoreError>;

    /// Vote totals for the given confessions. Ids without votes are absent.
    fn vote_counts(&self, ids: &[ConfessionId]) -> Result<HashMap<ConfessionId, u64>, StoreError>;
}
