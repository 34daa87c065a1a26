//! Confession submission, paging and voting.

use std::collections::HashMap;

use serde::Serialize;

use pmp_store::{Confession, ConfessionStore, TicketStore, Vote, VoteStore};
use pmp_types::{ConfessionId, IdentityHash, TicketCode, Timestamp};

use crate::LedgerError;

pub const DEFAULT_PAGE_LIMIT: u64 = 100;
pub const MAX_PAGE_LIMIT: u64 = 500;

/// A confession as shown in the feed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConfessionView {
    pub id: ConfessionId,
    pub text: String,
    pub created_at: Timestamp,
    pub vote_count: u64,
    pub voted_by_me: bool,
}

/// One page of the feed, seen through a ticket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BrowsePage {
    pub confessions: Vec<ConfessionView>,
    /// The confession this ticket voted for, on this page or not.
    pub voted_confession_id: Option<ConfessionId>,
}

/// Result of a vote request that reached the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteOutcome {
    Recorded,
    AlreadyVoted,
    UnknownConfession,
}

impl VoteOutcome {
    pub fn message(&self) -> Option<&'static str> {
        match self {
            VoteOutcome::Recorded => None,
            VoteOutcome::AlreadyVoted => Some("You have already used your vote."),
            VoteOutcome::UnknownConfession => Some("Confession not found."),
        }
    }
}

/// Stateless facade over the confession and vote stores.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConfessionLedger;

impl ConfessionLedger {
    /// Clamp a requested page size: `None` or `0` means the default.
    pub fn page_limit(requested: Option<u64>) -> u64 {
        match requested {
            None | Some(0) => DEFAULT_PAGE_LIMIT,
            Some(n) => n.min(MAX_PAGE_LIMIT),
        }
    }

    /// Store a confession. `text` is expected to be validated and trimmed.
    pub fn submit<S: ConfessionStore + ?Sized>(
        &self,
        store: &S,
        text: &str,
        text_hash: &IdentityHash,
        now: Timestamp,
    ) -> Result<ConfessionId, LedgerError> {
        let id = store.insert_confession(text, text_hash, now)?;
        tracing::debug!(confession_id = %id, "confession stored");
        Ok(id)
    }

    /// Newest-first window of confessions.
    pub fn list_page<S: ConfessionStore + ?Sized>(
        &self,
        store: &S,
        offset: u64,
        limit: Option<u64>,
    ) -> Result<Vec<Confession>, LedgerError> {
        Ok(store.list_confessions(offset, Self::page_limit(limit))?)
    }

    pub fn vote_counts<S: VoteStore + ?Sized>(
        &self,
        store: &S,
        ids: &[ConfessionId],
    ) -> Result<HashMap<ConfessionId, u64>, LedgerError> {
        Ok(store.vote_counts(ids)?)
    }

    pub fn vote_of<S: VoteStore + ?Sized>(
        &self,
        store: &S,
        code: &TicketCode,
    ) -> Result<Option<ConfessionId>, LedgerError> {
        Ok(store.vote_of(code)?)
    }

    pub fn confession_exists<S: ConfessionStore + ?Sized>(
        &self,
        store: &S,
        id: ConfessionId,
    ) -> Result<bool, LedgerError> {
        Ok(store.confession_exists(id)?)
    }

    /// Resolve user input to an issued ticket.
    pub fn check_ticket<S: TicketStore + ?Sized>(
        &self,
        store: &S,
        raw: &str,
    ) -> Result<TicketCode, LedgerError> {
        let code = TicketCode::parse(raw).map_err(|_| LedgerError::UnknownTicket)?;
        if !store.ticket_exists(&code)? {
            return Err(LedgerError::UnknownTicket);
        }
        Ok(code)
    }

    /// Record the ticket's single vote.
    ///
    /// A prior vote, or losing a concurrent race for the same ticket, yields
    /// [`VoteOutcome::AlreadyVoted`].
    pub fn cast_vote<S: ConfessionStore + VoteStore + ?Sized>(
        &self,
        store: &S,
        code: &TicketCode,
        confession_id: ConfessionId,
    ) -> Result<VoteOutcome, LedgerError> {
        if !store.confession_exists(confession_id)? {
            return Ok(VoteOutcome::UnknownConfession);
        }
        if store.vote_of(code)?.is_some() {
            return Ok(VoteOutcome::AlreadyVoted);
        }
        let vote = Vote {
            ticket_code: code.clone(),
            confession_id,
        };
        match store.insert_vote(&vote) {
            Ok(()) => {
                tracing::info!(confession_id = %confession_id, "vote recorded");
                Ok(VoteOutcome::Recorded)
            }
            Err(e) if e.is_duplicate() => Ok(VoteOutcome::AlreadyVoted),
            Err(e) => Err(e.into()),
        }
    }

    /// A feed page annotated with vote totals and this ticket's vote.
    pub fn browse<S: ConfessionStore + VoteStore + ?Sized>(
        &self,
        store: &S,
        code: &TicketCode,
        offset: u64,
        limit: Option<u64>,
    ) -> Result<BrowsePage, LedgerError> {
        let page = self.list_page(store, offset, limit)?;
        let ids: Vec<ConfessionId> = page.iter().map(|c| c.id).collect();
        let counts = if ids.is_empty() {
            HashMap::new()
        } else {
            self.vote_counts(store, &ids)?
        };
        let voted = self.vote_of(store, code)?;

        let confessions = page
            .into_iter()
            .map(|c| ConfessionView {
                vote_count: counts.get(&c.id).copied().unwrap_or(0),
                voted_by_me: voted == Some(c.id),
                id: c.id,
                text: c.text,
                created_at: c.created_at,
            })
            .collect();

        Ok(BrowsePage {
            confessions,
            voted_confession_id: voted,
        })
    }
}
