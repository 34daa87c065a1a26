//! Confessions and the vote ledger.
//!
//! A ticket grants read access to the confession feed and exactly one vote,
//! whichever confession it goes to.

pub mod error;
pub mod ledger;

pub use error::LedgerError;
pub use ledger::{
    BrowsePage, ConfessionLedger, ConfessionView, VoteOutcome, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT,
};
