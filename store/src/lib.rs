//! Abstract storage traits for the PMP campaign.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rest of the codebase depends only on the traits.
//!
//! Uniqueness rules (ticket codes, one vote per ticket, one winner row per
//! lottery and code) and the one-way claim transition are enforced by the
//! backend inside a single atomic write. Callers never lock.

pub mod attempt;
pub mod confession;
pub mod contact;
pub mod error;
pub mod guard;
pub mod lottery;
pub mod meta;
pub mod ticket;
pub mod vote;

pub use attempt::AttemptStore;
pub use confession::{Confession, ConfessionStore};
pub use contact::{ContactStore, ContactUpdate, TicketContact};
pub use error::StoreError;
pub use guard::{GuardRecord, GuardStore};
pub use lottery::{ClaimUpdate, Lottery, LotteryStore, LotteryWinner};
pub use meta::MetaStore;
pub use ticket::{Ticket, TicketRange, TicketStore};
pub use vote::{Vote, VoteStore};

/// Every store the campaign needs, behind one bound.
pub trait CampaignStore:
    GuardStore
    + AttemptStore
    + TicketStore
    + ConfessionStore
    + VoteStore
    + LotteryStore
    + ContactStore
    + Send
    + Sync
{
}

impl<T> CampaignStore for T where
    T: GuardStore
        + AttemptStore
        + TicketStore
        + ConfessionStore
        + VoteStore
        + LotteryStore
        + ContactStore
        + Send
        + Sync
{
}
