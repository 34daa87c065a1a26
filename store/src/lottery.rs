//! Lottery and winner storage trait.

use crate::StoreError;
use pmp_types::{LotteryId, TicketCode, Timestamp};
use serde::{Deserialize, Serialize};

/// A named lottery round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lottery {
    pub id: LotteryId,
    pub name: String,
    pub created_at: Timestamp,
}

/// A ticket selected as a winner of a lottery.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotteryWinner {
    pub lottery_id: LotteryId,
    pub ticket_code: TicketCode,
    /// Set exactly once by a successful claim.
    pub claimed_at: Option<Timestamp>,
}

/// Result of the conditional claim write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClaimUpdate {
    /// `claimed_at` was null and is now set to the given time.
    Claimed(Timestamp),
    /// `claimed_at` was already set; the stored value is returned unchanged.
    AlreadyClaimed(Timestamp),
    /// No winner row for this (lottery, code) pair.
    NotWinner,
}

/// Trait for lottery storage operations.
pub trait LotteryStore {
    /// Create a lottery with a freshly assigned id.
    fn create_lottery(&self, name: &str, created_at: Timestamp) -> Result<Lottery, StoreError>;

    fn get_lottery(&self, id: LotteryId) -> Result<Option<Lottery>, StoreError>;

    /// Every winner row recorded for a lottery.
    fn winners_of(&self, lottery_id: LotteryId) -> Result<Vec<LotteryWinner>, StoreError>;

    /// Insert unclaimed winner rows, skipping codes that already won this
    /// lottery. Returns only the rows actually inserted.
    fn insert_winners(
        &self,
        lottery_id: LotteryId,
        codes: &[TicketCode],
    ) -> Result<Vec<LotteryWinner>, StoreError>;

    fn get_winner(
        &self,
        lottery_id: LotteryId,
        code: &TicketCode,
    ) -> Result<Option<LotteryWinner>, StoreError>;

    /// Set `claimed_at` to `at` only if it is still null.
    ///
    /// Must be a single atomic compare-and-set: two concurrent claims of the
    /// same row see exactly one [`ClaimUpdate::Claimed`].
    fn claim_winner(
        &self,
        lottery_id: LotteryId,
        code: &TicketCode,
        at: Timestamp,
    ) -> Result<ClaimUpdate, StoreError>;
}
