//! Winner selection.
//!
//! A draw is fully determined by its candidate pool and a 32-byte seed: the
//! pool is sorted, then shuffled with `StdRng::from_seed(seed)`, and the
//! first `count` codes win. The seed is logged and returned so an operator
//! can replay any draw from the ticket table.

use std::collections::HashSet;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use pmp_crypto::EntropySource;
use pmp_store::{Lottery, LotteryStore, LotteryWinner, TicketRange, TicketStore};
use pmp_types::{LotteryId, TicketCode, Timestamp};

use crate::LotteryError;

pub const DEFAULT_DRAW_COUNT: u32 = 10;
pub const MAX_DRAW_COUNT: u32 = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawRequest {
    pub lottery_id: LotteryId,
    pub count: u32,
    /// Inclusive bounds on ticket `created_at`.
    pub range: TicketRange,
}

impl DrawRequest {
    pub fn new(lottery_id: LotteryId, count: u32) -> Self {
        Self {
            lottery_id,
            count,
            range: TicketRange::all(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrawResult {
    pub lottery: Lottery,
    /// Rows inserted by this draw.
    pub winners: Vec<LotteryWinner>,
    pub seed: [u8; 32],
    /// Candidates left after removing earlier winners.
    pub pool_size: usize,
}

/// Sort `pool` and shuffle it with a PRNG seeded from `seed`.
pub fn shuffle_pool(pool: &mut [TicketCode], seed: [u8; 32]) {
    pool.sort();
    let mut rng = StdRng::from_seed(seed);
    pool.shuffle(&mut rng);
}

/// Creates lotteries and draws their winners.
#[derive(Clone)]
pub struct DrawEngine {
    entropy: Arc<dyn EntropySource>,
}

impl DrawEngine {
    pub fn new(entropy: Arc<dyn EntropySource>) -> Self {
        Self { entropy }
    }

    /// Create a lottery with a trimmed, non-empty name.
    pub fn create_lottery<S: LotteryStore + ?Sized>(
        &self,
        store: &S,
        name: &str,
        now: Timestamp,
    ) -> Result<Lottery, LotteryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LotteryError::EmptyName);
        }
        let lottery = store.create_lottery(name, now)?;
        tracing::info!(lottery_id = %lottery.id, "lottery created");
        Ok(lottery)
    }

    /// Select up to `request.count` new winners.
    pub fn draw<S: TicketStore + LotteryStore + ?Sized>(
        &self,
        store: &S,
        request: &DrawRequest,
    ) -> Result<DrawResult, LotteryError> {
        if request.count == 0 || request.count > MAX_DRAW_COUNT {
            return Err(LotteryError::InvalidCount {
                count: request.count,
                max: MAX_DRAW_COUNT,
            });
        }

        let lottery = store
            .get_lottery(request.lottery_id)?
            .ok_or(LotteryError::LotteryNotFound(request.lottery_id))?;

        let candidates = store.ticket_codes(request.range)?;
        if candidates.is_empty() {
            return Err(LotteryError::NoTickets);
        }

        let previous: HashSet<TicketCode> = store
            .winners_of(lottery.id)?
            .into_iter()
            .map(|w| w.ticket_code)
            .collect();
        let mut pool: Vec<TicketCode> = candidates
            .into_iter()
            .filter(|code| !previous.contains(code))
            .collect();
        if pool.is_empty() {
            return Err(LotteryError::NoAvailableTickets);
        }

        let seed = self.entropy.seed()?;
        let pool_size = pool.len();
        tracing::info!(
            lottery_id = %lottery.id,
            pool_size,
            count = request.count,
            seed = %hex::encode(seed),
            source = self.entropy.name(),
            "drawing winners"
        );

        shuffle_pool(&mut pool, seed);
        pool.truncate(request.count as usize);

        let winners = store.insert_winners(lottery.id, &pool)?;
        tracing::info!(
            lottery_id = %lottery.id,
            selected = winners.len(),
            "winners recorded"
        );

        Ok(DrawResult {
            lottery,
            winners,
            seed,
            pool_size,
        })
    }

    pub fn list_winners<S: LotteryStore + ?Sized>(
        &self,
        store: &S,
        lottery_id: LotteryId,
    ) -> Result<Vec<LotteryWinner>, LotteryError> {
        if store.get_lottery(lottery_id)?.is_none() {
            return Err(LotteryError::LotteryNotFound(lottery_id));
        }
        Ok(store.winners_of(lottery_id)?)
    }
}
