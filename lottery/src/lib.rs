//! Lottery rounds: drawing winners and redeeming them.
//!
//! The [`DrawEngine`] picks non-overlapping winner subsets from the ticket
//! population with a seeded, logged shuffle. The [`ClaimGate`] redeems a
//! winning ticket exactly once.

pub mod claim;
pub mod draw;
pub mod error;

pub use claim::{ClaimGate, ClaimOutcome, DEFAULT_LOTTERY_NAME};
pub use draw::{
    shuffle_pool, DrawEngine, DrawRequest, DrawResult, DEFAULT_DRAW_COUNT, MAX_DRAW_COUNT,
};
pub use error::LotteryError;
