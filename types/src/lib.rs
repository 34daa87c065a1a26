//! Fundamental types for the PMP confession campaign.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! ticket codes, identity hashes, record ids, timestamps and the clock abstraction.

pub mod error;
pub mod hash;
pub mod ids;
pub mod ticket;
pub mod time;

pub use error::PmpError;
pub use hash::IdentityHash;
pub use ids::{ConfessionId, LotteryId};
pub use ticket::{TicketCode, TICKET_ALPHABET, TICKET_SYMBOLS};
pub use time::{Clock, SystemClock, Timestamp};
