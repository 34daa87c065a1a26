//! Deterministic stand-ins for the campaign's outside world.
//!
//! [`NullClock`] is set and advanced by hand, [`NullEntropy`] replays a
//! fixed list of seeds, and [`NullStore`] keeps every table in memory behind
//! one mutex so each call is atomic, as an LMDB write transaction would be.
//! Nothing here touches the filesystem or the network.

pub mod clock;
pub mod random;
pub mod store;

pub use clock::NullClock;
pub use random::NullEntropy;
pub use store::NullStore;
