//! LMDB storage backend for the PMP campaign.
//!
//! Implements all storage traits from `pmp-store` using the `heed` LMDB
//! bindings. Each logical table maps to one LMDB database within a single
//! environment.
//!
//! LMDB admits a single write transaction at a time. Every uniqueness check
//! and conditional update here is a read followed by a write inside one
//! write transaction, which makes it atomic across threads and processes
//! sharing the environment.

pub mod attempt;
pub mod confession;
pub mod contact;
pub mod environment;
pub mod error;
pub mod guard;
pub mod integrity;
pub mod keys;
pub mod lottery;
pub mod meta;
pub mod migration;
pub mod ticket;
pub mod vote;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use integrity::{check_data_dir, check_integrity, IntegrityReport};
pub use migration::{Migrator, CURRENT_SCHEMA_VERSION};
