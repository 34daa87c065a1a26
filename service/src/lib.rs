//! The PMP campaign service.
//!
//! [`Campaign`] wires the identity hasher, guards, ticket issuer, ledger,
//! draw engine and claim gate into the request flows the HTTP layer
//! exposes. Every flow is synchronous and touches storage; async callers
//! run them on a blocking pool.

pub mod campaign;
pub mod config;
pub mod contact;
pub mod error;
pub mod metrics;

pub use campaign::{Campaign, Submission};
pub use config::ServiceConfig;
pub use contact::normalize_contact;
pub use error::ServiceError;
pub use metrics::CampaignMetrics;
