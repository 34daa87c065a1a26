//! Abuse prevention for the campaign.
//!
//! - [`SubmissionGuard`]: per-IP and per-device rate windows plus duplicate
//!   detection over the append-only guard log.
//! - [`UnlockGuard`]: per-IP limit on claim attempts.
//! - [`content`]: acceptance rules for confession text.
//!
//! Evaluation never writes; recording an accepted action is a separate call
//! whose failure is logged and swallowed.

pub mod content;
pub mod error;
pub mod policy;
pub mod submission;
pub mod unlock;

pub use content::{validate_confession, ContentError, MIN_CONFESSION_CHARS};
pub use error::GuardError;
pub use policy::GuardPolicy;
pub use submission::{GuardRejection, GuardVerdict, SubmissionGuard};
pub use unlock::UnlockGuard;
