//! Shared utilities for the PMP campaign.

pub mod logging;

pub use logging::{init_logging, LogFormat};
