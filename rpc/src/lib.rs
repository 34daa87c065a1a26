//! HTTP+JSON server for the PMP campaign.
//!
//! Provides endpoints for:
//! - Confession submission (`POST /confess`)
//! - Browsing and voting (`GET`/`POST /confessions`)
//! - Lottery administration (`POST /admin`)
//! - Prize claims and contact details (`POST /unlock`, `POST /contact`)
//! - Health and Prometheus metrics

pub mod captcha;
pub mod client_ip;
pub mod error;
pub mod handlers;
pub mod pagination;
pub mod server;

pub use captcha::CaptchaVerifier;
pub use error::RpcError;
pub use server::{router, AppState, RpcServer};
