//! Cryptographic primitives for the PMP campaign.
//!
//! - **SHA-256** identity hashing: salted for client IPs, plain for device
//!   fingerprints and confession text
//! - **Entropy sources** feeding ticket-code generation and lottery seeds

pub mod entropy;
pub mod hash;

pub use entropy::{EntropyError, EntropySource, OsEntropy};
pub use hash::{hash_fingerprint, hash_ip, hash_text, secret_matches, sha256, sha256_multi};
