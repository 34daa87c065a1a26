//! Randomness providers.
//!
//! Ticket codes and lottery draws pull their randomness through
//! [`EntropySource`] so tests can substitute a deterministic sequence.

use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EntropyError {
    #[error("entropy source unavailable: {0}")]
    Unavailable(String),
}

/// A source of 32-byte random seeds.
pub trait EntropySource: Send + Sync {
    /// Produce a fresh seed.
    fn seed(&self) -> Result<[u8; 32], EntropyError>;

    /// Human-readable name of this source (for logging).
    fn name(&self) -> &str;
}

/// Operating-system randomness.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn seed(&self) -> Result<[u8; 32], EntropyError> {
        let mut seed = [0u8; 32];
        OsRng
            .try_fill_bytes(&mut seed)
            .map_err(|e| EntropyError::Unavailable(e.to_string()))?;
        Ok(seed)
    }

    fn name(&self) -> &str {
        "os"
    }
}
