//! Nullable entropy: deterministic seeds for testing.

use pmp_crypto::{EntropyError, EntropySource};
use std::sync::Mutex;

/// A deterministic entropy source for testing.
///
/// Returns pre-configured seeds in order, wrapping around at the end.
pub struct NullEntropy {
    seeds: Vec<[u8; 32]>,
    index: Mutex<usize>,
    failing: bool,
}

impl NullEntropy {
    /// Create with a sequence of deterministic seeds.
    pub fn new(seeds: Vec<[u8; 32]>) -> Self {
        assert!(!seeds.is_empty(), "NullEntropy needs at least one seed");
        Self {
            seeds,
            index: Mutex::new(0),
            failing: false,
        }
    }

    /// Create with a single seed that will be returned for every call.
    pub fn constant(value: [u8; 32]) -> Self {
        Self::new(vec![value])
    }

    /// Seeds `[i; 32]` for `i` in `0..n`: `n` distinct values, then repeats.
    pub fn counting(n: u8) -> Self {
        Self::new((0..n.max(1)).map(|i| [i; 32]).collect())
    }

    /// A source whose every call fails.
    pub fn failing() -> Self {
        Self {
            seeds: vec![[0; 32]],
            index: Mutex::new(0),
            failing: true,
        }
    }

    /// How many seeds have been handed out so far.
    pub fn calls(&self) -> usize {
        *self.index.lock().unwrap()
    }
}

impl EntropySource for NullEntropy {
    fn seed(&self) -> Result<[u8; 32], EntropyError> {
        if self.failing {
            return Err(EntropyError::Unavailable("null entropy set to fail".into()));
        }
        let mut idx = self.index.lock().unwrap();
        let current = *idx % self.seeds.len();
        *idx += 1;
        Ok(self.seeds[current])
    }

    fn name(&self) -> &str {
        "null-entropy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_cycle_in_order() {
        let e = NullEntropy::new(vec![[1; 32], [2; 32]]);
        assert_eq!(e.seed().unwrap(), [1; 32]);
        assert_eq!(e.seed().unwrap(), [2; 32]);
        assert_eq!(e.seed().unwrap(), [1; 32]);
        assert_eq!(e.calls(), 3);
    }

    #[test]
    fn failing_source_errors() {
        assert!(NullEntropy::failing().seed().is_err());
    }
}
