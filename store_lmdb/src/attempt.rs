//! LMDB implementation of AttemptStore.

use pmp_store::{AttemptStore, StoreError};
use pmp_types::{IdentityHash, Timestamp};

use crate::environment::LmdbEnvironment;
use crate::keys::{attempt_key, decode_u64, range_scan};
use crate::LmdbError;

impl AttemptStore for LmdbEnvironment {
    fn record_attempt(&self, ip_hash: &IdentityHash, at: Timestamp) -> Result<(), StoreError> {
        let key = attempt_key(ip_hash, at);
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let count = match self.attempts_db.get(&wtxn, &key).map_err(LmdbError::from)? {
            Some(bytes) => decode_u64(bytes)?,
            None => 0,
        };
        self.attempts_db
            .put(&mut wtxn, &key, &(count + 1).to_be_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn attempts_since(
        &self,
        ip_hash: &IdentityHash,
        cutoff: Timestamp,
    ) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let lower = attempt_key(ip_hash, cutoff);
        let upper = attempt_key(ip_hash, Timestamp::new(u64::MAX));
        let mut total = 0u64;
        for (_, v) in range_scan(&self.attempts_db, &rtxn, &lower, Some(&upper))? {
            total += decode_u64(&v)?;
        }
        // The exclusive upper bound skips the final bucket.
        if let Some(bytes) = self.attempts_db.get(&rtxn, &upper).map_err(LmdbError::from)? {
            total += decode_u64(bytes)?;
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::test_support::temp_env;

    #[test]
    fn counts_only_own_attempts_inside_window() {
        let (_dir, env) = temp_env();
        let ip = IdentityHash::new([1; 32]);
        let other = IdentityHash::new([2; 32]);

        env.record_attempt(&ip, Timestamp::new(100)).unwrap();
        env.record_attempt(&ip, Timestamp::new(200)).unwrap();
        env.record_attempt(&ip, Timestamp::new(200)).unwrap();
        env.record_attempt(&other, Timestamp::new(200)).unwrap();

        assert_eq!(env.attempts_since(&ip, Timestamp::new(0)).unwrap(), 3);
        assert_eq!(env.attempts_since(&ip, Timestamp::new(200)).unwrap(), 2);
        assert_eq!(env.attempts_since(&ip, Timestamp::new(201)).unwrap(), 0);
        assert_eq!(env.attempts_since(&other, Timestamp::new(0)).unwrap(), 1);
    }
}
