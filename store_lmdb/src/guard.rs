//! LMDB implementation of GuardStore.

use pmp_store::{GuardRecord, GuardStore, StoreError};
use pmp_types::Timestamp;

use crate::environment::LmdbEnvironment;
use crate::keys::{range_scan, time_serial_key};
use crate::LmdbError;

impl GuardStore for LmdbEnvironment {
    fn append_guard_record(&self, record: &GuardRecord) -> Result<(), StoreError> {
        let value = bincode::serialize(record).map_err(LmdbError::from)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let serial = self.next_sequence(&mut wtxn, "guard")?;
        let key = time_serial_key(record.created_at, serial);
        self.guard_db
            .put(&mut wtxn, &key, &value)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn guard_records_since(&self, cutoff: Timestamp) -> Result<Vec<GuardRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let lower = cutoff.to_be_bytes();
        let rows = range_scan(&self.guard_db, &rtxn, &lower, None)?;
        rows.iter()
            .map(|(_, v)| {
                bincode::deserialize::<GuardRecord>(v)
                    .map_err(|e| StoreError::from(LmdbError::from(e)))
            })
            .collect()
    }
}
