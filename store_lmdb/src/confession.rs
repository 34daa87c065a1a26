//! LMDB implementation of ConfessionStore.

use pmp_store::{Confession, ConfessionStore, StoreError};
use pmp_types::{ConfessionId, IdentityHash, Timestamp};

use crate::environment::LmdbEnvironment;
use crate::keys::time_serial_key;
use crate::LmdbError;

impl ConfessionStore for LmdbEnvironment {
    fn insert_confession(
        &self,
        text: &str,
        text_hash: &IdentityHash,
        created_at: Timestamp,
    ) -> Result<ConfessionId, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let id = ConfessionId::new(self.next_sequence(&mut wtxn, "confession")?);
        let confession = Confession {
            id,
            text: text.to_string(),
            text_hash: *text_hash,
            created_at,
        };
        let value = bincode::serialize(&confession).map_err(LmdbError::from)?;
        let primary = time_serial_key(created_at, id.get());
        self.confessions_db
            .put(&mut wtxn, &primary, &value)
            .map_err(LmdbError::from)?;
        self.confession_index_db
            .put(&mut wtxn, &id.to_be_bytes(), &primary)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(id)
    }

    fn get_confession(&self, id: ConfessionId) -> Result<Option<Confession>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let primary = match self
            .confession_index_db
            .get(&rtxn, &id.to_be_bytes())
            .map_err(LmdbError::from)?
        {
            Some(primary) => primary,
            None => return Ok(None),
        };
        let bytes = self
            .confessions_db
            .get(&rtxn, primary)
            .map_err(LmdbError::from)?
            .ok_or_else(|| {
                StoreError::Corruption(format!("confession {id} indexed but missing"))
            })?;
        Ok(Some(bincode::deserialize(bytes).map_err(LmdbError::from)?))
    }

    fn list_confessions(&self, offset: u64, limit: u64) -> Result<Vec<Confession>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut page = Vec::new();
        let iter = self.confessions_db.rev_iter(&rtxn).map_err(LmdbError::from)?;
        for result in iter.skip(offset as usize).take(limit as usize) {
            let (_, bytes) = result.map_err(LmdbError::from)?;
            page.push(bincode::deserialize(bytes).map_err(LmdbError::from)?);
        }
        Ok(page)
    }

    fn confession_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.confessions_db.len(&rtxn).map_err(LmdbError::from)?)
    }
}
