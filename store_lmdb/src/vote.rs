//! LMDB implementation of VoteStore.
//!
//! The vote row and the tally increment share one write transaction, so
//! tallies never drift from the vote rows.

use std::collections::HashMap;

use pmp_store::{StoreError, Vote, VoteStore};
use pmp_types::{ConfessionId, TicketCode};

use crate::environment::LmdbEnvironment;
use crate::keys::decode_u64;
use crate::LmdbError;

impl VoteStore for LmdbEnvironment {
    fn insert_vote(&self, vote: &Vote) -> Result<(), StoreError> {
        let key = vote.ticket_code.as_str().as_bytes();
        let id_key = vote.confession_id.to_be_bytes();
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;

        if self
            .votes_db
            .get(&wtxn, key)
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::Duplicate(format!(
                "ticket {} already voted",
                vote.ticket_code
            )));
        }

        let tally = match self
            .vote_tallies_db
            .get(&wtxn, &id_key)
            .map_err(LmdbError::from)?
        {
            Some(bytes) => decode_u64(bytes)?,
            None => 0,
        };

        self.votes_db
            .put(&mut wtxn, key, &id_key)
            .map_err(LmdbError::from)?;
        self.vote_tallies_db
            .put(&mut wtxn, &id_key, &(tally + 1).to_be_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn vote_of(&self, ticket_code: &TicketCode) -> Result<Option<ConfessionId>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self
            .votes_db
            .get(&rtxn, ticket_code.as_str().as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(ConfessionId::new(decode_u64(bytes)?))),
            None => Ok(None),
        }
    }

    fn vote_counts(&self, ids: &[ConfessionId]) -> Result<HashMap<ConfessionId, u64>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut counts = HashMap::new();
        for id in ids {
            if let Some(bytes) = self
                .vote_tallies_db
                .get(&rtxn, &id.to_be_bytes())
                .map_err(LmdbError::from)?
            {
                counts.insert(*id, decode_u64(bytes)?);
            }
        }
        Ok(counts)
    }
}
