//! LMDB implementation of LotteryStore.

use pmp_store::{ClaimUpdate, Lottery, LotteryStore, LotteryWinner, StoreError};
use pmp_types::{LotteryId, TicketCode, Timestamp};

use crate::environment::LmdbEnvironment;
use crate::keys::{prefix_scan_values, winner_key};
use crate::LmdbError;

impl LotteryStore for LmdbEnvironment {
    fn create_lottery(&self, name: &str, created_at: Timestamp) -> Result<Lottery, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let id = LotteryId::new(self.next_sequence(&mut wtxn, "lottery")?);
        let lottery = Lottery {
            id,
            name: name.to_string(),
            created_at,
        };
        let value = bincode::serialize(&lottery).map_err(LmdbError::from)?;
        self.lotteries_db
            .put(&mut wtxn, &id.to_be_bytes(), &value)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(lottery)
    }

    fn get_lottery(&self, id: LotteryId) -> Result<Option<Lottery>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self
            .lotteries_db
            .get(&rtxn, &id.to_be_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes).map_err(LmdbError::from)?)),
            None => Ok(None),
        }
    }

    fn winners_of(&self, lottery_id: LotteryId) -> Result<Vec<LotteryWinner>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let values = prefix_scan_values(&self.winners_db, &rtxn, &lottery_id.to_be_bytes())?;
        values
            .iter()
            .map(|v| {
                bincode::deserialize::<LotteryWinner>(v)
                    .map_err(|e| StoreError::from(LmdbError::from(e)))
            })
            .collect()
    }

    fn insert_winners(
        &self,
        lottery_id: LotteryId,
        codes: &[TicketCode],
    ) -> Result<Vec<LotteryWinner>, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut inserted = Vec::with_capacity(codes.len());
        for code in codes {
            let key = winner_key(lottery_id, code);
            if self
                .winners_db
                .get(&wtxn, &key)
                .map_err(LmdbError::from)?
                .is_some()
            {
                continue;
            }
            let winner = LotteryWinner {
                lottery_id,
                ticket_code: code.clone(),
                claimed_at: None,
            };
            let value = bincode::serialize(&winner).map_err(LmdbError::from)?;
            self.winners_db
                .put(&mut wtxn, &key, &value)
                .map_err(LmdbError::from)?;
            inserted.push(winner);
        }
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(inserted)
    }

    fn get_winner(
        &self,
        lottery_id: LotteryId,
        code: &TicketCode,
    ) -> Result<Option<LotteryWinner>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self
            .winners_db
            .get(&rtxn, &winner_key(lottery_id, code))
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes).map_err(LmdbError::from)?)),
            None => Ok(None),
        }
    }

    fn claim_winner(
        &self,
        lottery_id: LotteryId,
        code: &TicketCode,
        at: Timestamp,
    ) -> Result<ClaimUpdate, StoreError> {
        let key = winner_key(lottery_id, code);
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut winner: LotteryWinner =
            match self.winners_db.get(&wtxn, &key).map_err(LmdbError::from)? {
                Some(bytes) => bincode::deserialize(bytes).map_err(LmdbError::from)?,
                None => return Ok(ClaimUpdate::NotWinner),
            };
        if let Some(claimed_at) = winner.claimed_at {
            return Ok(ClaimUpdate::AlreadyClaimed(claimed_at));
        }
        winner.claimed_at = Some(at);
        let value = bincode::serialize(&winner).map_err(LmdbError::from)?;
        self.winners_db
            .put(&mut wtxn, &key, &value)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(ClaimUpdate::Claimed(at))
    }
}
