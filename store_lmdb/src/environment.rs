//! LMDB environment setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions, RwTxn};

use crate::keys::decode_u64;
use crate::LmdbError;

/// Number of named databases opened by [`LmdbEnvironment::open`].
pub const DATABASE_COUNT: u32 = 11;

/// Wraps the LMDB environment and all database handles.
///
/// Cheap to clone; clones share the same environment.
#[derive(Clone)]
pub struct LmdbEnvironment {
    pub(crate) env: Arc<Env>,
    pub(crate) path: PathBuf,
    /// Submission guard log: `created_at ++ serial` -> `GuardRecord`.
    pub(crate) guard_db: Database<Bytes, Bytes>,
    /// Unlock attempts: `ip_hash ++ at` -> count.
    pub(crate) attempts_db: Database<Bytes, Bytes>,
    /// Tickets: code -> `Ticket`.
    pub(crate) tickets_db: Database<Bytes, Bytes>,
    /// Confessions: `created_at ++ id` -> `Confession`.
    pub(crate) confessions_db: Database<Bytes, Bytes>,
    /// Confession id -> primary key in `confessions_db`.
    pub(crate) confession_index_db: Database<Bytes, Bytes>,
    /// Votes: ticket code -> confession id.
    pub(crate) votes_db: Database<Bytes, Bytes>,
    /// Vote totals: confession id -> count.
    pub(crate) vote_tallies_db: Database<Bytes, Bytes>,
    /// Lotteries: id -> `Lottery`.
    pub(crate) lotteries_db: Database<Bytes, Bytes>,
    /// Winners: `lottery_id ++ code` -> `LotteryWinner`.
    pub(crate) winners_db: Database<Bytes, Bytes>,
    /// Contacts: ticket code -> `TicketContact`.
    pub(crate) contacts_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    ///
    /// `max_dbs` must be at least [`DATABASE_COUNT`]. `map_size` is in bytes.
    pub fn open(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, LmdbError> {
        if max_dbs < DATABASE_COUNT {
            return Err(LmdbError::Heed(format!(
                "max_dbs {max_dbs} is below the {DATABASE_COUNT} databases required"
            )));
        }
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per process for this path
        // and every handle is shared through the returned `Arc`.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(max_dbs)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let guard_db = env.create_database(&mut wtxn, Some("guard_records"))?;
        let attempts_db = env.create_database(&mut wtxn, Some("unlock_attempts"))?;
        let tickets_db = env.create_database(&mut wtxn, Some("tickets"))?;
        let confessions_db = env.create_database(&mut wtxn, Some("confessions"))?;
        let confession_index_db = env.create_database(&mut wtxn, Some("confession_index"))?;
        let votes_db = env.create_database(&mut wtxn, Some("votes"))?;
        let vote_tallies_db = env.create_database(&mut wtxn, Some("vote_tallies"))?;
        let lotteries_db = env.create_database(&mut wtxn, Some("lotteries"))?;
        let winners_db = env.create_database(&mut wtxn, Some("lottery_winners"))?;
        let contacts_db = env.create_database(&mut wtxn, Some("ticket_contacts"))?;
        let meta_db = env.create_database(&mut wtxn, Some("meta"))?;
        wtxn.commit()?;

        tracing::debug!(path = %path.display(), map_size, "opened LMDB environment");

        Ok(Self {
            env: Arc::new(env),
            path: path.to_path_buf(),
            guard_db,
            attempts_db,
            tickets_db,
            confessions_db,
            confession_index_db,
            votes_db,
            vote_tallies_db,
            lotteries_db,
            winners_db,
            contacts_db,
            meta_db,
        })
    }

    pub fn env(&self) -> &Arc<Env> {
        &self.env
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Advance the named id sequence inside `wtxn` and return the new value.
    /// Sequences start at 1.
    pub(crate) fn next_sequence(&self, wtxn: &mut RwTxn, name: &str) -> Result<u64, LmdbError> {
        let key = sequence_key(name);
        let current = match self.meta_db.get(wtxn, &key)? {
            Some(bytes) => decode_u64(bytes)?,
            None => 0,
        };
        let next = current + 1;
        self.meta_db.put(wtxn, &key, &next.to_be_bytes())?;
        Ok(next)
    }
}

pub(crate) fn sequence_key(name: &str) -> Vec<u8> {
    let mut key = b"seq:".to_vec();
    key.extend_from_slice(name.as_bytes());
    key
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn temp_env() -> (tempfile::TempDir, LmdbEnvironment) {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 16, 64 * 1024 * 1024).unwrap();
        (dir, env)
    }
}
