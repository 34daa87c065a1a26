//! Nullable store: thread-safe in-memory storage for testing.

use pmp_store::{
    AttemptStore, ClaimUpdate, Confession, ConfessionStore, ContactStore, ContactUpdate,
    GuardRecord, GuardStore, Lottery, LotteryStore, LotteryWinner, MetaStore, StoreError, Ticket,
    TicketContact, TicketRange, TicketStore, Vote, VoteStore,
};
use pmp_types::{ConfessionId, IdentityHash, LotteryId, TicketCode, Timestamp};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[derive(Default)]
struct State {
    guard: Vec<GuardRecord>,
    attempts: Vec<(IdentityHash, Timestamp)>,
    tickets: HashMap<TicketCode, Ticket>,
    confessions: BTreeMap<ConfessionId, Confession>,
    votes: HashMap<TicketCode, ConfessionId>,
    lotteries: BTreeMap<LotteryId, Lottery>,
    winners: BTreeMap<(LotteryId, TicketCode), LotteryWinner>,
    contacts: HashMap<TicketCode, TicketContact>,
    sequences: HashMap<String, u64>,
    schema_version: u32,
}

impl State {
    fn next_sequence(&mut self, name: &str) -> u64 {
        let seq = self.sequences.entry(name.to_string()).or_insert(0);
        *seq += 1;
        *seq
    }
}

/// An in-memory implementation of every campaign store.
///
/// All tables sit behind one mutex, so every operation is atomic the same
/// way a single LMDB write transaction is.
#[derive(Default)]
pub struct NullStore {
    state: Mutex<State>,
    fail_guard_appends: AtomicBool,
    fail_ticket_inserts: AtomicBool,
    fail_confession_inserts: AtomicBool,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `append_guard_record` call fail with a backend error.
    pub fn fail_guard_appends(&self, fail: bool) {
        self.fail_guard_appends.store(fail, Ordering::SeqCst);
    }

    /// Make every `insert_ticket` call fail with a backend error.
    pub fn fail_ticket_inserts(&self, fail: bool) {
        self.fail_ticket_inserts.store(fail, Ordering::SeqCst);
    }

    /// Make every `insert_confession` call fail with a backend error.
    pub fn fail_confession_inserts(&self, fail: bool) {
        self.fail_confession_inserts.store(fail, Ordering::SeqCst);
    }

    /// Number of guard records stored (for assertions).
    pub fn guard_record_count(&self) -> usize {
        self.state.lock().unwrap().guard.len()
    }
}

impl GuardStore for NullStore {
    fn append_guard_record(&self, record: &GuardRecord) -> Result<(), StoreError> {
        if self.fail_guard_appends.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("guard appends disabled".into()));
        }
        self.state.lock().unwrap().guard.push(record.clone());
        Ok(())
    }

    fn guard_records_since(&self, cutoff: Timestamp) -> Result<Vec<GuardRecord>, StoreError> {
        let mut records: Vec<GuardRecord> = self
            .state
            .lock()
            .unwrap()
            .guard
            .iter()
            .filter(|r| r.created_at >= cutoff)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.created_at);
        Ok(records)
    }
}

impl AttemptStore for NullStore {
    fn record_attempt(&self, ip_hash: &IdentityHash, at: Timestamp) -> Result<(), StoreError> {
        self.state.lock().unwrap().attempts.push((*ip_hash, at));
        Ok(())
    }

    fn attempts_since(
        &self,
        ip_hash: &IdentityHash,
        cutoff: Timestamp,
    ) -> Result<u64, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .attempts
            .iter()
            .filter(|(ip, at)| ip == ip_hash && *at >= cutoff)
            .count() as u64)
    }
}

impl TicketStore for NullStore {
    fn insert_ticket(&self, ticket: &Ticket) -> Result<(), StoreError> {
        if self.fail_ticket_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("ticket inserts disabled".into()));
        }
        let mut state = self.state.lock().unwrap();
        if state.tickets.contains_key(&ticket.code) {
            return Err(StoreError::Duplicate(format!("ticket {}", ticket.code)));
        }
        state.tickets.insert(ticket.code.clone(), ticket.clone());
        Ok(())
    }

    fn get_ticket(&self, code: &TicketCode) -> Result<Option<Ticket>, StoreError> {
        Ok(self.state.lock().unwrap().tickets.get(code).cloned())
    }

    fn ticket_codes(&self, range: TicketRange) -> Result<Vec<TicketCode>, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .tickets
            .values()
            .filter(|t| range.contains(t.created_at))
            .map(|t| t.code.clone())
            .collect())
    }

    fn ticket_count(&self) -> Result<u64, StoreError> {
        Ok(self.state.lock().unwrap().tickets.len() as u64)
    }
}

impl ConfessionStore for NullStore {
    fn insert_confession(
        &self,
        text: &str,
        text_hash: &IdentityHash,
        created_at: Timestamp,
    ) -> Result<ConfessionId, StoreError> {
        if self.fail_confession_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("confession inserts disabled".into()));
        }
        let mut state = self.state.lock().unwrap();
        let id = ConfessionId::new(state.next_sequence("confession"));
        state.confessions.insert(
            id,
            Confession {
                id,
                text: text.to_string(),
                text_hash: *text_hash,
                created_at,
            },
        );
        Ok(id)
    }

    fn get_confession(&self, id: ConfessionId) -> Result<Option<Confession>, StoreError> {
        Ok(self.state.lock().unwrap().confessions.get(&id).cloned())
    }

    fn list_confessions(&self, offset: u64, limit: u64) -> Result<Vec<Confession>, StoreError> {
        let state = self.state.lock().unwrap();
        let mut all: Vec<&Confession> = state.confessions.values().collect();
        all.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(all
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    fn confession_count(&self) -> Result<u64, StoreError> {
        Ok(self.state.lock().unwrap().confessions.len() as u64)
    }
}

impl VoteStore for NullStore {
    fn insert_vote(&self, vote: &Vote) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.votes.contains_key(&vote.ticket_code) {
            return Err(StoreError::Duplicate(format!(
                "ticket {} already voted",
                vote.ticket_code
            )));
        }
        state
            .votes
            .insert(vote.ticket_code.clone(), vote.confession_id);
        Ok(())
    }

    fn vote_of(&self, ticket_code: &TicketCode) -> Result<Option<ConfessionId>, StoreError> {
        Ok(self.state.lock().unwrap().votes.get(ticket_code).copied())
    }

    fn vote_counts(&self, ids: &[ConfessionId]) -> Result<HashMap<ConfessionId, u64>, StoreError> {
        let state = self.state.lock().unwrap();
        let mut counts = HashMap::new();
        for id in state.votes.values().filter(|id| ids.contains(id)) {
            *counts.entry(*id).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

impl LotteryStore for NullStore {
    fn create_lottery(&self, name: &str, created_at: Timestamp) -> Result<Lottery, StoreError> {
        let mut state = self.state.lock().unwrap();
        let id = LotteryId::new(state.next_sequence("lottery"));
        let lottery = Lottery {
            id,
            name: name.to_string(),
            created_at,
        };
        state.lotteries.insert(id, lottery.clone());
        Ok(lottery)
    }

    fn get_lottery(&self, id: LotteryId) -> Result<Option<Lottery>, StoreError> {
        Ok(self.state.lock().unwrap().lotteries.get(&id).cloned())
    }

    fn winners_of(&self, lottery_id: LotteryId) -> Result<Vec<LotteryWinner>, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .winners
            .values()
            .filter(|w| w.lottery_id == lottery_id)
            .cloned()
            .collect())
    }

    fn insert_winners(
        &self,
        lottery_id: LotteryId,
        codes: &[TicketCode],
    ) -> Result<Vec<LotteryWinner>, StoreError> {
        let mut state = self.state.lock().unwrap();
        let mut inserted = Vec::new();
        for code in codes {
            let key = (lottery_id, code.clone());
            if state.winners.contains_key(&key) {
                continue;
            }
            let winner = LotteryWinner {
                lottery_id,
                ticket_code: code.clone(),
                claimed_at: None,
            };
            state.winners.insert(key, winner.clone());
            inserted.push(winner);
        }
        Ok(inserted)
    }

    fn get_winner(
        &self,
        lottery_id: LotteryId,
        code: &TicketCode,
    ) -> Result<Option<LotteryWinner>, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .winners
            .get(&(lottery_id, code.clone()))
            .cloned())
    }

    fn claim_winner(
        &self,
        lottery_id: LotteryId,
        code: &TicketCode,
        at: Timestamp,
    ) -> Result<ClaimUpdate, StoreError> {
        let mut state = self.state.lock().unwrap();
        match state.winners.get_mut(&(lottery_id, code.clone())) {
            None => Ok(ClaimUpdate::NotWinner),
            Some(winner) => match winner.claimed_at {
                Some(claimed_at) => Ok(ClaimUpdate::AlreadyClaimed(claimed_at)),
                None => {
                    winner.claimed_at = Some(at);
                    Ok(ClaimUpdate::Claimed(at))
                }
            },
        }
    }
}

impl ContactStore for NullStore {
    fn upsert_contact(
        &self,
        code: &TicketCode,
        update: &ContactUpdate,
        at: Timestamp,
    ) -> Result<TicketContact, StoreError> {
        let mut state = self.state.lock().unwrap();
        let existing = state.contacts.remove(code).unwrap_or_default();
        let merged = existing.merge(update, at);
        state.contacts.insert(code.clone(), merged.clone());
        Ok(merged)
    }

    fn get_contact(&self, code: &TicketCode) -> Result<Option<TicketContact>, StoreError> {
        Ok(self.state.lock().unwrap().contacts.get(code).cloned())
    }
}

impl MetaStore for NullStore {
    fn schema_version(&self) -> Result<u32, StoreError> {
        Ok(self.state.lock().unwrap().schema_version)
    }

    fn set_schema_version(&self, version: u32) -> Result<(), StoreError> {
        self.state.lock().unwrap().schema_version = version;
        Ok(())
    }

    fn sequence_value(&self, name: &str) -> Result<u64, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .sequences
            .get(name)
            .copied()
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> TicketCode {
        TicketCode::parse(s).unwrap()
    }

    #[test]
    fn duplicate_ticket_rejected() {
        let store = NullStore::new();
        let t = Ticket {
            code: code("PMP-AAAA-AAAA"),
            created_at: Timestamp::new(1),
        };
        store.insert_ticket(&t).unwrap();
        assert!(store.insert_ticket(&t).unwrap_err().is_duplicate());
        assert_eq!(store.ticket_count().unwrap(), 1);
    }

    #[test]
    fn confessions_listed_newest_first() {
        let store = NullStore::new();
        store
            .insert_confession("old", &IdentityHash::ZERO, Timestamp::new(1))
            .unwrap();
        store
            .insert_confession("new", &IdentityHash::ZERO, Timestamp::new(2))
            .unwrap();
        let page = store.list_confessions(0, 10).unwrap();
        assert_eq!(page[0].text, "new");
        assert_eq!(page[1].text, "old");
    }

    #[test]
    fn vote_counts_skip_unrequested_ids() {
        let store = NullStore::new();
        for (c, id) in [("PMP-AAAA-AAAA", 1), ("PMP-BBBB-BBBB", 1), ("PMP-CCCC-CCCC", 2)] {
            store
                .insert_vote(&Vote {
                    ticket_code: code(c),
                    confession_id: ConfessionId::new(id),
                })
                .unwrap();
        }
        let counts = store.vote_counts(&[ConfessionId::new(1)]).unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[&ConfessionId::new(1)], 2);
    }

    #[test]
    fn claim_is_one_way() {
        let store = NullStore::new();
        let lottery = store.create_lottery("L", Timestamp::new(1)).unwrap();
        store
            .insert_winners(lottery.id, &[code("PMP-AAAA-AAAA")])
            .unwrap();
        assert_eq!(
            store
                .claim_winner(lottery.id, &code("PMP-AAAA-AAAA"), Timestamp::new(5))
                .unwrap(),
            ClaimUpdate::Claimed(Timestamp::new(5))
        );
        assert_eq!(
            store
                .claim_winner(lottery.id, &code("PMP-AAAA-AAAA"), Timestamp::new(9))
                .unwrap(),
            ClaimUpdate::AlreadyClaimed(Timestamp::new(5))
        );
    }

    #[test]
    fn failing_guard_appends() {
        let store = NullStore::new();
        store.fail_guard_appends(true);
        let record = GuardRecord {
            ip_hash: IdentityHash::ZERO,
            fp_hash: IdentityHash::ZERO,
            text_hash: IdentityHash::ZERO,
            created_at: Timestamp::new(1),
        };
        assert!(store.append_guard_record(&record).is_err());
        assert_eq!(store.guard_record_count(), 0);
    }
}
