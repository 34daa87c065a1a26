//! LMDB implementation of TicketStore.

use pmp_store::{StoreError, Ticket, TicketRange, TicketStore};
use pmp_types::TicketCode;

use crate::environment::LmdbEnvironment;
use crate::LmdbError;

impl TicketStore for LmdbEnvironment {
    fn insert_ticket(&self, ticket: &Ticket) -> Result<(), StoreError> {
        let key = ticket.code.as_str().as_bytes();
        let value = bincode::serialize(ticket).map_err(LmdbError::from)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        if self
            .tickets_db
            .get(&wtxn, key)
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::Duplicate(format!("ticket {}", ticket.code)));
        }
        self.tickets_db
            .put(&mut wtxn, key, &value)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_ticket(&self, code: &TicketCode) -> Result<Option<Ticket>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self
            .tickets_db
            .get(&rtxn, code.as_str().as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes).map_err(LmdbError::from)?)),
            None => Ok(None),
        }
    }

    fn ticket_codes(&self, range: TicketRange) -> Result<Vec<TicketCode>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut codes = Vec::new();
        for result in self.tickets_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (_, bytes) = result.map_err(LmdbError::from)?;
            let ticket: Ticket = bincode::deserialize(bytes).map_err(LmdbError::from)?;
            if range.contains(ticket.created_at) {
                codes.push(ticket.code);
            }
        }
        Ok(codes)
    }

    fn ticket_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.tickets_db.len(&rtxn).map_err(LmdbError::from)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::test_support::temp_env;
    use pmp_types::Timestamp;

    fn ticket(code: &str, at: u64) -> Ticket {
        Ticket {
            code: TicketCode::parse(code).unwrap(),
            created_at: Timestamp::new(at),
        }
    }

    #[test]
    fn insert_and_get() {
        let (_dir, env) = temp_env();
        let t = ticket("PMP-ABCD-EFGH", 10);
        env.insert_ticket(&t).unwrap();
        assert_eq!(env.get_ticket(&t.code).unwrap(), Some(t.clone()));
        assert!(env.ticket_exists(&t.code).unwrap());
        assert_eq!(env.ticket_count().unwrap(), 1);
    }

    #[test]
    fn duplicate_code_rejected_and_original_kept() {
        let (_dir, env) = temp_env();
        env.insert_ticket(&ticket("PMP-ABCD-EFGH", 10)).unwrap();
        let err = env.insert_ticket(&ticket("PMP-ABCD-EFGH", 99)).unwrap_err();
        assert!(err.is_duplicate());
        let stored = env
            .get_ticket(&TicketCode::parse("PMP-ABCD-EFGH").unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(stored.created_at, Timestamp::new(10));
    }

    #[test]
    fn codes_filtered_by_inclusive_range() {
        let (_dir, env) = temp_env();
        env.insert_ticket(&ticket("PMP-AAAA-AAAA", 10)).unwrap();
        env.insert_ticket(&ticket("PMP-BBBB-BBBB", 20)).unwrap();
        env.insert_ticket(&ticket("PMP-CCCC-CCCC", 30)).unwrap();

        let range = TicketRange {
            from: Some(Timestamp::new(20)),
            to: Some(Timestamp::new(30)),
        };
        let mut codes: Vec<String> = env
            .ticket_codes(range)
            .unwrap()
            .into_iter()
            .map(String::from)
            .collect();
        codes.sort();
        assert_eq!(codes, vec!["PMP-BBBB-BBBB", "PMP-CCCC-CCCC"]);
        assert_eq!(env.ticket_codes(TicketRange::all()).unwrap().len(), 3);
    }

    #[test]
    fn unknown_ticket_is_none() {
        let (_dir, env) = temp_env();
        let code = TicketCode::parse("PMP-ZZZZ-ZZZZ").unwrap();
        assert_eq!(env.get_ticket(&code).unwrap(), None);
    }
}
