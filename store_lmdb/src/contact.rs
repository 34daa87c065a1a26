//! LMDB implementation of ContactStore.

use pmp_store::{ContactStore, ContactUpdate, StoreError, TicketContact};
use pmp_types::{TicketCode, Timestamp};

use crate::environment::LmdbEnvironment;
use crate::LmdbError;

impl ContactStore for LmdbEnvironment {
    fn upsert_contact(
        &self,
        code: &TicketCode,
        update: &ContactUpdate,
        at: Timestamp,
    ) -> Result<TicketContact, StoreError> {
        let key = code.as_str().as_bytes();
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let existing: TicketContact = match self.contacts_db.get(&wtxn, key).map_err(LmdbError::from)? {
            Some(bytes) => bincode::deserialize(bytes).map_err(LmdbError::from)?,
            None => TicketContact::default(),
        };
        let merged = existing.merge(update, at);
        let value = bincode::serialize(&merged).map_err(LmdbError::from)?;
        self.contacts_db
            .put(&mut wtxn, key, &value)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(merged)
    }

    fn get_contact(&self, code: &TicketCode) -> Result<Option<TicketContact>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self
            .contacts_db
            .get(&rtxn, code.as_str().as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes).map_err(LmdbError::from)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::test_support::temp_env;

    #[test]
    fn upsert_merges_fields() {
        let (_dir, env) = temp_env();
        let code = TicketCode::parse("PMP-AAAA-AAAA").unwrap();
        env.upsert_contact(
            &code,
            &ContactUpdate {
                email: Some("me@example.com".into()),
                instagram: None,
            },
            Timestamp::new(1),
        )
        .unwrap();
        let merged = env
            .upsert_contact(
                &code,
                &ContactUpdate {
                    email: None,
                    instagram: Some("handle".into()),
                },
                Timestamp::new(2),
            )
            .unwrap();
        assert_eq!(merged.email.as_deref(), Some("me@example.com"));
        assert_eq!(merged.instagram.as_deref(), Some("handle"));
        assert_eq!(env.get_contact(&code).unwrap(), Some(merged));
    }
}
