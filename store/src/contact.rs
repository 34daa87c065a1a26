//! Ticket contact storage trait.

use crate::StoreError;
use pmp_types::{TicketCode, Timestamp};
use serde::{Deserialize, Serialize};

/// Contact details registered against a ticket.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketContact {
    pub email: Option<String>,
    pub instagram: Option<String>,
    pub updated_at: Option<Timestamp>,
}

/// Fields to overwrite. `None` keeps whatever is stored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContactUpdate {
    pub email: Option<String>,
    pub instagram: Option<String>,
}

impl TicketContact {
    /// Apply an update: provided fields win, omitted fields are kept.
    pub fn merge(mut self, update: &ContactUpdate, at: Timestamp) -> Self {
        if let Some(email) = &update.email {
            self.email = Some(email.clone());
        }
        if let Some(instagram) = &update.instagram {
            self.instagram = Some(instagram.clone());
        }
        self.updated_at = Some(at);
        self
    }
}

/// Trait for contact storage operations.
pub trait ContactStore {
    /// Insert or merge contact details for a ticket, returning the stored row.
    fn upsert_contact(
        &self,
        code: &TicketCode,
        update: &ContactUpdate,
        at: Timestamp,
    ) -> Result<TicketContact, StoreError>;

    fn get_contact(&self, code: &TicketCode) -> Result<Option<TicketContact>, StoreError>;
}
