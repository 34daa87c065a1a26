use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use pmp_crypto::OsEntropy;
use pmp_store::TicketStore;
use pmp_store_lmdb::LmdbEnvironment;
use pmp_tickets::TicketIssuer;
use pmp_types::{TicketCode, Timestamp};
use proptest::prelude::*;

#[test]
fn concurrent_issuance_never_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let env = Arc::new(LmdbEnvironment::open(dir.path(), 16, 64 * 1024 * 1024).unwrap());
    let issuer = TicketIssuer::new(Arc::new(OsEntropy));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let env = Arc::clone(&env);
            let issuer = issuer.clone();
            thread::spawn(move || {
                (0..250)
                    .map(|_| issuer.issue(env.as_ref(), Timestamp::new(1)).unwrap().ticket.code)
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for h in handles {
        for code in h.join().unwrap() {
            assert!(seen.insert(code));
        }
    }
    assert_eq!(env.ticket_count().unwrap(), 2_000);
}

proptest! {
    #[test]
    fn normalized_generated_codes_validate(seed in any::<[u8; 8]>()) {
        let code = TicketCode::from_entropy(&seed);
        prop_assert!(pmp_tickets::validate(&code.as_str().to_lowercase()));
        let padded = format!("  {}\t", code);
        prop_assert!(pmp_tickets::validate(&padded));
    }
}
