use proptest::prelude::*;

use pmp_types::{IdentityHash, TicketCode, Timestamp, TICKET_ALPHABET};

proptest! {
    /// Every entropy input yields a well-formed code.
    #[test]
    fn code_from_entropy_is_valid(entropy in prop::array::uniform8(0u8..)) {
        let code = TicketCode::from_entropy(&entropy);
        prop_assert!(TicketCode::is_valid(code.as_str()));
        prop_assert_eq!(code.as_str().len(), TicketCode::LEN);
    }

    /// validate(normalize(code)) holds, including for lower-cased input.
    #[test]
    fn normalized_code_roundtrip(entropy in prop::array::uniform8(0u8..)) {
        let code = TicketCode::from_entropy(&entropy);
        let lowered = code.as_str().to_lowercase();
        prop_assert!(TicketCode::is_valid(&TicketCode::normalize(&lowered)));
        prop_assert_eq!(TicketCode::parse(&lowered).unwrap(), code);
    }

    /// Codes containing any symbol outside the alphabet are rejected.
    #[test]
    fn foreign_symbol_is_rejected(pos in 0usize..8, c in prop::char::range('!', '~')) {
        let upper = c.to_ascii_uppercase();
        prop_assume!(!TICKET_ALPHABET.contains(&(upper as u8)));
        let mut body: Vec<char> = "ABCDEFGH".chars().collect();
        body[pos] = c;
        let raw: String = format!(
            "PMP-{}-{}",
            body[..4].iter().collect::<String>(),
            body[4..].iter().collect::<String>()
        );
        prop_assert!(!TicketCode::is_valid(&raw));
    }

    /// IdentityHash hex roundtrip.
    #[test]
    fn identity_hash_hex_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let hash = IdentityHash::new(bytes);
        prop_assert_eq!(IdentityHash::from_hex(&hash.to_hex()).unwrap(), hash);
    }

    /// IdentityHash bincode serialization roundtrip.
    #[test]
    fn identity_hash_bincode_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let hash = IdentityHash::new(bytes);
        let encoded = bincode::serialize(&hash).unwrap();
        let decoded: IdentityHash = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded, hash);
    }

    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::new(a);
        let tb = Timestamp::new(b);
        prop_assert_eq!(ta <= tb, a <= b);
        prop_assert_eq!(ta.to_be_bytes() <= tb.to_be_bytes(), a <= b);
    }

    /// Timestamp elapsed_since: elapsed_since(now) = now - self (saturating).
    #[test]
    fn timestamp_elapsed_since(base in 0u64..1_000_000, offset in 0u64..1_000_000) {
        let t = Timestamp::new(base);
        let now = Timestamp::new(base + offset);
        prop_assert_eq!(t.elapsed_since(now), offset);
    }

    /// A record is inside a window iff it is no older than the window length.
    #[test]
    fn window_start_membership(now in 0u64..10_000_000, window in 1u64..100_000, age in 0u64..200_000) {
        prop_assume!(age <= now);
        let now = Timestamp::new(now);
        let record = Timestamp::new(now.as_secs() - age);
        prop_assert_eq!(record >= now.window_start(window), age <= window);
    }
}
