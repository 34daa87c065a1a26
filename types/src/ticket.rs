//! Ticket codes of the form `PMP-XXXX-XXXX`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::PmpError;

/// The 32 symbols a ticket code is drawn from.
///
/// Visually ambiguous characters (`I`, `O`, `0`, `1`) are excluded so codes
/// can be read aloud and retyped without confusion.
pub const TICKET_ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Number of random symbols in a code (two groups of four).
pub const TICKET_SYMBOLS: usize = 8;

/// A syntactically valid, normalized (upper-case) ticket code.
///
/// Holding a `TicketCode` says nothing about whether the code was ever
/// issued; existence is checked against the ticket store.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TicketCode(String);

impl TicketCode {
    /// The fixed prefix of every code.
    pub const PREFIX: &'static str = "PMP-";

    /// Total length of a formatted code.
    pub const LEN: usize = 13;

    /// Trim surrounding whitespace and upper-case.
    pub fn normalize(raw: &str) -> String {
        raw.trim().to_uppercase()
    }

    /// Pure syntax check after normalization.
    pub fn is_valid(raw: &str) -> bool {
        is_well_formed(&Self::normalize(raw))
    }

    /// Normalize and validate user input.
    pub fn parse(raw: &str) -> Result<Self, PmpError> {
        let normalized = Self::normalize(raw);
        if is_well_formed(&normalized) {
            Ok(Self(normalized))
        } else {
            Err(PmpError::InvalidTicketCode)
        }
    }

    /// Build a code from raw entropy.
    ///
    /// Each of the eight bytes selects one symbol through its low five bits.
    /// 256 is a multiple of 32, so a uniform byte yields a uniform symbol.
    pub fn from_entropy(entropy: &[u8; TICKET_SYMBOLS]) -> Self {
        let mut code = String::with_capacity(Self::LEN);
        code.push_str(Self::PREFIX);
        for (i, byte) in entropy.iter().enumerate() {
            if i == 4 {
                code.push('-');
            }
            code.push(TICKET_ALPHABET[(byte & 0x1F) as usize] as char);
        }
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_well_formed(code: &str) -> bool {
    let bytes = code.as_bytes();
    if bytes.len() != TicketCode::LEN || !code.starts_with(TicketCode::PREFIX) {
        return false;
    }
    let body = &bytes[TicketCode::PREFIX.len()..];
    body.iter().enumerate().all(|(i, b)| match i {
        4 => *b == b'-',
        _ => TICKET_ALPHABET.contains(b),
    })
}

impl fmt::Display for TicketCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for TicketCode {
    type Error = PmpError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<TicketCode> for String {
    fn from(code: TicketCode) -> Self {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alphabet_excludes_ambiguous_symbols() {
        for c in [b'I', b'O', b'0', b'1'] {
            assert!(!TICKET_ALPHABET.contains(&c));
        }
        let mut sorted = TICKET_ALPHABET.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 32);
    }

    #[test]
    fn parse_normalizes_case_and_whitespace() {
        let code = TicketCode::parse("  pmp-abcd-efgh \n").unwrap();
        assert_eq!(code.as_str(), "PMP-ABCD-EFGH");
        assert_eq!(
            TicketCode::is_valid("pmp-abcd-efgh"),
            TicketCode::is_valid("PMP-ABCD-EFGH")
        );
    }

    #[test]
    fn rejects_ambiguous_and_malformed_codes() {
        assert!(!TicketCode::is_valid("PMP-ABCD-EFG1"));
        assert!(!TicketCode::is_valid("PMP-ABCD-EFGO"));
        assert!(!TicketCode::is_valid("PMP-ABCDEFGH"));
        assert!(!TicketCode::is_valid("XYZ-ABCD-EFGH"));
        assert!(!TicketCode::is_valid("PMP-ABCD-EFGHJ"));
        assert!(!TicketCode::is_valid("PMP-ABCD_EFGH"));
        assert!(!TicketCode::is_valid(""));
    }

    #[test]
    fn from_entropy_masks_to_alphabet() {
        let code = TicketCode::from_entropy(&[0, 1, 2, 3, 31, 32, 255, 64]);
        assert_eq!(code.as_str(), "PMP-ABCD-9A9A");
    }

    #[test]
    fn deserialization_validates() {
        let good = bincode::serialize("pmp-abcd-efgh").unwrap();
        let code: TicketCode = bincode::deserialize(&good).unwrap();
        assert_eq!(code.as_str(), "PMP-ABCD-EFGH");

        let bad = bincode::serialize("nope").unwrap();
        assert!(bincode::deserialize::<TicketCode>(&bad).is_err());
    }
}
