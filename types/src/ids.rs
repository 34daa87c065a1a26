//! Numeric record identifiers.
//!
//! Ids are assigned by the store from a monotonically increasing sequence
//! and serialize as plain JSON numbers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::PmpError;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub fn new(raw: u64) -> Self {
                Self(raw)
            }

            pub fn get(&self) -> u64 {
                self.0
            }

            pub fn to_be_bytes(&self) -> [u8; 8] {
                self.0.to_be_bytes()
            }

            pub fn from_be_bytes(bytes: [u8; 8]) -> Self {
                Self(u64::from_be_bytes(bytes))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = PmpError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<u64>()
                    .map(Self)
                    .map_err(|_| PmpError::InvalidId(s.to_string()))
            }
        }
    };
}

numeric_id!(
    /// Identifier of a stored confession.
    ConfessionId
);

numeric_id!(
    /// Identifier of a lottery round.
    LotteryId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_trimmed_decimal() {
        assert_eq!(" 42 ".parse::<LotteryId>().unwrap(), LotteryId::new(42));
        assert!("abc".parse::<ConfessionId>().is_err());
    }
}
