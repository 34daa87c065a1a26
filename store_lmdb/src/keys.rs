//! Composite key helpers.
//!
//! Keys are built from big-endian integers so LMDB's lexicographic byte
//! order matches numeric order, which makes time windows and per-owner
//! listings plain range scans.

use std::ops::Bound;

use heed::types::Bytes;
use heed::{Database, RoTxn};

use pmp_types::{IdentityHash, LotteryId, TicketCode, Timestamp};

use crate::LmdbError;

/// Turn `prefix` into the smallest key greater than every key starting
/// with `prefix`. An all-`0xFF` prefix becomes empty, meaning "no bound".
pub fn increment_prefix(prefix: &mut Vec<u8>) {
    while let Some(last) = prefix.pop() {
        if last < 0xFF {
            prefix.push(last + 1);
            return;
        }
    }
}

/// `created_at_be ++ serial_be`: time-ordered, unique per appended row.
pub fn time_serial_key(at: Timestamp, serial: u64) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&at.to_be_bytes());
    key[8..].copy_from_slice(&serial.to_be_bytes());
    key
}

/// `ip_hash ++ at_be`: one counter bucket per IP and second.
pub fn attempt_key(ip_hash: &IdentityHash, at: Timestamp) -> [u8; 40] {
    let mut key = [0u8; 40];
    key[..32].copy_from_slice(ip_hash.as_bytes());
    key[32..].copy_from_slice(&at.to_be_bytes());
    key
}

/// `lottery_id_be ++ code`: all winners of a lottery share the id prefix.
pub fn winner_key(lottery_id: LotteryId, code: &TicketCode) -> Vec<u8> {
    let c = code.as_str().as_bytes();
    let mut key = Vec::with_capacity(8 + c.len());
    key.extend_from_slice(&lottery_id.to_be_bytes());
    key.extend_from_slice(c);
    key
}

/// Decode a big-endian `u64` value.
pub fn decode_u64(bytes: &[u8]) -> Result<u64, LmdbError> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| LmdbError::Serialization("expected 8-byte integer".into()))?;
    Ok(u64::from_be_bytes(arr))
}

/// Collect every `(key, value)` pair with `lower <= key < upper`
/// (`upper = None` scans to the end of the database).
pub fn range_scan(
    db: &Database<Bytes, Bytes>,
    rtxn: &RoTxn,
    lower: &[u8],
    upper: Option<&[u8]>,
) -> Result<Vec<(Vec<u8>, Vec<u8>)>, LmdbError> {
    let bounds: (Bound<&[u8]>, Bound<&[u8]>) = match upper {
        Some(upper) => (Bound::Included(lower), Bound::Excluded(upper)),
        None => (Bound::Included(lower), Bound::Unbounded),
    };
    let iter = db.range(rtxn, &bounds)?;
    let mut results = Vec::new();
    for result in iter {
        let (key, val) = result?;
        results.push((key.to_vec(), val.to_vec()));
    }
    Ok(results)
}

/// Collect every value whose key starts with `prefix`.
pub fn prefix_scan_values(
    db: &Database<Bytes, Bytes>,
    rtxn: &RoTxn,
    prefix: &[u8],
) -> Result<Vec<Vec<u8>>, LmdbError> {
    let mut upper = prefix.to_vec();
    increment_prefix(&mut upper);
    let upper = if upper.is_empty() { None } else { Some(upper.as_slice()) };
    Ok(range_scan(db, rtxn, prefix, upper)?
        .into_iter()
        .map(|(_, v)| v)
        .collect())
}
