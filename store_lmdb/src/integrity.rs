//! LMDB database integrity checks.
//!
//! Run on startup to detect corruption before the service accepts requests.

use std::path::Path;

use heed::types::Bytes;

use crate::{LmdbEnvironment, LmdbError};

/// Summary of an integrity check run.
#[derive(Debug)]
pub struct IntegrityReport {
    pub databases_checked: u32,
    pub total_entries: u64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    /// Returns `true` if no errors were detected.
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Database names that a valid campaign environment contains.
pub const EXPECTED_DATABASES: &[&str] = &[
    "guard_records",
    "unlock_attempts",
    "tickets",
    "confessions",
    "confession_index",
    "votes",
    "vote_tallies",
    "lotteries",
    "lottery_winners",
    "ticket_contacts",
    "meta",
];

/// Check LMDB database integrity on startup.
///
/// Opens each expected database and counts its entries. Read failures are
/// recorded in the report rather than causing a hard error. The confession
/// index must have exactly one entry per confession.
pub fn check_integrity(env: &LmdbEnvironment) -> Result<IntegrityReport, LmdbError> {
    let mut report = IntegrityReport {
        databases_checked: 0,
        total_entries: 0,
        errors: Vec::new(),
    };

    let rtxn = env.env.read_txn()?;

    for &db_name in EXPECTED_DATABASES {
        match env.env.open_database::<Bytes, Bytes>(&rtxn, Some(db_name)) {
            Ok(Some(db)) => {
                report.databases_checked += 1;
                match db.len(&rtxn) {
                    Ok(count) => report.total_entries += count,
                    Err(e) => report
                        .errors
                        .push(format!("failed to read database '{}': {}", db_name, e)),
                }
            }
            Ok(None) => report
                .errors
                .push(format!("database '{}' is missing", db_name)),
            Err(e) => report
                .errors
                .push(format!("failed to open database '{}': {}", db_name, e)),
        }
    }

    let confessions = env.confessions_db.len(&rtxn)?;
    let indexed = env.confession_index_db.len(&rtxn)?;
    if confessions != indexed {
        report.errors.push(format!(
            "confession index has {} entries for {} confessions",
            indexed, confessions
        ));
    }

    Ok(report)
}

/// Check if the LMDB data directory looks valid before opening.
///
/// Returns `Ok(())` for a fresh (nonexistent) directory. Returns an error
/// if the directory exists but `data.mdb` is missing.
pub fn check_data_dir(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Ok(());
    }
    let data_file = path.join("data.mdb");
    if !data_file.exists() {
        return Err(format!(
            "LMDB directory exists but data.mdb is missing at {}",
            path.display()
        ));
    }
    Ok(())
}
