//! Submission guard: rate windows and duplicate detection.

use std::fmt;

use pmp_store::{GuardRecord, GuardStore};
use pmp_types::{IdentityHash, Timestamp};

use crate::{GuardError, GuardPolicy};

/// Why a submission was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardRejection {
    IpDailyLimit { max: u32, window_hours: u64 },
    DeviceDailyLimit { max: u32, window_hours: u64 },
    Cooldown { minutes: u64 },
    Duplicate,
    UnlockAttempts,
}

impl GuardRejection {
    /// Short label for metrics.
    pub fn class(&self) -> &'static str {
        match self {
            GuardRejection::IpDailyLimit { .. } => "ip_daily",
            GuardRejection::DeviceDailyLimit { .. } => "device_daily",
            GuardRejection::Cooldown { .. } => "cooldown",
            GuardRejection::Duplicate => "duplicate",
            GuardRejection::UnlockAttempts => "unlock_attempts",
        }
    }
}

impl fmt::Display for GuardRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardRejection::IpDailyLimit { max, window_hours } => {
                write!(f, "Maximum {max} confessions per {window_hours} hours")
            }
            GuardRejection::DeviceDailyLimit { max, window_hours } => {
                write!(f, "Maximum {max} confessions per {window_hours} hours per device")
            }
            GuardRejection::Cooldown { minutes } => {
                write!(f, "Please wait {minutes} minutes between submissions")
            }
            GuardRejection::Duplicate => f.write_str("Duplicate confession detected"),
            GuardRejection::UnlockAttempts => {
                f.write_str("Too many unlock attempts. Please try again later.")
            }
        }
    }
}

/// Outcome of a guard evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardVerdict {
    Allowed,
    Rejected(GuardRejection),
}

impl GuardVerdict {
    pub fn allowed(&self) -> bool {
        matches!(self, GuardVerdict::Allowed)
    }

    /// Human-readable reason, `None` when allowed.
    pub fn reason(&self) -> Option<String> {
        match self {
            GuardVerdict::Allowed => None,
            GuardVerdict::Rejected(r) => Some(r.to_string()),
        }
    }
}

/// Evaluates submissions against the guard log.
#[derive(Clone, Debug, Default)]
pub struct SubmissionGuard {
    policy: GuardPolicy,
}

impl SubmissionGuard {
    pub fn new(policy: GuardPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &GuardPolicy {
        &self.policy
    }

    /// Decide whether a submission may proceed.
    ///
    /// Reads every record inside the lookback window once and applies the
    /// checks in order; the first failing check decides the reason.
    pub fn evaluate<S: GuardStore + ?Sized>(
        &self,
        store: &S,
        ip_hash: &IdentityHash,
        fp_hash: &IdentityHash,
        text_hash: &IdentityHash,
        now: Timestamp,
    ) -> Result<GuardVerdict, GuardError> {
        let records = store.guard_records_since(now.window_start(self.policy.lookback_secs()))?;
        let verdict = self.check(&records, ip_hash, fp_hash, text_hash, now);
        if let GuardVerdict::Rejected(rejection) = verdict {
            tracing::info!(
                ip = %ip_hash.short(),
                fp = %fp_hash.short(),
                reason = rejection.class(),
                "submission rejected by guard"
            );
        }
        Ok(verdict)
    }

    fn check(
        &self,
        records: &[GuardRecord],
        ip_hash: &IdentityHash,
        fp_hash: &IdentityHash,
        text_hash: &IdentityHash,
        now: Timestamp,
    ) -> GuardVerdict {
        let daily_start = now.window_start(self.policy.daily_window_secs);
        let cooldown_start = now.window_start(self.policy.cooldown_secs);
        let window_hours = self.policy.daily_window_hours();

        let daily: Vec<&GuardRecord> = records
            .iter()
            .filter(|r| r.created_at >= daily_start)
            .collect();
        let recent: Vec<&GuardRecord> = records
            .iter()
            .filter(|r| r.created_at >= cooldown_start)
            .collect();

        let ip_daily = daily.iter().filter(|r| r.ip_hash == *ip_hash).count();
        if ip_daily >= self.policy.max_per_ip_daily as usize {
            return GuardVerdict::Rejected(GuardRejection::IpDailyLimit {
                max: self.policy.max_per_ip_daily,
                window_hours,
            });
        }

        let fp_daily = daily.iter().filter(|r| r.fp_hash == *fp_hash).count();
        if fp_daily >= self.policy.max_per_device_daily as usize {
            return GuardVerdict::Rejected(GuardRejection::DeviceDailyLimit {
                max: self.policy.max_per_device_daily,
                window_hours,
            });
        }

        let cooldown = GuardRejection::Cooldown {
            minutes: self.policy.cooldown_minutes(),
        };
        if recent.iter().any(|r| r.ip_hash == *ip_hash) {
            return GuardVerdict::Rejected(cooldown);
        }
        if recent.iter().any(|r| r.fp_hash == *fp_hash) {
            return GuardVerdict::Rejected(cooldown);
        }

        let duplicate = daily.iter().any(|r| {
            r.text_hash == *text_hash && (r.ip_hash == *ip_hash || r.fp_hash == *fp_hash)
        });
        if duplicate {
            return GuardVerdict::Rejected(GuardRejection::Duplicate);
        }

        GuardVerdict::Allowed
    }

    /// Append an accepted submission to the guard log.
    ///
    /// A failed append is logged and ignored; the submission it describes
    /// has already been accepted.
    pub fn record<S: GuardStore + ?Sized>(
        &self,
        store: &S,
        ip_hash: &IdentityHash,
        fp_hash: &IdentityHash,
        text_hash: &IdentityHash,
        now: Timestamp,
    ) {
        let record = GuardRecord {
            ip_hash: *ip_hash,
            fp_hash: *fp_hash,
            text_hash: *text_hash,
            created_at: now,
        };
        if let Err(e) = store.append_guard_record(&record) {
            tracing::warn!(ip = %ip_hash.short(), error = %e, "failed to append guard record");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmp_nullables::NullStore;

    const NOW: u64 = 1_700_000_000;
    const HOUR: u64 = 3600;

    fn h(b: u8) -> IdentityHash {
        IdentityHash::new([b; 32])
    }

    fn seed(store: &NullStore, ip: u8, fp: u8, text: u8, age_secs: u64) {
        store
            .append_guard_record(&GuardRecord {
                ip_hash: h(ip),
                fp_hash: h(fp),
                text_hash: h(text),
                created_at: Timestamp::new(NOW - age_secs),
            })
            .unwrap();
    }

    fn evaluate(store: &NullStore, ip: u8, fp: u8, text: u8) -> GuardVerdict {
        SubmissionGuard::default()
            .evaluate(store, &h(ip), &h(fp), &h(text), Timestamp::new(NOW))
            .unwrap()
    }

    #[test]
    fn empty_log_allows() {
        let store = NullStore::new();
        let verdict = evaluate(&store, 1, 2, 3);
        assert!(verdict.allowed());
        assert_eq!(verdict.reason(), None);
    }

    #[test]
    fn fourth_submission_from_ip_rejected() {
        let store = NullStore::new();
        seed(&store, 1, 10, 20, 3 * HOUR);
        seed(&store, 1, 11, 21, 2 * HOUR);
        seed(&store, 1, 12, 22, HOUR);
        let verdict = evaluate(&store, 1, 13, 23);
        assert_eq!(
            verdict.reason().as_deref(),
            Some("Maximum 3 confessions per 24 hours")
        );
    }

    #[test]
    fn two_prior_ip_records_allowed() {
        let store = NullStore::new();
        seed(&store, 1, 10, 20, 3 * HOUR);
        seed(&store, 1, 11, 21, 2 * HOUR);
        assert!(evaluate(&store, 1, 13, 23).allowed());
    }

    #[test]
    fn third_submission_from_device_rejected() {
        let store = NullStore::new();
        seed(&store, 1, 9, 20, 3 * HOUR);
        seed(&store, 2, 9, 21, 2 * HOUR);
        let verdict = evaluate(&store, 3, 9, 22);
        assert_eq!(
            verdict.reason().as_deref(),
            Some("Maximum 2 confessions per 24 hours per device")
        );
    }

    #[test]
    fn cooldown_applies_to_ip_and_device() {
        let store = NullStore::new();
        seed(&store, 1, 10, 20, 5 * 60);
        assert_eq!(
            evaluate(&store, 1, 99, 30).reason().as_deref(),
            Some("Please wait 10 minutes between submissions")
        );
        assert_eq!(
            evaluate(&store, 98, 10, 30).reason().as_deref(),
            Some("Please wait 10 minutes between submissions")
        );
        assert!(evaluate(&store, 98, 99, 30).allowed());
    }

    #[test]
    fn windows_are_inclusive() {
        let store = NullStore::new();
        seed(&store, 1, 10, 20, 10 * 60);
        assert!(!evaluate(&store, 1, 11, 21).allowed());

        let store = NullStore::new();
        seed(&store, 1, 10, 20, 10 * 60 + 1);
        assert!(evaluate(&store, 1, 11, 21).allowed());
    }

    #[test]
    fn duplicate_text_from_same_device_rejected_with_new_ip() {
        let store = NullStore::new();
        seed(&store, 1, 10, 77, 2 * HOUR);
        assert_eq!(
            evaluate(&store, 2, 10, 77).reason().as_deref(),
            Some("Duplicate confession detected")
        );
    }

    #[test]
    fn same_text_from_unrelated_identity_allowed() {
        let store = NullStore::new();
        seed(&store, 1, 10, 77, 2 * HOUR);
        assert!(evaluate(&store, 2, 11, 77).allowed());
    }

    #[test]
    fn records_older_than_a_day_ignored() {
        let store = NullStore::new();
        for _ in 0..5 {
            seed(&store, 1, 10, 77, 25 * HOUR);
        }
        assert!(evaluate(&store, 1, 10, 77).allowed());
    }

    #[test]
    fn ip_limit_checked_before_device_limit() {
        let store = NullStore::new();
        seed(&store, 1, 10, 20, 3 * HOUR);
        seed(&store, 1, 10, 21, 2 * HOUR);
        seed(&store, 1, 11, 22, HOUR);
        assert!(matches!(
            evaluate(&store, 1, 10, 23),
            GuardVerdict::Rejected(GuardRejection::IpDailyLimit { .. })
        ));
    }

    #[test]
    fn custom_policy_changes_messages() {
        let store = NullStore::new();
        seed(&store, 1, 10, 20, 60);
        let guard = SubmissionGuard::new(GuardPolicy {
            cooldown_secs: 300,
            ..GuardPolicy::default()
        });
        let verdict = guard
            .evaluate(&store, &h(1), &h(11), &h(21), Timestamp::new(NOW))
            .unwrap();
        assert_eq!(
            verdict.reason().as_deref(),
            Some("Please wait 5 minutes between submissions")
        );
    }

    #[test]
    fn failed_append_is_swallowed() {
        let store = NullStore::new();
        store.fail_guard_appends(true);
        SubmissionGuard::default().record(&store, &h(1), &h(2), &h(3), Timestamp::new(NOW));
        assert_eq!(store.guard_record_count(), 0);
    }

    #[test]
    fn record_then_evaluate_hits_cooldown() {
        let store = NullStore::new();
        let guard = SubmissionGuard::default();
        guard.record(&store, &h(1), &h(2), &h(3), Timestamp::new(NOW));
        let verdict = guard
            .evaluate(&store, &h(1), &h(4), &h(5), Timestamp::new(NOW + 1))
            .unwrap();
        assert!(matches!(
            verdict,
            GuardVerdict::Rejected(GuardRejection::Cooldown { minutes: 10 })
        ));
    }
}
