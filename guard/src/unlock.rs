//! Per-IP limit on lottery claim attempts.

use pmp_store::AttemptStore;
use pmp_types::{IdentityHash, Timestamp};

use crate::{GuardError, GuardPolicy, GuardRejection, GuardVerdict};

/// Rate limit for claim attempts, backed by the unlock-attempt log.
#[derive(Clone, Debug, Default)]
pub struct UnlockGuard {
    policy: GuardPolicy,
}

impl UnlockGuard {
    pub fn new(policy: GuardPolicy) -> Self {
        Self { policy }
    }

    /// Reject when the IP already made `max_unlock_attempts` attempts inside
    /// the trailing window.
    pub fn evaluate<S: AttemptStore + ?Sized>(
        &self,
        store: &S,
        ip_hash: &IdentityHash,
        now: Timestamp,
    ) -> Result<GuardVerdict, GuardError> {
        let cutoff = now.window_start(self.policy.unlock_window_secs);
        let attempts = store.attempts_since(ip_hash, cutoff)?;
        if attempts >= self.policy.max_unlock_attempts {
            tracing::info!(ip = %ip_hash.short(), attempts, "unlock attempts exhausted");
            return Ok(GuardVerdict::Rejected(GuardRejection::UnlockAttempts));
        }
        Ok(GuardVerdict::Allowed)
    }

    /// Log one attempt. Failure is logged and ignored.
    pub fn record<S: AttemptStore + ?Sized>(&self, store: &S, ip_hash: &IdentityHash, now: Timestamp) {
        if let Err(e) = store.record_attempt(ip_hash, now) {
            tracing::warn!(ip = %ip_hash.short(), error = %e, "failed to record unlock attempt");
        }
    }
}
