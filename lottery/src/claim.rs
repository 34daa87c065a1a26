//! One-time redemption of winning tickets.

use pmp_guard::{GuardVerdict, UnlockGuard};
use pmp_store::{AttemptStore, ClaimUpdate, LotteryStore};
use pmp_types::{IdentityHash, LotteryId, TicketCode, Timestamp};

use crate::LotteryError;

/// Name reported when the lottery id does not resolve.
pub const DEFAULT_LOTTERY_NAME: &str = "Lottery";

/// Business outcome of a claim that passed validation and rate limiting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClaimOutcome {
    Granted { lottery_name: String },
    NotWinner,
    AlreadyClaimed,
}

impl ClaimOutcome {
    pub fn ok(&self) -> bool {
        matches!(self, ClaimOutcome::Granted { .. })
    }

    pub fn message(&self) -> &'static str {
        match self {
            ClaimOutcome::Granted { .. } => "ACCESS GRANTED",
            ClaimOutcome::NotWinner => "The archive remains silent.",
            ClaimOutcome::AlreadyClaimed => "Already claimed.",
        }
    }

    /// Short label for metrics.
    pub fn class(&self) -> &'static str {
        match self {
            ClaimOutcome::Granted { .. } => "granted",
            ClaimOutcome::NotWinner => "not_winner",
            ClaimOutcome::AlreadyClaimed => "already_claimed",
        }
    }
}

/// Validates, rate-limits and records claims.
#[derive(Clone, Debug, Default)]
pub struct ClaimGate {
    guard: UnlockGuard,
}

impl ClaimGate {
    pub fn new(guard: UnlockGuard) -> Self {
        Self { guard }
    }

    /// Try to redeem `raw_code` in `lottery_id` on behalf of `ip_hash`.
    ///
    /// The code is checked before any storage access. Every attempt that
    /// passes the rate check is logged, whatever its outcome.
    pub fn claim<S: LotteryStore + AttemptStore + ?Sized>(
        &self,
        store: &S,
        raw_code: &str,
        lottery_id: LotteryId,
        ip_hash: &IdentityHash,
        now: Timestamp,
    ) -> Result<ClaimOutcome, LotteryError> {
        let code = TicketCode::parse(raw_code).map_err(|_| LotteryError::InvalidTicketCode)?;

        if let GuardVerdict::Rejected(rejection) = self.guard.evaluate(store, ip_hash, now)? {
            return Err(LotteryError::RateLimited(rejection.to_string()));
        }
        self.guard.record(store, ip_hash, now);

        let lottery_name = store
            .get_lottery(lottery_id)?
            .map(|l| l.name)
            .unwrap_or_else(|| DEFAULT_LOTTERY_NAME.to_string());

        let outcome = match store.claim_winner(lottery_id, &code, now)? {
            ClaimUpdate::Claimed(_) => ClaimOutcome::Granted { lottery_name },
            ClaimUpdate::AlreadyClaimed(_) => ClaimOutcome::AlreadyClaimed,
            ClaimUpdate::NotWinner => ClaimOutcome::NotWinner,
        };
        tracing::info!(
            lottery_id = %lottery_id,
            ip = %ip_hash.short(),
            outcome = outcome.class(),
            "claim processed"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmp_nullables::NullStore;

    fn ip(b: u8) -> IdentityHash {
        IdentityHash::new([b; 32])
    }

    fn setup() -> (NullStore, LotteryId, TicketCode) {
        let store = NullStore::new();
        let lottery = store.create_lottery("Spring Draw", Timestamp::new(1)).unwrap();
        let code = TicketCode::parse("PMP-WXYZ-2345").unwrap();
        store.insert_winners(lottery.id, &[code.clone()]).unwrap();
        (store, lottery.id, code)
    }

    #[test]
    fn granted_then_already_claimed() {
        let (store, lottery, code) = setup();
        let gate = ClaimGate::default();

        let first = gate
            .claim(&store, "pmp-wxyz-2345", lottery, &ip(1), Timestamp::new(100))
            .unwrap();
        assert_eq!(
            first,
            ClaimOutcome::Granted {
                lottery_name: "Spring Draw".into()
            }
        );
        assert_eq!(first.message(), "ACCESS GRANTED");

        let second = gate
            .claim(&store, code.as_str(), lottery, &ip(2), Timestamp::new(200))
            .unwrap();
        assert_eq!(second, ClaimOutcome::AlreadyClaimed);

        let row = store.get_winner(lottery, &code).unwrap().unwrap();
        assert_eq!(row.claimed_at, Some(Timestamp::new(100)));
    }

    #[test]
    fn non_winner_and_unknown_lottery_are_silent() {
        let (store, lottery, code) = setup();
        let gate = ClaimGate::default();
        let outcome = gate
            .claim(&store, "PMP-AAAA-AAAA", lottery, &ip(1), Timestamp::new(1))
            .unwrap();
        assert_eq!(outcome.message(), "The archive remains silent.");

        let outcome = gate
            .claim(&store, code.as_str(), LotteryId::new(99), &ip(1), Timestamp::new(1))
            .unwrap();
        assert_eq!(outcome, ClaimOutcome::NotWinner);
    }

    #[test]
    fn malformed_code_touches_nothing() {
        let (store, lottery, _) = setup();
        let gate = ClaimGate::default();
        let err = gate
            .claim(&store, "PMP-0000-0000", lottery, &ip(1), Timestamp::new(1))
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid ticket code format");
        assert_eq!(store.attempts_since(&ip(1), Timestamp::EPOCH).unwrap(), 0);
    }

    #[test]
    fn rate_limit_after_thirty_attempts() {
        let (store, lottery, _) = setup();
        let gate = ClaimGate::default();
        for _ in 0..30 {
            gate.claim(&store, "PMP-AAAA-AAAA", lottery, &ip(1), Timestamp::new(10))
                .unwrap();
        }
        let err = gate
            .claim(&store, "PMP-AAAA-AAAA", lottery, &ip(1), Timestamp::new(10))
            .unwrap_err();
        assert!(matches!(err, LotteryError::RateLimited(_)));
        assert_eq!(
            err.to_string(),
            "Too many unlock attempts. Please try again later."
        );
        // Rejected attempts are not logged.
        assert_eq!(store.attempts_since(&ip(1), Timestamp::EPOCH).unwrap(), 30);
    }

    #[test]
    fn default_name_when_lottery_missing() {
        let store = NullStore::new();
        let code = TicketCode::parse("PMP-WXYZ-2345").unwrap();
        // Winner row without a lottery row.
        store.insert_winners(LotteryId::new(5), &[code.clone()]).unwrap();
        let outcome = ClaimGate::default()
            .claim(&store, code.as_str(), LotteryId::new(5), &ip(1), Timestamp::new(1))
            .unwrap();
        assert_eq!(
            outcome,
            ClaimOutcome::Granted {
                lottery_name: DEFAULT_LOTTERY_NAME.into()
            }
        );
    }
}
