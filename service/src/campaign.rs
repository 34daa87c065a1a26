//! Request flows of the confession campaign.

use std::sync::Arc;

use pmp_confessions::{BrowsePage, ConfessionLedger, VoteOutcome};
use pmp_crypto::{hash_fingerprint, hash_ip, hash_text, EntropySource};
use pmp_guard::{validate_confession, GuardVerdict, SubmissionGuard, UnlockGuard};
use pmp_lottery::{ClaimGate, ClaimOutcome, DrawEngine, DrawRequest, DrawResult, LotteryError};
use pmp_store::{CampaignStore, Lottery, LotteryWinner, TicketContact};
use pmp_tickets::TicketIssuer;
use pmp_types::{Clock, ConfessionId, LotteryId, TicketCode};

use crate::{normalize_contact, CampaignMetrics, ServiceConfig, ServiceError};

/// A confession as received from a client, after captcha verification.
#[derive(Clone, Debug, Default)]
pub struct Submission {
    pub text: String,
    pub fingerprint: String,
    /// Resolved client address; only its salted hash is kept.
    pub client_ip: String,
    pub captcha_verified: bool,
}

/// The campaign core.
///
/// Cheap to share behind an `Arc`; every method is synchronous and safe to
/// call from many threads at once.
pub struct Campaign {
    store: Arc<dyn CampaignStore>,
    clock: Arc<dyn Clock>,
    salt: String,
    guard: SubmissionGuard,
    issuer: TicketIssuer,
    ledger: ConfessionLedger,
    draws: DrawEngine,
    claims: ClaimGate,
    metrics: Arc<CampaignMetrics>,
}

impl Campaign {
    /// Build the campaign. Fails if the configuration has no IP salt.
    pub fn new(
        config: &ServiceConfig,
        store: Arc<dyn CampaignStore>,
        clock: Arc<dyn Clock>,
        entropy: Arc<dyn EntropySource>,
    ) -> Result<Self, ServiceError> {
        config.validate()?;
        let metrics = CampaignMetrics::new()
            .map_err(|e| ServiceError::Configuration(format!("metrics registry: {e}")))?;
        Ok(Self {
            store,
            clock,
            salt: config.ip_hash_salt.clone(),
            guard: SubmissionGuard::new(config.guard.clone()),
            issuer: TicketIssuer::new(entropy.clone()),
            ledger: ConfessionLedger,
            draws: DrawEngine::new(entropy),
            claims: ClaimGate::new(UnlockGuard::new(config.guard.clone())),
            metrics: Arc::new(metrics),
        })
    }

    pub fn metrics(&self) -> &CampaignMetrics {
        &self.metrics
    }

    /// Accept a confession and hand back its ticket.
    ///
    /// The confession is stored before its ticket is issued, so a failed
    /// insert never leaves a ticket (and a lottery entry) behind. The guard
    /// read and the final guard append are not atomic with the inserts; a
    /// burst of parallel submissions may slip one past a limit.
    pub fn submit_confession(&self, submission: &Submission) -> Result<TicketCode, ServiceError> {
        if submission.text.is_empty() || submission.fingerprint.is_empty() {
            return Err(ServiceError::Validation(
                "Missing required fields".to_string(),
            ));
        }
        if !submission.captcha_verified {
            self.reject("captcha");
            return Err(ServiceError::Validation(
                "Invalid verification token".to_string(),
            ));
        }
        let text = match validate_confession(&submission.text) {
            Ok(text) => text,
            Err(e) => {
                self.reject("content");
                return Err(e.into());
            }
        };

        let ip_hash = hash_ip(&submission.client_ip, &self.salt);
        let fp_hash = hash_fingerprint(&submission.fingerprint);
        let text_hash = hash_text(text);
        let now = self.clock.now();

        let verdict = self
            .guard
            .evaluate(&*self.store, &ip_hash, &fp_hash, &text_hash, now)?;
        if let GuardVerdict::Rejected(rejection) = verdict {
            self.reject(rejection.class());
            return Err(ServiceError::RateLimited(rejection.to_string()));
        }

        let id = self.ledger.submit(&*self.store, text, &text_hash, now)?;

        let issued = self.issuer.issue(&*self.store, now)?;
        self.metrics.tickets_issued.inc();
        self.metrics
            .ticket_collisions
            .inc_by(u64::from(issued.collisions));

        self.guard
            .record(&*self.store, &ip_hash, &fp_hash, &text_hash, now);
        self.metrics.confessions_accepted.inc();

        tracing::info!(
            confession_id = %id,
            ip = %ip_hash.short(),
            fp = %fp_hash.short(),
            "confession accepted"
        );
        Ok(issued.ticket.code)
    }

    fn reject(&self, reason: &str) {
        self.metrics
            .submissions_rejected
            .with_label_values(&[reason])
            .inc();
    }

    pub fn create_lottery(&self, name: &str) -> Result<Lottery, ServiceError> {
        Ok(self
            .draws
            .create_lottery(&*self.store, name, self.clock.now())?)
    }

    pub fn draw_winners(&self, request: &DrawRequest) -> Result<DrawResult, ServiceError> {
        let result = self.draws.draw(&*self.store, request)?;
        self.metrics.draws.inc();
        self.metrics
            .winners_selected
            .inc_by(result.winners.len() as u64);
        Ok(result)
    }

    pub fn list_winners(&self, lottery_id: LotteryId) -> Result<Vec<LotteryWinner>, ServiceError> {
        Ok(self.draws.list_winners(&*self.store, lottery_id)?)
    }

    /// Redeem a winning ticket. Negative verdicts are `Ok`.
    pub fn claim(
        &self,
        code: &str,
        lottery_id: LotteryId,
        client_ip: &str,
    ) -> Result<ClaimOutcome, ServiceError> {
        let ip_hash = hash_ip(client_ip, &self.salt);
        let result = self
            .claims
            .claim(&*self.store, code, lottery_id, &ip_hash, self.clock.now());
        let label = match &result {
            Ok(outcome) => outcome.class(),
            Err(LotteryError::RateLimited(_)) => "rate_limited",
            Err(LotteryError::InvalidTicketCode) => "invalid_code",
            Err(_) => "error",
        };
        self.metrics.claims.with_label_values(&[label]).inc();
        Ok(result?)
    }

    /// Attach an email and/or Instagram handle to an issued ticket.
    pub fn record_contact(
        &self,
        code: &str,
        email: Option<&str>,
        instagram: Option<&str>,
    ) -> Result<TicketContact, ServiceError> {
        let code = TicketCode::parse(code)
            .map_err(|_| ServiceError::Validation("Invalid ticket code format".to_string()))?;
        let update = normalize_contact(email, instagram)?;
        if !self.store.ticket_exists(&code)? {
            return Err(ServiceError::NotFound("Ticket code not found".to_string()));
        }
        let contact = self
            .store
            .upsert_contact(&code, &update, self.clock.now())?;
        tracing::info!(
            has_email = contact.email.is_some(),
            has_instagram = contact.instagram.is_some(),
            "contact recorded"
        );
        Ok(contact)
    }

    /// Resolve user input to an issued ticket.
    pub fn validate_ticket(&self, code: &str) -> Result<TicketCode, ServiceError> {
        Ok(self.ledger.check_ticket(&*self.store, code)?)
    }

    pub fn browse(
        &self,
        code: &str,
        offset: u64,
        limit: Option<u64>,
    ) -> Result<BrowsePage, ServiceError> {
        let code = self.validate_ticket(code)?;
        Ok(self.ledger.browse(&*self.store, &code, offset, limit)?)
    }

    pub fn vote(&self, code: &str, confession_id: ConfessionId) -> Result<VoteOutcome, ServiceError> {
        let code = self.validate_ticket(code)?;
        let outcome = self.ledger.cast_vote(&*self.store, &code, confession_id)?;
        let label = match outcome {
            VoteOutcome::Recorded => "recorded",
            VoteOutcome::AlreadyVoted => "already_voted",
            VoteOutcome::UnknownConfession => "unknown_confession",
        };
        self.metrics.votes.with_label_values(&[label]).inc();
        Ok(outcome)
    }
}
