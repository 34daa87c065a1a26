//! Prometheus metrics for the campaign.
//!
//! [`CampaignMetrics`] owns a dedicated [`Registry`] that the `/metrics`
//! endpoint encodes into the Prometheus text exposition format.

use prometheus::{
    register_int_counter_vec_with_registry, register_int_counter_with_registry, Encoder,
    IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::ServiceError;

pub struct CampaignMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    pub confessions_accepted: IntCounter,
    /// Refused submissions, labelled by reason class.
    pub submissions_rejected: IntCounterVec,
    pub tickets_issued: IntCounter,
    /// Codes drawn that were already taken.
    pub ticket_collisions: IntCounter,
    /// Vote requests, labelled by outcome.
    pub votes: IntCounterVec,
    pub draws: IntCounter,
    pub winners_selected: IntCounter,
    /// Claim requests, labelled by outcome.
    pub claims: IntCounterVec,
}

impl CampaignMetrics {
    /// Create a fresh set of metrics under a new [`Registry`].
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let confessions_accepted = register_int_counter_with_registry!(
            Opts::new(
                "pmp_confessions_accepted_total",
                "Confessions accepted and stored"
            ),
            registry
        )?;

        let submissions_rejected = register_int_counter_vec_with_registry!(
            Opts::new(
                "pmp_submissions_rejected_total",
                "Confession submissions refused, by reason"
            ),
            &["reason"],
            registry
        )?;

        let tickets_issued = register_int_counter_with_registry!(
            Opts::new("pmp_tickets_issued_total", "Ticket codes issued"),
            registry
        )?;

        let ticket_collisions = register_int_counter_with_registry!(
            Opts::new(
                "pmp_ticket_collisions_total",
                "Generated ticket codes that were already taken"
            ),
            registry
        )?;

        let votes = register_int_counter_vec_with_registry!(
            Opts::new("pmp_votes_total", "Vote requests, by outcome"),
            &["outcome"],
            registry
        )?;

        let draws = register_int_counter_with_registry!(
            Opts::new("pmp_draws_total", "Lottery draws completed"),
            registry
        )?;

        let winners_selected = register_int_counter_with_registry!(
            Opts::new("pmp_winners_selected_total", "Winner rows inserted"),
            registry
        )?;

        let claims = register_int_counter_vec_with_registry!(
            Opts::new("pmp_claims_total", "Claim requests, by outcome"),
            &["outcome"],
            registry
        )?;

        Ok(Self {
            registry,
            confessions_accepted,
            submissions_rejected,
            tickets_issued,
            ticket_collisions,
            votes,
            draws,
            winners_selected,
            claims,
        })
    }

    /// Encode every metric in the Prometheus text format.
    pub fn encode(&self) -> Result<String, ServiceError> {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buf)
            .map_err(|e| ServiceError::Storage(format!("metrics encoding: {e}")))?;
        String::from_utf8(buf).map_err(|e| ServiceError::Storage(format!("metrics encoding: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_appear_in_text_output() {
        let metrics = CampaignMetrics::new().unwrap();
        metrics.confessions_accepted.inc();
        metrics
            .submissions_rejected
            .with_label_values(&["cooldown"])
            .inc();
        let text = metrics.encode().unwrap();
        assert!(text.contains("pmp_confessions_accepted_total 1"));
        assert!(text.contains("pmp_submissions_rejected_total{reason=\"cooldown\"} 1"));
    }

    #[test]
    fn independent_registries() {
        let a = CampaignMetrics::new().unwrap();
        let b = CampaignMetrics::new().unwrap();
        a.draws.inc();
        assert_eq!(b.draws.get(), 0);
    }
}
