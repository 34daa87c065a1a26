//! Captcha verification oracle.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use pmp_service::{ServiceConfig, ServiceError};

const TURNSTILE_VERIFY_URL: &str = "https://challenges.cloudflare.com/turnstile/v0/siteverify";

#[derive(Serialize)]
struct SiteverifyRequest<'a> {
    secret: &'a str,
    response: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    remoteip: Option<&'a str>,
}

#[derive(Deserialize)]
struct SiteverifyResponse {
    success: bool,
    #[serde(rename = "error-codes", default)]
    error_codes: Vec<String>,
}

/// Yes/no verdict on a captcha token.
#[derive(Clone, Debug)]
pub enum CaptchaVerifier {
    /// Cloudflare Turnstile `siteverify`.
    Turnstile {
        client: reqwest::Client,
        secret: String,
        endpoint: String,
    },
    /// Development mode: every token passes.
    AllowAll,
    /// No secret and no development override.
    Unconfigured,
}

impl CaptchaVerifier {
    pub fn from_config(config: &ServiceConfig) -> Self {
        match config.turnstile_secret.as_deref().map(str::trim) {
            Some(secret) if !secret.is_empty() => Self::turnstile(secret, TURNSTILE_VERIFY_URL),
            _ if config.allow_unverified_captcha => {
                tracing::warn!("captcha verification disabled; every token is accepted");
                CaptchaVerifier::AllowAll
            }
            _ => CaptchaVerifier::Unconfigured,
        }
    }

    pub fn turnstile(secret: &str, endpoint: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        CaptchaVerifier::Turnstile {
            client,
            secret: secret.to_string(),
            endpoint: endpoint.to_string(),
        }
    }

    /// Ask the oracle about `token`. Transport failures count as a failed
    /// verification; only a missing configuration is an error.
    pub async fn verify(&self, token: &str, remote_ip: Option<&str>) -> Result<bool, ServiceError> {
        match self {
            CaptchaVerifier::AllowAll => Ok(true),
            CaptchaVerifier::Unconfigured => Err(ServiceError::Configuration(
                "turnstile_secret is not set".to_string(),
            )),
            CaptchaVerifier::Turnstile {
                client,
                secret,
                endpoint,
            } => {
                let request = SiteverifyRequest {
                    secret,
                    response: token,
                    remoteip: remote_ip,
                };
                let response = match client.post(endpoint).json(&request).send().await {
                    Ok(response) => response,
                    Err(e) => {
                        tracing::warn!(error = %e, "captcha verification request failed");
                        return Ok(false);
                    }
                };
                match response.json::<SiteverifyResponse>().await {
                    Ok(body) if body.success => Ok(true),
                    Ok(body) => {
                        tracing::info!(codes = ?body.error_codes, "captcha rejected");
                        Ok(false)
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "unreadable captcha verification response");
                        Ok(false)
                    }
                }
            }
        }
    }
}
