//! Service configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

use pmp_guard::GuardPolicy;
use pmp_types::LotteryId;
use pmp_utils::LogFormat;

use crate::ServiceError;

/// Configuration for a campaign server.
///
/// Can be loaded from a TOML file via [`ServiceConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Directory holding the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB map size in MiB.
    #[serde(default = "default_map_size_mb")]
    pub map_size_mb: usize,

    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Salt mixed into every IP hash. Required.
    #[serde(default)]
    pub ip_hash_salt: String,

    /// Shared secret for the admin endpoint. Admin calls are refused when unset.
    #[serde(default)]
    pub admin_secret: Option<String>,

    /// Cloudflare Turnstile secret key.
    #[serde(default)]
    pub turnstile_secret: Option<String>,

    /// Accept every captcha token when no Turnstile secret is configured.
    /// Development only.
    #[serde(default)]
    pub allow_unverified_captcha: bool,

    /// Lottery used by claims that do not name one.
    #[serde(default)]
    pub current_lottery_id: Option<LotteryId>,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub guard: GuardPolicy,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./pmp_data")
}

fn default_map_size_mb() -> usize {
    1024
}

fn default_listen_addr() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8787
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ServiceConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, ServiceError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ServiceError::Configuration(format!("{path}: {e}")))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ServiceError> {
        toml::from_str(s).map_err(|e| ServiceError::Configuration(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ServiceError> {
        toml::to_string_pretty(self).map_err(|e| ServiceError::Configuration(e.to_string()))
    }

    /// Check settings that have no usable default.
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.ip_hash_salt.trim().is_empty() {
            return Err(ServiceError::Configuration(
                "ip_hash_salt must be set".to_string(),
            ));
        }
        if self.map_size_mb == 0 {
            return Err(ServiceError::Configuration(
                "map_size_mb must be positive".to_string(),
            ));
        }
        self.socket_addr()?;
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ServiceError> {
        format!("{}:{}", self.listen_addr, self.port)
            .parse()
            .map_err(|e| ServiceError::Configuration(format!("listen address: {e}")))
    }

    pub fn map_size_bytes(&self) -> usize {
        self.map_size_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            map_size_mb: default_map_size_mb(),
            listen_addr: default_listen_addr(),
            port: default_port(),
            ip_hash_salt: String::new(),
            admin_secret: None,
            turnstile_secret: None,
            allow_unverified_captcha: false,
            current_lottery_id: None,
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            guard: GuardPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let mut config = ServiceConfig::default();
        config.current_lottery_id = Some(LotteryId::new(4));
        let toml_str = config.to_toml_string().unwrap();
        let parsed = ServiceConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed.port, config.port);
        assert_eq!(parsed.current_lottery_id, Some(LotteryId::new(4)));
        assert_eq!(parsed.guard, config.guard);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = ServiceConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.port, 8787);
        assert_eq!(config.map_size_mb, 1024);
        assert_eq!(config.log_format, LogFormat::Human);
        assert_eq!(config.guard.max_per_ip_daily, 3);
        assert!(!config.allow_unverified_captcha);
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            port = 9999
            ip_hash_salt = "pepper"
            log_format = "json"

            [guard]
            max_unlock_attempts = 5
        "#;
        let config = ServiceConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.port, 9999);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.guard.max_unlock_attempts, 5);
        assert_eq!(config.guard.cooldown_secs, 600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_salt_fails_validation() {
        let config = ServiceConfig::default();
        let err = config.validate().unwrap_err();
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn bad_listen_addr_fails_validation() {
        let config = ServiceConfig {
            ip_hash_salt: "s".into(),
            listen_addr: "not an address".into(),
            ..ServiceConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_toml_is_config_error() {
        assert!(matches!(
            ServiceConfig::from_toml_str("port = \"eighty\""),
            Err(ServiceError::Configuration(_))
        ));
    }
}
