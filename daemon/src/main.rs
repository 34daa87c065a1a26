//! PMP daemon: entry point for running the confession campaign server.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;

use pmp_crypto::OsEntropy;
use pmp_rpc::{AppState, RpcServer};
use pmp_service::{Campaign, ServiceConfig};
use pmp_store_lmdb::{check_data_dir, check_integrity, LmdbEnvironment, Migrator};
use pmp_types::{LotteryId, SystemClock};
use pmp_utils::{init_logging, LogFormat};

/// Named databases plus headroom for later migrations.
const MAX_DBS: u32 = 16;

#[derive(Parser)]
#[command(name = "pmp-daemon", about = "PMP anonymous confession campaign server")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "PMP_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for the LMDB environment.
    #[arg(long, env = "PMP_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// LMDB map size in MiB.
    #[arg(long, env = "PMP_MAP_SIZE_MB")]
    map_size_mb: Option<usize>,

    /// Address to bind the HTTP server to.
    #[arg(long, env = "PMP_LISTEN_ADDR")]
    listen_addr: Option<String>,

    /// HTTP server port.
    #[arg(long, env = "PMP_PORT")]
    port: Option<u16>,

    /// Lottery used by claims that do not name one.
    #[arg(long, env = "PMP_CURRENT_LOTTERY_ID")]
    current_lottery_id: Option<u64>,

    /// Accept every captcha token when no Turnstile secret is set.
    #[arg(long, env = "PMP_ALLOW_UNVERIFIED_CAPTCHA")]
    allow_unverified_captcha: bool,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "PMP_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log output: "human" or "json".
    #[arg(long, env = "PMP_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Open storage and serve the HTTP API.
    Serve,
    /// Run the storage integrity check and exit.
    CheckDb,
    /// Print the effective configuration (secrets redacted) as TOML.
    PrintConfig,
}

/// Secrets are read from the environment only, never from flags.
fn apply_env_secrets(config: &mut ServiceConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(salt) = lookup("PMP_IP_HASH_SALT") {
        config.ip_hash_salt = salt;
    }
    if let Some(secret) = lookup("PMP_ADMIN_SECRET") {
        config.admin_secret = Some(secret);
    }
    if let Some(secret) = lookup("PMP_TURNSTILE_SECRET") {
        config.turnstile_secret = Some(secret);
    }
}

fn build_config(cli: &Cli) -> anyhow::Result<ServiceConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let path = path.to_string_lossy();
            ServiceConfig::from_toml_file(&path)
                .with_context(|| format!("loading config file {path}"))?
        }
        None => ServiceConfig::default(),
    };

    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(map_size_mb) = cli.map_size_mb {
        config.map_size_mb = map_size_mb;
    }
    if let Some(listen_addr) = &cli.listen_addr {
        config.listen_addr = listen_addr.clone();
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(id) = cli.current_lottery_id {
        config.current_lottery_id = Some(LotteryId::new(id));
    }
    config.allow_unverified_captcha |= cli.allow_unverified_captcha;
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }

    apply_env_secrets(&mut config, |key| {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    });
    Ok(config)
}

fn open_store(data_dir: &Path, map_size: usize) -> anyhow::Result<LmdbEnvironment> {
    check_data_dir(data_dir).map_err(anyhow::Error::msg)?;
    let env = LmdbEnvironment::open(data_dir, MAX_DBS, map_size)
        .with_context(|| format!("opening LMDB environment at {}", data_dir.display()))?;

    let version = Migrator::run(&env).context("running schema migrations")?;
    let report = check_integrity(&env).context("checking storage integrity")?;
    if !report.is_healthy() {
        for error in &report.errors {
            tracing::error!(error = %error, "integrity check failed");
        }
        bail!("storage integrity check failed with {} error(s)", report.errors.len());
    }
    tracing::info!(
        schema_version = version,
        databases = report.databases_checked,
        entries = report.total_entries,
        "storage ready"
    );
    Ok(env)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received, stopping server");
}

async fn serve(config: ServiceConfig) -> anyhow::Result<()> {
    config.validate()?;
    let env = Arc::new(open_store(&config.data_dir, config.map_size_bytes())?);

    if config.admin_secret.is_none() {
        tracing::warn!("PMP_ADMIN_SECRET is not set; admin endpoint will refuse every call");
    }
    if config.turnstile_secret.is_none() && !config.allow_unverified_captcha {
        tracing::warn!("PMP_TURNSTILE_SECRET is not set; confession submissions will fail");
    }
    if config.current_lottery_id.is_none() {
        tracing::info!("no current lottery configured; claims must name a lottery");
    }

    let campaign = Campaign::new(&config, env, Arc::new(SystemClock), Arc::new(OsEntropy))?;
    let state = AppState::new(Arc::new(campaign), &config);
    let server = RpcServer::new(config.socket_addr()?, state);
    server.start(shutdown_signal()).await?;

    tracing::info!("PMP daemon exited cleanly");
    Ok(())
}

fn redacted(mut config: ServiceConfig) -> ServiceConfig {
    let hide = |s: &mut Option<String>| {
        if s.is_some() {
            *s = Some("<redacted>".to_string());
        }
    };
    if !config.ip_hash_salt.is_empty() {
        config.ip_hash_salt = "<redacted>".to_string();
    }
    hide(&mut config.admin_secret);
    hide(&mut config.turnstile_secret);
    config
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = build_config(&cli)?;
    init_logging(config.log_format, &config.log_level);

    match cli.command {
        Command::Serve => {
            tracing::info!(
                addr = %config.listen_addr,
                port = config.port,
                data_dir = %config.data_dir.display(),
                "Starting PMP daemon"
            );
            serve(config).await
        }
        Command::CheckDb => {
            open_store(&config.data_dir, config.map_size_bytes())?;
            Ok(())
        }
        Command::PrintConfig => {
            print!("{}", redacted(config).to_toml_string()?);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_file_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pmp.toml");
        std::fs::write(
            &path,
            "port = 9000\nlog_level = \"debug\"\ncurrent_lottery_id = 2\n[guard]\ncooldown_secs = 30\n",
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "pmp-daemon",
            "--config",
            path.to_str().unwrap(),
            "--port",
            "9100",
            "--log-format",
            "json",
            "serve",
        ])
        .unwrap();
        let config = build_config(&cli).unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.current_lottery_id, Some(LotteryId::new(2)));
        assert_eq!(config.guard.cooldown_secs, 30);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let cli = Cli::try_parse_from(["pmp-daemon", "--config", "/nonexistent/pmp.toml", "serve"])
            .unwrap();
        assert!(build_config(&cli).is_err());
    }

    #[test]
    fn secrets_come_from_environment_lookup() {
        let mut config = ServiceConfig::default();
        apply_env_secrets(&mut config, |key| match key {
            "PMP_IP_HASH_SALT" => Some("pepper".to_string()),
            "PMP_ADMIN_SECRET" => Some("admin".to_string()),
            _ => None,
        });
        assert_eq!(config.ip_hash_salt, "pepper");
        assert_eq!(config.admin_secret.as_deref(), Some("admin"));
        assert_eq!(config.turnstile_secret, None);

        let shown = redacted(config).to_toml_string().unwrap();
        assert!(!shown.contains("pepper"));
        assert!(!shown.contains("\"admin\""));
    }

    #[test]
    fn store_opens_migrates_and_passes_integrity() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        open_store(&data_dir, 16 * 1024 * 1024).unwrap();
        // Reopening an initialized directory also succeeds.
        open_store(&data_dir, 16 * 1024 * 1024).unwrap();
    }
}
