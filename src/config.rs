use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::Level;

use crate::waitlist::ConflictRetryPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Anything other than `production` (case-insensitive) is a development setup.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("production") {
            Self::Production
        } else {
            Self::Development
        }
    }

    pub fn is_production(self) -> bool {
        self == Self::Production
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub environment: Environment,
    pub log_level: Level,
    /// Raw `LOG_LEVEL` value that could not be parsed, reported once logging is up.
    pub rejected_log_level: Option<String>,
    /// Directory of the file store; `None` keeps ambulances in memory.
    pub data_dir: Option<PathBuf>,
    pub retry: ConflictRetryPolicy,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let value = |key: &str, default: &str| {
            lookup(key)
                .filter(|raw| !raw.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let port = value("AMBULANCE_API_PORT", "8080")
            .parse::<u16>()
            .context("AMBULANCE_API_PORT must be a valid port number")?;
        let host = value("AMBULANCE_API_HOST", "0.0.0.0");
        let bind_addr = format!("{host}:{port}")
            .parse::<SocketAddr>()
            .with_context(|| format!("AMBULANCE_API_HOST '{host}' must be an IP address"))?;

        let environment = Environment::parse(&value("AMBULANCE_API_ENVIRONMENT", "development"));

        let raw_level = value("LOG_LEVEL", "info");
        let (log_level, rejected_log_level) = match Level::from_str(raw_level.trim()) {
            Ok(level) => (level, None),
            Err(_) => (Level::INFO, Some(raw_level)),
        };

        let data_dir = lookup("AMBULANCE_API_DATA_DIR")
            .filter(|raw| !raw.trim().is_empty())
            .map(PathBuf::from);

        let defaults = ConflictRetryPolicy::default();
        let retry = ConflictRetryPolicy {
            max_attempts: value(
                "AMBULANCE_API_MAX_UPDATE_ATTEMPTS",
                &defaults.max_attempts.to_string(),
            )
            .parse::<u32>()
            .context("AMBULANCE_API_MAX_UPDATE_ATTEMPTS must be u32")?,
            initial_backoff_ms: value(
                "AMBULANCE_API_RETRY_BACKOFF_MS",
                &defaults.initial_backoff_ms.to_string(),
            )
            .parse::<u64>()
            .context("AMBULANCE_API_RETRY_BACKOFF_MS must be u64")?,
            max_backoff_ms: value(
                "AMBULANCE_API_RETRY_MAX_BACKOFF_MS",
                &defaults.max_backoff_ms.to_string(),
            )
            .parse::<u64>()
            .context("AMBULANCE_API_RETRY_MAX_BACKOFF_MS must be u64")?,
        };

        if retry.max_attempts == 0 {
            anyhow::bail!("AMBULANCE_API_MAX_UPDATE_ATTEMPTS must be at least 1");
        }

        Ok(Self {
            bind_addr,
            environment,
            log_level,
            rejected_log_level,
            data_dir,
            retry,
        })
    }

    pub fn apply(mut self, overrides: CliOverrides) -> Result<Self> {
        if let Some(port) = overrides.port {
            self.bind_addr.set_port(port);
        }
        if let Some(data_dir) = overrides.data_dir {
            self.data_dir = Some(data_dir);
        }
        if let Some(max_attempts) = overrides.max_update_attempts {
            if max_attempts == 0 {
                anyhow::bail!("--max-update-attempts must be at least 1");
            }
            self.retry.max_attempts = max_attempts;
        }
        Ok(self)
    }
}

/// Command-line flags; each one takes precedence over its environment variable.
#[derive(Debug, Default, Parser)]
#[command(name = "ambulance-waitlist")]
#[command(about = "Ambulance waiting-list API server")]
pub struct CliOverrides {
    /// Port to listen on (AMBULANCE_API_PORT).
    #[arg(long)]
    pub port: Option<u16>,
    /// Keep ambulances as JSON documents in this directory (AMBULANCE_API_DATA_DIR).
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
    /// Attempts per update before a version conflict is reported (AMBULANCE_API_MAX_UPDATE_ATTEMPTS).
    #[arg(long)]
    pub max_update_attempts: Option<u32>,
}
