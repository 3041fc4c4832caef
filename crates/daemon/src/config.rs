//! Startup configuration: flags with environment overrides

use crate::logging::LogFormat;
use clap::Parser;
use hookq_core::application::dispatcher::constants::{
    DEFAULT_DISPATCH_INTERVAL, DEFAULT_DISPATCH_LEASE, DEFAULT_FANOUT_CONCURRENCY,
    DEFAULT_SHUTDOWN_GRACE,
};
use hookq_core::application::DispatchConfig;
use hookq_core::error::{AppError, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_METADB: &str = "meta.db";
const DEFAULT_WORKSPACES: &str = "/home/workspaces";

#[derive(Debug, Clone, Parser)]
#[command(name = "hookq")]
#[command(about = "Multi-tenant message queue with webhook fan-out", long_about = None)]
#[command(version)]
pub struct Args {
    /// HTTP listen port
    #[arg(long, env = "HOOKQ_PORT", default_value_t = 8080)]
    pub port: u16,

    /// HTTP listen address (IP literal)
    #[arg(long, env = "HOOKQ_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Catalog database file
    #[arg(long, env = "HOOKQ_METADB", default_value = DEFAULT_METADB)]
    pub metadb: String,

    /// Root directory of the per-queue stores (`~` is expanded)
    #[arg(long, env = "HOOKQ_WORKSPACES", default_value = DEFAULT_WORKSPACES)]
    pub workspaces: String,

    /// Seconds between two dispatch sweeps
    #[arg(long, env = "HOOKQ_DISPATCH_INTERVAL_SECS", default_value_t = DEFAULT_DISPATCH_INTERVAL.as_secs())]
    pub dispatch_interval_secs: u64,

    /// Seconds a message stays leased while it is fanned out
    #[arg(long, env = "HOOKQ_LEASE_SECS", default_value_t = DEFAULT_DISPATCH_LEASE.as_secs())]
    pub lease_secs: u64,

    /// Maximum webhook requests in flight at once
    #[arg(long, env = "HOOKQ_FANOUT_CONCURRENCY", default_value_t = DEFAULT_FANOUT_CONCURRENCY)]
    pub fanout_concurrency: usize,

    /// Per-request webhook timeout; unset means no timeout
    #[arg(long, env = "HOOKQ_DELIVERY_TIMEOUT_SECS")]
    pub delivery_timeout_secs: Option<u64>,

    /// Seconds to wait for the dispatcher on shutdown
    #[arg(long, env = "HOOKQ_SHUTDOWN_TIMEOUT_SECS", default_value_t = DEFAULT_SHUTDOWN_GRACE.as_secs())]
    pub shutdown_timeout_secs: u64,

    #[arg(long, env = "HOOKQ_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Also write JSON logs to a daily rolling file in this directory
    #[arg(long, env = "HOOKQ_LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

/// Validated settings the daemon is wired from
#[derive(Debug, Clone)]
pub struct Settings {
    pub listen_addr: SocketAddr,
    pub metadb: String,
    pub workspaces: PathBuf,
    pub dispatch: DispatchConfig,
    pub fanout_concurrency: usize,
    pub delivery_timeout: Option<Duration>,
    pub shutdown_timeout: Duration,
    pub log_format: LogFormat,
    pub log_dir: Option<PathBuf>,
}

impl Args {
    pub fn into_settings(self) -> Result<Settings> {
        let listen_addr: SocketAddr = format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| {
                AppError::Config(format!(
                    "invalid listen address {}:{}: {}",
                    self.host, self.port, e
                ))
            })?;

        let dispatch = DispatchConfig {
            interval: Duration::from_secs(self.dispatch_interval_secs),
            lease: Duration::from_secs(self.lease_secs),
        };
        dispatch.validate()?;

        if self.fanout_concurrency == 0 {
            return Err(AppError::Config(
                "fan-out concurrency must be greater than 0".to_string(),
            ));
        }
        if self.delivery_timeout_secs == Some(0) {
            return Err(AppError::Config(
                "delivery timeout must be greater than 0 when set".to_string(),
            ));
        }

        Ok(Settings {
            listen_addr,
            metadb: shellexpand::tilde(&self.metadb).into_owned(),
            workspaces: PathBuf::from(shellexpand::tilde(&self.workspaces).into_owned()),
            dispatch,
            fanout_concurrency: self.fanout_concurrency,
            delivery_timeout: self.delivery_timeout_secs.map(Duration::from_secs),
            shutdown_timeout: Duration::from_secs(self.shutdown_timeout_secs),
            log_format: self.log_format,
            log_dir: self.log_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["hookq"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let settings = parse(&[]).into_settings().unwrap();
        assert_eq!(settings.listen_addr.port(), 8080);
        assert_eq!(settings.dispatch.interval, Duration::from_secs(5));
        assert_eq!(settings.dispatch.lease, Duration::from_secs(30));
        assert_eq!(settings.fanout_concurrency, 64);
        assert_eq!(settings.delivery_timeout, None);
        assert_eq!(settings.shutdown_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let err = parse(&["--dispatch-interval-secs", "0"])
            .into_settings()
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        let err = parse(&["--fanout-concurrency", "0"])
            .into_settings()
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_tilde_is_expanded() {
        let settings = parse(&["--workspaces", "~/ws"]).into_settings().unwrap();
        assert!(!settings.workspaces.to_string_lossy().starts_with('~'));
        assert!(settings.workspaces.ends_with("ws"));
    }

    #[test]
    fn test_bad_host_is_config_error() {
        let err = parse(&["--host", "not a host"]).into_settings().unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
