//! Configuration management for AlarmWatch
//!
//! This module defines the main `Config` struct and its sub-structs,
//! responsible for holding all relay settings. It uses the `figment` crate to
//! layer defaults, an optional `alarmwatch.toml` file, environment variables
//! and command-line arguments.

use crate::cli::Cli;
use crate::formatting::RedactionConfig;
use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

const DEFAULT_CONFIG_FILE: &str = "alarmwatch.toml";

/// The main configuration struct for the relay.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// The logging level, used when `RUST_LOG` is not set.
    pub log_level: String,
    /// Destinations for the report.
    pub notification: NotificationConfig,
    /// Settings for console deep links.
    pub console: ConsoleConfig,
    /// Report rendering and redaction.
    pub report: ReportConfig,
    /// Log window and pagination bounds.
    pub fetch: FetchConfig,
    /// Internal metrics.
    pub metrics: MetricsConfig,
}

/// Destinations for the rendered report.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct NotificationConfig {
    /// Sender address for the email channel.
    pub from_address: Option<String>,
    /// Recipients for the email channel. Empty disables email.
    pub to_addresses: Vec<String>,
    /// SNS topic for the broadcast channel. Unset disables broadcast.
    pub topic_arn: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ConsoleConfig {
    /// Region used when building links to the CloudWatch console.
    pub region: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct ReportConfig {
    /// Prefix for the subject line, e.g. "PRD/STG".
    pub environment_tag: Option<String>,
    pub redaction: RedactionConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FetchConfig {
    /// Safety margin applied to the alarm's evaluation span.
    pub window_multiplier: u32,
    /// Maximum number of pages followed before the fetch fails.
    pub max_pages: usize,
    /// Overall time budget for one fetch, in seconds.
    pub deadline_seconds: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct MetricsConfig {
    /// Log a snapshot of the internal counters after every invocation.
    pub log_metrics: bool,
}

impl Config {
    /// Loads the configuration by layering sources: defaults, file,
    /// environment, and CLI args.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| DEFAULT_CONFIG_FILE.into());

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            // e.g. ALARMWATCH_REPORT__ENVIRONMENT_TAG=PRD
            .merge(Env::prefixed("ALARMWATCH_").split("__"))
            .merge(cli)
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings that would make every invocation fail.
    pub fn validate(&self) -> Result<()> {
        if self.fetch.window_multiplier == 0 {
            bail!("fetch.window_multiplier must be at least 1");
        }
        if self.fetch.max_pages == 0 {
            bail!("fetch.max_pages must be at least 1");
        }
        if self.fetch.deadline_seconds == Some(0) {
            bail!("fetch.deadline_seconds must be at least 1 when set");
        }
        if !self.notification.to_addresses.is_empty() && self.notification.from_address.is_none() {
            bail!("notification.from_address is required when to_addresses is set");
        }
        Ok(())
    }
}

// Provide a default implementation for tests and easy setup.
impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            notification: NotificationConfig::default(),
            console: ConsoleConfig {
                region: "us-west-2".to_string(),
            },
            report: ReportConfig::default(),
            fetch: FetchConfig {
                window_multiplier: 1,
                max_pages: 100,
                deadline_seconds: None,
            },
            metrics: MetricsConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_zero_multiplier_is_rejected() {
        let mut config = Config::default();
        config.fetch.window_multiplier = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_recipients_require_sender() {
        let mut config = Config::default();
        config.notification.to_addresses = vec!["oncall@example.com".to_string()];
        assert!(config.validate().is_err());

        config.notification.from_address = Some("alerts@example.com".to_string());
        assert!(config.validate().is_ok());
    }
}
