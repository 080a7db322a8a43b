//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the relay using the
//! `clap` crate. These arguments are parsed at startup and then merged with
//! the configuration from the `alarmwatch.toml` file and environment variables.

use clap::Parser;
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// Relays CloudWatch alarms as log reports over SNS and email.
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Handle the SNS event stored in FILE once instead of serving Lambda invocations.
    #[arg(long, value_name = "FILE")]
    pub event: Option<PathBuf>,

    /// Render the report but do not send it.
    #[arg(long)]
    pub dry_run: bool,

    /// Prefix for the report subject line.
    #[arg(long, value_name = "TAG")]
    pub environment_tag: Option<String>,

    /// Safety multiplier for the log window.
    #[arg(long, value_name = "N")]
    pub window_multiplier: Option<u32>,

    /// SNS topic the report is published to.
    #[arg(long, value_name = "ARN")]
    pub topic_arn: Option<String>,

    /// The logging level.
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();

        if let Some(level) = &self.log_level {
            dict.insert("log_level".into(), Value::from(level.clone()));
        }

        let mut report = Dict::new();
        if let Some(tag) = &self.environment_tag {
            report.insert("environment_tag".into(), Value::from(tag.clone()));
        }
        if !report.is_empty() {
            dict.insert("report".into(), Value::from(report));
        }

        let mut fetch = Dict::new();
        if let Some(multiplier) = self.window_multiplier {
            fetch.insert("window_multiplier".into(), Value::from(multiplier));
        }
        if !fetch.is_empty() {
            dict.insert("fetch".into(), Value::from(fetch));
        }

        let mut notification = Dict::new();
        if let Some(arn) = &self.topic_arn {
            notification.insert("topic_arn".into(), Value::from(arn.clone()));
        }
        if !notification.is_empty() {
            dict.insert("notification".into(), Value::from(notification));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
