/// AlarmWatch - relays CloudWatch alarms as log reports
///
/// On an alarm state change this library looks up the log filter behind the
/// alarm's metric, fetches the matching log records for the evaluation
/// window, renders a redacted HTML report and sends it over SNS and email.
pub mod cli;
pub mod cloudwatch;
pub mod config;
pub mod core;
pub mod event;
pub mod fetcher;
pub mod formatting;
pub mod internal_metrics;
pub mod notification;
pub mod relay;
pub mod services;

// Re-export core types for convenience
pub use crate::core::*;
pub use relay::{AlarmRelay, RelayError, RelayOutcome};
