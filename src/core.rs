//! Core domain types and service traits for AlarmWatch
//!
//! This module defines the data that flows through a single invocation and the
//! trait contracts behind which the log backend and the notification channels
//! sit.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A parsed alarm state-change notification.
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmEvent {
    /// Name of the alarm that changed state
    pub alarm_name: String,
    /// Account that owns the alarm
    pub account_id: String,
    /// Region the alarm lives in, as reported by the alarm
    pub region: String,
    /// When the alarm changed state
    pub state_change_time: DateTime<Utc>,
    /// Metric the alarm evaluates
    pub metric_name: String,
    /// Namespace of the metric
    pub metric_namespace: String,
    /// Length of one evaluation period in seconds
    pub period_seconds: u32,
    /// Number of periods evaluated before the state change
    pub evaluation_periods: u32,
    pub description: Option<String>,
    pub new_state_value: Option<String>,
    pub new_state_reason: Option<String>,
}

/// The log group and pattern behind a metric filter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct LogFilterDefinition {
    pub log_group_name: String,
    /// `None` or an empty pattern matches every record.
    pub filter_pattern: Option<String>,
}

/// An inclusive `[start, end]` range in milliseconds since the epoch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeWindow {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl TimeWindow {
    /// Builds the window ending at the alarm's state change and reaching back
    /// `multiplier` times the alarm's full evaluation span.
    pub fn for_alarm(event: &AlarmEvent, multiplier: u32) -> Self {
        let end_ms = event.state_change_time.timestamp_millis();
        let offset_ms = i64::from(multiplier)
            .saturating_mul(i64::from(event.period_seconds))
            .saturating_mul(i64::from(event.evaluation_periods))
            .saturating_mul(1000);
        Self {
            start_ms: end_ms.saturating_sub(offset_ms),
            end_ms,
        }
    }

    pub fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }
}

/// A single log event returned by the log backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct LogRecord {
    /// Raw message body, structured or not
    pub message: String,
    pub log_stream_name: String,
    /// Event time in milliseconds since the epoch
    pub timestamp: i64,
    pub event_id: String,
}

/// One request against the log backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    pub log_group_name: String,
    /// Empty matches every record.
    pub filter_pattern: String,
    pub window: TimeWindow,
    pub next_token: Option<String>,
}

/// One page of results and the token for the next page, if any.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogPage {
    pub records: Vec<LogRecord>,
    pub next_token: Option<String>,
}

/// The rendered notification for one alarm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub subject: String,
    pub html_body: String,
    /// Broadcast channel the report is published to
    pub destination: Option<String>,
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterLookupError {
    #[error("metric filter lookup failed: {0}")]
    Backend(String),

    #[error("no metric filter found for metric {namespace}/{metric}")]
    NotFound { metric: String, namespace: String },

    #[error("metric filter for {namespace}/{metric} has no log group")]
    MissingLogGroup { metric: String, namespace: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LogSourceError {
    #[error("log query failed: {0}")]
    Backend(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    #[error("{channel} delivery failed: {reason}")]
    Delivery { channel: String, reason: String },

    #[error("{channel} has no destination configured")]
    MissingDestination { channel: String },

    #[error("could not build {channel} message: {reason}")]
    InvalidMessage { channel: String, reason: String },
}

// =============================================================================
// Service Traits
// =============================================================================

/// Resolves a metric to the filter definitions that feed it
#[async_trait]
pub trait MetricFilterLookup: Send + Sync {
    /// Returns every filter definition attached to the metric, in backend order.
    ///
    /// # Returns
    /// * `Ok(filters)`, possibly empty
    /// * `Err` for transport or backend failures
    async fn lookup(
        &self,
        metric_name: &str,
        metric_namespace: &str,
    ) -> Result<Vec<LogFilterDefinition>, FilterLookupError>;
}

/// Serves pages of log records for a query
#[async_trait]
pub trait LogEventSource: Send + Sync {
    /// Fetches the single page addressed by `query.next_token`.
    async fn fetch_page(&self, query: &LogQuery) -> Result<LogPage, LogSourceError>;
}

/// Delivers a report through one notification channel
#[async_trait]
pub trait Notifier: Send + Sync {
    /// A short channel name (e.g., "sns", "email") used for logging and metrics.
    fn name(&self) -> &str;

    /// Sends the report once. No retries.
    async fn deliver(&self, report: &Report) -> Result<(), DispatchError>;
}
