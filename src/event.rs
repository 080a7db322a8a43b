//! Parsing of the inbound SNS envelope carrying a CloudWatch alarm message.

use crate::core::AlarmEvent;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EventError {
    #[error("invalid notification envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    #[error("notification envelope contains no records")]
    NoRecords,

    #[error("invalid alarm message: {0}")]
    Message(#[source] serde_json::Error),

    #[error("invalid StateChangeTime {value:?}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

#[derive(Debug, Deserialize)]
struct SnsEnvelope {
    #[serde(rename = "Records")]
    records: Vec<SnsRecord>,
}

#[derive(Debug, Deserialize)]
struct SnsRecord {
    #[serde(rename = "Sns")]
    sns: SnsNotification,
}

#[derive(Debug, Deserialize)]
struct SnsNotification {
    #[serde(rename = "Message")]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AlarmMessage {
    alarm_name: String,
    #[serde(rename = "AWSAccountId")]
    aws_account_id: String,
    region: String,
    state_change_time: String,
    trigger: AlarmTrigger,
    #[serde(default)]
    alarm_description: Option<String>,
    #[serde(default)]
    new_state_value: Option<String>,
    #[serde(default)]
    new_state_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AlarmTrigger {
    metric_name: String,
    namespace: String,
    period: u32,
    evaluation_periods: u32,
}

impl AlarmEvent {
    /// Extracts the alarm from the first record of an SNS envelope.
    pub fn from_sns_envelope(payload: &Value) -> Result<Self, EventError> {
        let envelope = SnsEnvelope::deserialize(payload).map_err(EventError::Envelope)?;
        let record = envelope
            .records
            .into_iter()
            .next()
            .ok_or(EventError::NoRecords)?;
        Self::from_alarm_message(&record.sns.message)
    }

    /// Parses the JSON alarm message published by CloudWatch.
    pub fn from_alarm_message(message: &str) -> Result<Self, EventError> {
        let message: AlarmMessage = serde_json::from_str(message).map_err(EventError::Message)?;
        let state_change_time = parse_state_change_time(&message.state_change_time)?;

        Ok(Self {
            alarm_name: message.alarm_name,
            account_id: message.aws_account_id,
            region: message.region,
            state_change_time,
            metric_name: message.trigger.metric_name,
            metric_namespace: message.trigger.namespace,
            period_seconds: message.trigger.period,
            evaluation_periods: message.trigger.evaluation_periods,
            description: message.alarm_description.filter(|d| !d.is_empty()),
            new_state_value: message.new_state_value,
            new_state_reason: message.new_state_reason,
        })
    }
}

/// CloudWatch writes `2024-01-01T00:05:00.000+0000`, which is not RFC 3339.
fn parse_state_change_time(value: &str) -> Result<DateTime<Utc>, EventError> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .map(|time| time.with_timezone(&Utc))
        .map_err(|source| EventError::Timestamp {
            value: value.to_string(),
            source,
        })
}
