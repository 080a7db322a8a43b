// src/formatting.rs

use crate::config::Config;
use crate::core::{AlarmEvent, LogRecord, Report};
use chrono::Local;
use handlebars::html_escape;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Top-level fields stripped from structured log messages by default.
pub const DEFAULT_DENYLIST: &[&str] = &[
    "accessKeyId",
    "accountId",
    "attributes",
    "awsRegion",
    "code",
    "creationDate",
    "eventType",
    "eventVersion",
    "mfaAuthenticated",
    "principalId",
    "recipientAccountId",
    "requestID",
    "requestId",
    "sessionContext",
    "sessionIssuer",
    "sourceIPAddress",
    "type",
    "userAgent",
    "userName",
    "webIdFederationData",
];

pub const DEFAULT_TRUNCATE_CHARS: usize = 255;

/// Characters left as-is in deep-link components.
const LINK_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RedactionStrategy {
    /// Drop denylisted top-level fields from JSON messages.
    #[default]
    Denylist,
    /// Cut every message to a fixed number of characters.
    Truncate,
}

/// How log messages are redacted before they are placed in a report.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RedactionConfig {
    pub strategy: RedactionStrategy,
    /// Field names removed under the `denylist` strategy.
    pub denylist: Vec<String>,
    /// Character cap under the `truncate` strategy.
    pub truncate_chars: usize,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            strategy: RedactionStrategy::Denylist,
            denylist: DEFAULT_DENYLIST.iter().map(|f| f.to_string()).collect(),
            truncate_chars: DEFAULT_TRUNCATE_CHARS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Redaction {
    Denylist(HashSet<String>),
    Truncate(usize),
}

impl From<&RedactionConfig> for Redaction {
    fn from(config: &RedactionConfig) -> Self {
        match config.strategy {
            RedactionStrategy::Denylist => {
                Redaction::Denylist(config.denylist.iter().cloned().collect())
            }
            RedactionStrategy::Truncate => Redaction::Truncate(config.truncate_chars),
        }
    }
}

/// Renders fetched log records and alarm metadata into an HTML report.
#[derive(Debug, Clone)]
pub struct ReportFormatter {
    console_region: String,
    environment_tag: Option<String>,
    destination: Option<String>,
    redaction: Redaction,
}

impl ReportFormatter {
    pub fn new(
        console_region: String,
        environment_tag: Option<String>,
        destination: Option<String>,
        redaction: &RedactionConfig,
    ) -> Self {
        Self {
            console_region,
            environment_tag: environment_tag.filter(|tag| !tag.is_empty()),
            destination,
            redaction: redaction.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.console.region.clone(),
            config.report.environment_tag.clone(),
            config.notification.topic_arn.clone(),
            &config.report.redaction,
        )
    }

    /// Builds the report. Never fails, whatever the records contain.
    pub fn format(&self, records: &[LogRecord], event: &AlarmEvent, log_group: &str) -> Report {
        let mut log_data = String::from("<br/>Logs:<br/><style> pre {color: red;} </style>");
        for record in records {
            log_data.push_str(&format!(
                "<pre>Message:{}</pre><a href=\"{}\">More logs</a>",
                html_escape(&self.redact(&record.message)),
                self.record_link(log_group, record),
            ));
        }

        Report {
            subject: self.subject(&event.alarm_name),
            html_body: format!("{}{}", self.header(event), log_data),
            destination: self.destination.clone(),
        }
    }

    pub fn subject(&self, alarm_name: &str) -> String {
        match &self.environment_tag {
            Some(tag) => format!("{}: Details for Alarm - {}", tag, alarm_name),
            None => format!("Details for Alarm - {}", alarm_name),
        }
    }

    fn header(&self, event: &AlarmEvent) -> String {
        let alarm_time = event
            .state_change_time
            .with_timezone(&Local)
            .format("%a %b %d %Y %H:%M:%S GMT%z");

        let mut header = format!(
            "Alarm Name: <b>{}</b><br/>Account ID: {}<br/>Region: {}<br/>Alarm Time: {}<br/>",
            html_escape(&event.alarm_name),
            html_escape(&event.account_id),
            html_escape(&event.region),
            alarm_time,
        );
        if let Some(state) = &event.new_state_value {
            header.push_str(&format!("State: {}<br/>", html_escape(state)));
        }
        if let Some(reason) = &event.new_state_reason {
            header.push_str(&format!("Reason: {}<br/>", html_escape(reason)));
        }
        if let Some(description) = &event.description {
            header.push_str(&format!("Description: {}<br/>", html_escape(description)));
        }
        header
    }

    /// Applies the configured redaction. Anything but a JSON object comes back
    /// verbatim under the denylist.
    fn redact(&self, message: &str) -> String {
        match &self.redaction {
            Redaction::Truncate(max_chars) => message.chars().take(*max_chars).collect(),
            Redaction::Denylist(denied) => match serde_json::from_str::<Value>(message) {
                Ok(Value::Object(mut fields)) => {
                    fields.retain(|name, _| !denied.contains(name));
                    serde_json::to_string_pretty(&Value::Object(fields))
                        .unwrap_or_else(|_| message.to_string())
                }
                _ => message.to_string(),
            },
        }
    }

    /// Console deep link to the record within its stream.
    fn record_link(&self, log_group: &str, record: &LogRecord) -> String {
        format!(
            "https://console.aws.amazon.com/cloudwatch/home?region={}#logEventViewer:group={};stream={};start={};refEventId={}",
            utf8_percent_encode(&self.console_region, LINK_COMPONENT),
            utf8_percent_encode(log_group, LINK_COMPONENT),
            utf8_percent_encode(&record.log_stream_name, LINK_COMPONENT),
            record.timestamp,
            utf8_percent_encode(&record.event_id, LINK_COMPONENT),
        )
    }
}
