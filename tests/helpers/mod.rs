#![allow(dead_code)]
pub mod fake_logs;
pub mod fake_lookup;
pub mod mock_notifier;

use alarmwatch::config::Config;
use alarmwatch::core::{LogFilterDefinition, LogPage, LogRecord};
use serde_json::{json, Value};

pub const STATE_CHANGE_TIME: &str = "2024-01-01T00:10:00.000+0000";
/// `STATE_CHANGE_TIME` in milliseconds since the epoch.
pub const STATE_CHANGE_MS: i64 = 1_704_067_800_000;

/// The message body CloudWatch publishes for an alarm state change.
pub fn alarm_message(alarm_name: &str, period: u32, evaluation_periods: u32) -> Value {
    json!({
        "AlarmName": alarm_name,
        "AlarmDescription": "Too many errors",
        "AWSAccountId": "123456789012",
        "NewStateValue": "ALARM",
        "NewStateReason": "Threshold Crossed: 1 datapoint [12.0] was greater than the threshold (10.0).",
        "StateChangeTime": STATE_CHANGE_TIME,
        "Region": "US West (Oregon)",
        "OldStateValue": "OK",
        "Trigger": {
            "MetricName": "ErrorCount",
            "Namespace": "App",
            "StatisticType": "Statistic",
            "Statistic": "SUM",
            "Unit": null,
            "Dimensions": [],
            "Period": period,
            "EvaluationPeriods": evaluation_periods,
            "ComparisonOperator": "GreaterThanThreshold",
            "Threshold": 10.0,
            "TreatMissingData": "- TreatMissingData: missing",
            "EvaluateLowSampleCountPercentile": ""
        }
    })
}

/// Wraps an alarm message the way SNS delivers it to a subscribed function.
pub fn sns_envelope(message: &Value) -> Value {
    json!({
        "Records": [{
            "EventSource": "aws:sns",
            "EventVersion": "1.0",
            "EventSubscriptionArn": "arn:aws:sns:us-west-2:123456789012:alarms:1f6a",
            "Sns": {
                "Type": "Notification",
                "MessageId": "95df01b4-ee98-5cb9-9903-4c221d41eb5e",
                "TopicArn": "arn:aws:sns:us-west-2:123456789012:alarms",
                "Subject": "ALARM: \"HighErrors\" in US West (Oregon)",
                "Message": message.to_string(),
                "Timestamp": "2024-01-01T00:10:01.000Z",
                "MessageAttributes": {}
            }
        }]
    })
}

pub fn alarm_envelope() -> Value {
    sns_envelope(&alarm_message("HighErrors", 60, 5))
}

pub fn filter(log_group: &str, pattern: &str) -> LogFilterDefinition {
    LogFilterDefinition {
        log_group_name: log_group.to_string(),
        filter_pattern: Some(pattern.to_string()),
    }
}

pub fn record(message: &str, stream: &str, event_id: &str) -> LogRecord {
    LogRecord {
        message: message.to_string(),
        log_stream_name: stream.to_string(),
        timestamp: STATE_CHANGE_MS - 1_000,
        event_id: event_id.to_string(),
    }
}

pub fn page(records: Vec<LogRecord>, next_token: Option<&str>) -> LogPage {
    LogPage {
        records,
        next_token: next_token.map(str::to_string),
    }
}

/// A configuration that needs no external files or AWS resources.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.notification.topic_arn = Some("arn:aws:sns:us-west-2:123456789012:reports".to_string());
    config
}
