//! CloudWatch Logs implementation of the metric-filter lookup and the paged
//! log query.

use crate::core::{
    FilterLookupError, LogEventSource, LogFilterDefinition, LogPage, LogQuery, LogRecord,
    LogSourceError, MetricFilterLookup,
};
use async_trait::async_trait;
use aws_sdk_cloudwatchlogs::error::DisplayErrorContext;
use aws_sdk_cloudwatchlogs::types::FilteredLogEvent;
use tracing::{debug, instrument};

/// Wraps the SDK client for both log-side operations.
#[derive(Clone, Debug)]
pub struct CloudWatchLogs {
    client: aws_sdk_cloudwatchlogs::Client,
}

impl CloudWatchLogs {
    pub fn new(client: aws_sdk_cloudwatchlogs::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MetricFilterLookup for CloudWatchLogs {
    #[instrument(skip(self))]
    async fn lookup(
        &self,
        metric_name: &str,
        metric_namespace: &str,
    ) -> Result<Vec<LogFilterDefinition>, FilterLookupError> {
        let output = self
            .client
            .describe_metric_filters()
            .metric_name(metric_name)
            .metric_namespace(metric_namespace)
            .send()
            .await
            .map_err(|e| FilterLookupError::Backend(DisplayErrorContext(&e).to_string()))?;

        let filters: Vec<LogFilterDefinition> = output
            .metric_filters()
            .iter()
            .map(|filter| LogFilterDefinition {
                log_group_name: filter.log_group_name().unwrap_or_default().to_string(),
                filter_pattern: filter.filter_pattern().map(str::to_string),
            })
            .collect();
        debug!(count = filters.len(), "Described metric filters");
        Ok(filters)
    }
}

#[async_trait]
impl LogEventSource for CloudWatchLogs {
    #[instrument(skip(self, query), fields(log_group = %query.log_group_name, has_token = query.next_token.is_some()))]
    async fn fetch_page(&self, query: &LogQuery) -> Result<LogPage, LogSourceError> {
        let mut request = self
            .client
            .filter_log_events()
            .log_group_name(&query.log_group_name)
            .start_time(query.window.start_ms)
            .end_time(query.window.end_ms)
            .set_next_token(query.next_token.clone());
        if !query.filter_pattern.is_empty() {
            request = request.filter_pattern(&query.filter_pattern);
        }

        let output = request
            .send()
            .await
            .map_err(|e| LogSourceError::Backend(DisplayErrorContext(&e).to_string()))?;

        Ok(LogPage {
            records: output.events().iter().map(to_record).collect(),
            next_token: output.next_token().map(str::to_string),
        })
    }
}

fn to_record(event: &FilteredLogEvent) -> LogRecord {
    LogRecord {
        message: event.message().unwrap_or_default().to_string(),
        log_stream_name: event.log_stream_name().unwrap_or_default().to_string(),
        timestamp: event.timestamp().unwrap_or_default(),
        event_id: event.event_id().unwrap_or_default().to_string(),
    }
}
