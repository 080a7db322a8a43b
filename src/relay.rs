//! The per-invocation pipeline, decoupled from the Lambda entry point.
//!
//! An invocation runs strictly in sequence: parse the alarm, resolve its
//! metric filter, fetch the log window, render the report, dispatch it. Any
//! failure ends the invocation with a single [`RelayError`].

use crate::{
    config::Config,
    core::{
        AlarmEvent, DispatchError, FilterLookupError, LogEventSource, LogFilterDefinition,
        MetricFilterLookup, Notifier, Report, TimeWindow,
    },
    event::EventError,
    fetcher::{FetchError, FetchLimits, LogWindowFetcher},
    formatting::ReportFormatter,
    notification::NotificationDispatcher,
    services::AwsServices,
};
use anyhow::{anyhow, Result};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

/// Reply sent back to the invoker on success.
pub const SUCCESS_MESSAGE: &str = "Success sending notifications";

#[derive(Error, Debug)]
pub enum RelayError {
    #[error(transparent)]
    Event(#[from] EventError),

    #[error(transparent)]
    FilterLookup(#[from] FilterLookupError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl RelayError {
    /// The pipeline stage that failed, used as a metrics label.
    pub fn stage(&self) -> &'static str {
        match self {
            RelayError::Event(_) => "event",
            RelayError::FilterLookup(_) => "filter_lookup",
            RelayError::Fetch(_) => "fetch",
            RelayError::Dispatch(_) => "dispatch",
        }
    }
}

/// Summary of a successful invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayOutcome {
    pub alarm_name: String,
    pub log_group: String,
    pub window: TimeWindow,
    pub records: usize,
    pub pages: usize,
    pub report: Report,
    /// Channels that accepted the report, in dispatch order.
    pub delivered: Vec<String>,
}

pub struct AlarmRelay {
    filter_lookup: Arc<dyn MetricFilterLookup>,
    fetcher: LogWindowFetcher,
    formatter: ReportFormatter,
    dispatcher: NotificationDispatcher,
    window_multiplier: u32,
    dry_run: bool,
}

impl AlarmRelay {
    /// Creates a new `AlarmRelayBuilder` to construct an `AlarmRelay`.
    pub fn builder(config: Config) -> AlarmRelayBuilder {
        AlarmRelayBuilder::new(config)
    }

    /// Runs the full pipeline for one inbound notification payload.
    #[instrument(skip_all)]
    pub async fn handle(&self, payload: &Value) -> Result<RelayOutcome, RelayError> {
        let start = Instant::now();
        let result = self.run(payload).await;
        metrics::histogram!("relay_duration_seconds").record(start.elapsed().as_secs_f64());

        if let Err(e) = &result {
            metrics::counter!("invocations_failed_total", "stage" => e.stage()).increment(1);
            error!(stage = e.stage(), error = %e, "Alarm relay failed");
        }
        result
    }

    async fn run(&self, payload: &Value) -> Result<RelayOutcome, RelayError> {
        let event = AlarmEvent::from_sns_envelope(payload)?;
        metrics::counter!("alarms_received_total").increment(1);
        info!(
            alarm = %event.alarm_name,
            metric = %event.metric_name,
            namespace = %event.metric_namespace,
            state_change_time = %event.state_change_time,
            "Received alarm notification"
        );

        let filter = self.resolve_filter(&event).await?;
        let window = TimeWindow::for_alarm(&event, self.window_multiplier);
        debug!(?window, log_group = %filter.log_group_name, "Resolved log window");

        let fetched = self
            .fetcher
            .fetch(&filter.log_group_name, filter.filter_pattern.as_deref(), window)
            .await?;

        let report = self
            .formatter
            .format(&fetched.records, &event, &filter.log_group_name);

        let delivered = if self.dry_run {
            info!(subject = %report.subject, body = %report.html_body, "Dry run, report not dispatched");
            Vec::new()
        } else {
            self.dispatcher.dispatch(&report).await?
        };

        info!(
            alarm = %event.alarm_name,
            records = fetched.records.len(),
            pages = fetched.pages,
            delivered = ?delivered,
            "Alarm relayed"
        );

        Ok(RelayOutcome {
            alarm_name: event.alarm_name,
            log_group: filter.log_group_name,
            window,
            records: fetched.records.len(),
            pages: fetched.pages,
            report,
            delivered,
        })
    }

    /// Takes the first filter attached to the alarm's metric.
    async fn resolve_filter(
        &self,
        event: &AlarmEvent,
    ) -> Result<LogFilterDefinition, FilterLookupError> {
        let filters = self
            .filter_lookup
            .lookup(&event.metric_name, &event.metric_namespace)
            .await?;
        if filters.len() > 1 {
            warn!(
                count = filters.len(),
                "Metric has several filters, using the first one only"
            );
        }

        let filter = filters
            .into_iter()
            .next()
            .ok_or_else(|| FilterLookupError::NotFound {
                metric: event.metric_name.clone(),
                namespace: event.metric_namespace.clone(),
            })?;
        if filter.log_group_name.is_empty() {
            return Err(FilterLookupError::MissingLogGroup {
                metric: event.metric_name.clone(),
                namespace: event.metric_namespace.clone(),
            });
        }
        Ok(filter)
    }
}

/// Builder for the relay.
///
/// Every collaborator can be overridden, which keeps the pipeline testable
/// without AWS. AWS clients are only created for collaborators that were not
/// overridden.
pub struct AlarmRelayBuilder {
    config: Config,
    filter_lookup_override: Option<Arc<dyn MetricFilterLookup>>,
    log_source_override: Option<Arc<dyn LogEventSource>>,
    notifiers_override: Option<Vec<Arc<dyn Notifier>>>,
    dry_run: bool,
}

impl AlarmRelayBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            filter_lookup_override: None,
            log_source_override: None,
            notifiers_override: None,
            dry_run: false,
        }
    }

    /// Overrides the metric filter lookup for testing.
    pub fn filter_lookup_override(mut self, lookup: Arc<dyn MetricFilterLookup>) -> Self {
        self.filter_lookup_override = Some(lookup);
        self
    }

    /// Overrides the log backend for testing.
    pub fn log_source_override(mut self, source: Arc<dyn LogEventSource>) -> Self {
        self.log_source_override = Some(source);
        self
    }

    /// Overrides the notification channels for testing.
    pub fn notifiers_override(mut self, notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        self.notifiers_override = Some(notifiers);
        self
    }

    /// Renders reports without sending them.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Builds all components, returning a ready `AlarmRelay`.
    #[instrument(skip_all)]
    pub async fn build(self) -> Result<AlarmRelay> {
        let config = self.config;
        config.validate()?;

        let needs_aws = self.filter_lookup_override.is_none()
            || self.log_source_override.is_none()
            || self.notifiers_override.is_none();
        let aws = if needs_aws {
            Some(AwsServices::load(&config).await)
        } else {
            None
        };

        let filter_lookup = self
            .filter_lookup_override
            .or_else(|| aws.as_ref().map(|s| s.logs.clone() as Arc<dyn MetricFilterLookup>))
            .ok_or_else(|| anyhow!("no metric filter lookup available"))?;
        let log_source = self
            .log_source_override
            .or_else(|| aws.as_ref().map(|s| s.logs.clone() as Arc<dyn LogEventSource>))
            .ok_or_else(|| anyhow!("no log source available"))?;
        let notifiers = self
            .notifiers_override
            .or_else(|| aws.map(|s| s.notifiers))
            .ok_or_else(|| anyhow!("no notification channels available"))?;

        let limits = FetchLimits::from(&config.fetch);
        let dispatcher = NotificationDispatcher::new(notifiers);
        debug!(
            channels = ?dispatcher.channels(),
            max_pages = limits.max_pages,
            deadline = ?limits.deadline,
            window_multiplier = config.fetch.window_multiplier,
            dry_run = self.dry_run,
            "Alarm relay built"
        );

        Ok(AlarmRelay {
            filter_lookup,
            fetcher: LogWindowFetcher::new(log_source, limits),
            formatter: ReportFormatter::from_config(&config),
            dispatcher,
            window_multiplier: config.fetch.window_multiplier,
            dry_run: self.dry_run,
        })
    }
}
