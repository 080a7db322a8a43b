//! Sends a report through every configured channel, in order.

use crate::core::{DispatchError, Notifier, Report};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

pub struct NotificationDispatcher {
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl NotificationDispatcher {
    pub fn new(notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        Self { notifiers }
    }

    pub fn channels(&self) -> Vec<&str> {
        self.notifiers.iter().map(|n| n.name()).collect()
    }

    /// Delivers the report once per channel and returns the channels that
    /// accepted it. The first failure aborts the remaining channels; channels
    /// already delivered stay delivered.
    #[instrument(skip_all, fields(subject = %report.subject))]
    pub async fn dispatch(&self, report: &Report) -> Result<Vec<String>, DispatchError> {
        if self.notifiers.is_empty() {
            warn!("No notification channels configured, report not sent.");
            return Ok(Vec::new());
        }

        let mut delivered = Vec::with_capacity(self.notifiers.len());
        for notifier in &self.notifiers {
            let channel = notifier.name().to_string();
            let start = Instant::now();
            let result = notifier.deliver(report).await;
            metrics::histogram!("notification_send_duration_seconds", "channel" => channel.clone())
                .record(start.elapsed().as_secs_f64());

            match result {
                Ok(()) => {
                    metrics::counter!("notifications_sent_total", "channel" => channel.clone())
                        .increment(1);
                    info!(channel = %channel, "Report delivered");
                    delivered.push(channel);
                }
                Err(e) => {
                    metrics::counter!("notification_failures_total", "channel" => channel.clone())
                        .increment(1);
                    error!(channel = %channel, error = %e, delivered = ?delivered, "Report delivery failed");
                    return Err(e);
                }
            }
        }
        Ok(delivered)
    }
}
