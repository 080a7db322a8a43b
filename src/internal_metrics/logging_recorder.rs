//! A metrics recorder that logs all captured metrics on demand.

use metrics::{Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit};
use metrics_util::registry::{AtomicStorage, Registry};
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// A metrics recorder that keeps counters and gauges in memory and logs them
/// through `tracing` when [`LoggingRecorder::log_snapshot`] is called.
#[derive(Clone)]
pub struct LoggingRecorder {
    registry: Arc<Registry<Key, AtomicStorage>>,
}

impl std::fmt::Debug for LoggingRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggingRecorder").finish_non_exhaustive()
    }
}

impl Default for LoggingRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggingRecorder {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Registry::new(AtomicStorage)),
        }
    }

    /// Returns the current value of a counter, summed over all label sets.
    pub fn counter_value(&self, name: &str) -> u64 {
        self.registry
            .get_counter_handles()
            .into_iter()
            .filter(|(key, _)| key.name() == name)
            .map(|(_, counter)| counter.load(Ordering::Relaxed))
            .sum()
    }

    /// Returns the current value of the counter carrying `label` (key, value).
    pub fn labeled_counter_value(&self, name: &str, label: (&str, &str)) -> u64 {
        self.registry
            .get_counter_handles()
            .into_iter()
            .filter(|(key, _)| {
                key.name() == name
                    && key
                        .labels()
                        .any(|l| l.key() == label.0 && l.value() == label.1)
            })
            .map(|(_, counter)| counter.load(Ordering::Relaxed))
            .sum()
    }

    /// Logs every non-zero counter and every gauge, then resets the counters
    /// so the next snapshot covers only what happened since.
    pub fn log_snapshot(&self) {
        tracing::debug!("--- Metrics Snapshot ---");

        for (key, counter) in self.registry.get_counter_handles() {
            let value = counter.swap(0, Ordering::Relaxed);
            if value > 0 {
                tracing::info!("[Counter] {}: {}", display_key(&key), value);
            }
        }

        for (key, gauge) in self.registry.get_gauge_handles() {
            let value = f64::from_bits(gauge.load(Ordering::Relaxed));
            tracing::info!("[Gauge] {}: {}", display_key(&key), value);
        }
        // Histograms (durations) are kept but not summarized.
    }
}

/// Renders `name` or `name{label="value",...}`.
fn display_key(key: &Key) -> String {
    let labels: Vec<String> = key
        .labels()
        .map(|label| format!("{}=\"{}\"", label.key(), label.value()))
        .collect();
    if labels.is_empty() {
        key.name().to_string()
    } else {
        format!("{}{{{}}}", key.name(), labels.join(","))
    }
}

impl Recorder for LoggingRecorder {
    // The snapshot prints keys only.
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        self.registry.get_or_create_counter(key, |c| c.clone()).into()
    }

    fn register_gauge(&self, key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        self.registry.get_or_create_gauge(key, |g| g.clone()).into()
    }

    fn register_histogram(&self, key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        self.registry.get_or_create_histogram(key, |h| h.clone()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn test_counters_sum_across_labels() {
        let recorder = LoggingRecorder::new();
        metrics::with_local_recorder(&recorder, || {
            metrics::counter!("notifications_sent_total", "channel" => "sns").increment(1);
            metrics::counter!("notifications_sent_total", "channel" => "email").increment(2);
        });

        assert_eq!(recorder.counter_value("notifications_sent_total"), 3);
        assert_eq!(
            recorder.labeled_counter_value("notifications_sent_total", ("channel", "email")),
            2
        );
        assert_eq!(recorder.counter_value("unknown_total"), 0);
    }

    #[test]
    #[traced_test]
    fn test_snapshot_logs_and_resets_counters() {
        let recorder = LoggingRecorder::new();
        metrics::with_local_recorder(&recorder, || {
            metrics::counter!("log_pages_fetched_total").increment(4);
        });

        recorder.log_snapshot();

        assert!(logs_contain("[Counter] log_pages_fetched_total: 4"));
        assert!(!logs_contain("Key("));
        assert_eq!(recorder.counter_value("log_pages_fetched_total"), 0);
    }

    #[test]
    #[traced_test]
    fn test_snapshot_shows_labels() {
        let recorder = LoggingRecorder::new();
        metrics::with_local_recorder(&recorder, || {
            metrics::counter!("notification_failures_total", "channel" => "email").increment(1);
        });

        recorder.log_snapshot();

        assert!(logs_contain(r#"[Counter] notification_failures_total{channel="email"}: 1"#));
    }

    #[test]
    fn test_display_key_without_labels() {
        assert_eq!(display_key(&Key::from_name("alarms_received_total")), "alarms_received_total");
    }
}
