//! # Internal Metrics Module
//!
//! Metrics are recorded through the `metrics` facade at the call sites. When
//! `metrics.log_metrics` is enabled a [`LoggingRecorder`] is installed as the
//! global recorder and logs a snapshot after each invocation.

pub mod logging_recorder;

pub use logging_recorder::LoggingRecorder;

use anyhow::{anyhow, Result};

/// Installs a [`LoggingRecorder`] as the global recorder and returns a handle
/// for taking snapshots.
pub fn install_logging_recorder() -> Result<LoggingRecorder> {
    let recorder = LoggingRecorder::new();
    metrics::set_global_recorder(recorder.clone())
        .map_err(|_| anyhow!("a global metrics recorder is already installed"))?;
    Ok(recorder)
}
