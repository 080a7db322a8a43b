#![allow(dead_code)]
use alarmwatch::core::{DispatchError, Notifier, Report};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// A mock channel that keeps every report it was asked to deliver.
#[derive(Clone)]
pub struct RecordingNotifier {
    name: &'static str,
    fail: bool,
    pub sent: Arc<Mutex<Vec<Report>>>,
}

impl RecordingNotifier {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fail: false,
            sent: Arc::default(),
        }
    }

    pub fn failing(name: &'static str) -> Self {
        Self {
            fail: true,
            ..Self::new(name)
        }
    }

    pub fn sent(&self) -> Vec<Report> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        self.name
    }

    async fn deliver(&self, report: &Report) -> Result<(), DispatchError> {
        self.sent.lock().unwrap().push(report.clone());
        if self.fail {
            return Err(DispatchError::Delivery {
                channel: self.name.to_string(),
                reason: "MessageRejected".to_string(),
            });
        }
        Ok(())
    }
}
