#![allow(dead_code)]
//! Metric filter lookups that never touch AWS.

use alarmwatch::core::{FilterLookupError, LogFilterDefinition, MetricFilterLookup};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Returns the same filters for every metric and records what was asked.
#[derive(Clone, Default)]
pub struct StaticFilterLookup {
    filters: Vec<LogFilterDefinition>,
    pub requests: Arc<Mutex<Vec<(String, String)>>>,
}

impl StaticFilterLookup {
    pub fn new(filters: Vec<LogFilterDefinition>) -> Self {
        Self {
            filters,
            requests: Arc::default(),
        }
    }

    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetricFilterLookup for StaticFilterLookup {
    async fn lookup(
        &self,
        metric_name: &str,
        metric_namespace: &str,
    ) -> Result<Vec<LogFilterDefinition>, FilterLookupError> {
        self.requests
            .lock()
            .unwrap()
            .push((metric_name.to_string(), metric_namespace.to_string()));
        Ok(self.filters.clone())
    }
}

/// Fails every lookup with a backend error.
#[derive(Clone, Default)]
pub struct FailingFilterLookup;

#[async_trait]
impl MetricFilterLookup for FailingFilterLookup {
    async fn lookup(
        &self,
        _metric_name: &str,
        _metric_namespace: &str,
    ) -> Result<Vec<LogFilterDefinition>, FilterLookupError> {
        Err(FilterLookupError::Backend("AccessDenied".to_string()))
    }
}
