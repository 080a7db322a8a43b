#![allow(dead_code)]
//! Scripted log backends for exercising pagination.

use alarmwatch::core::{LogEventSource, LogPage, LogQuery, LogSourceError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Serves a fixed sequence of pages (or errors) and records every query.
#[derive(Clone, Default)]
pub struct PagedLogSource {
    responses: Arc<Mutex<VecDeque<Result<LogPage, LogSourceError>>>>,
    pub queries: Arc<Mutex<Vec<LogQuery>>>,
}

impl PagedLogSource {
    pub fn new(responses: Vec<Result<LogPage, LogSourceError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn pages(pages: Vec<LogPage>) -> Self {
        Self::new(pages.into_iter().map(Ok).collect())
    }

    pub fn queries(&self) -> Vec<LogQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl LogEventSource for PagedLogSource {
    async fn fetch_page(&self, query: &LogQuery) -> Result<LogPage, LogSourceError> {
        self.queries.lock().unwrap().push(query.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LogSourceError::Backend("no scripted page left".to_string())))
    }
}

/// Always returns a continuation token, optionally after a delay.
#[derive(Clone, Default)]
pub struct EndlessLogSource {
    pub delay: Option<Duration>,
    pub calls: Arc<Mutex<usize>>,
}

impl EndlessLogSource {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl LogEventSource for EndlessLogSource {
    async fn fetch_page(&self, _query: &LogQuery) -> Result<LogPage, LogSourceError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            *calls
        };
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(LogPage {
            records: Vec::new(),
            next_token: Some(format!("token-{}", call)),
        })
    }
}
