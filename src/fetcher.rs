//! Retrieval of every log record matching a filter within a time window.
//!
//! The backend serves results in pages chained by continuation tokens. The
//! fetcher follows the chain in a loop bounded by a page cap and an optional
//! overall deadline, and fails the whole fetch on the first backend error.

use crate::config::FetchConfig;
use crate::core::{LogEventSource, LogQuery, LogRecord, LogSourceError, TimeWindow};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, instrument};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("log fetch failed on page {page}: {source}")]
    Page {
        page: usize,
        #[source]
        source: LogSourceError,
    },

    #[error("log fetch exceeded the limit of {max_pages} pages")]
    PageLimit { max_pages: usize },

    #[error("log fetch exceeded its deadline of {deadline:?} after {pages} pages")]
    Deadline { deadline: Duration, pages: usize },
}

/// Bounds on a single fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchLimits {
    pub max_pages: usize,
    pub deadline: Option<Duration>,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            max_pages: 100,
            deadline: None,
        }
    }
}

impl From<&FetchConfig> for FetchLimits {
    fn from(config: &FetchConfig) -> Self {
        Self {
            max_pages: config.max_pages,
            deadline: config.deadline_seconds.map(Duration::from_secs),
        }
    }
}

/// The records collected by a fetch and how many pages it took.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FetchedLogs {
    pub records: Vec<LogRecord>,
    pub pages: usize,
}

pub struct LogWindowFetcher {
    source: Arc<dyn LogEventSource>,
    limits: FetchLimits,
}

impl LogWindowFetcher {
    pub fn new(source: Arc<dyn LogEventSource>, limits: FetchLimits) -> Self {
        Self { source, limits }
    }

    /// Collects all records for `log_group` matching `filter_pattern` inside
    /// `window`, in backend order across pages.
    #[instrument(skip(self), fields(max_pages = self.limits.max_pages))]
    pub async fn fetch(
        &self,
        log_group: &str,
        filter_pattern: Option<&str>,
        window: TimeWindow,
    ) -> Result<FetchedLogs, FetchError> {
        let started = Instant::now();
        let mut query = LogQuery {
            log_group_name: log_group.to_string(),
            filter_pattern: filter_pattern.unwrap_or_default().to_string(),
            window,
            next_token: None,
        };
        let mut fetched = FetchedLogs::default();

        loop {
            if fetched.pages >= self.limits.max_pages {
                return Err(FetchError::PageLimit {
                    max_pages: self.limits.max_pages,
                });
            }

            let page_number = fetched.pages + 1;
            let page = match self.limits.deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_sub(started.elapsed());
                    tokio::time::timeout(remaining, self.source.fetch_page(&query))
                        .await
                        .map_err(|_| FetchError::Deadline {
                            deadline,
                            pages: fetched.pages,
                        })?
                }
                None => self.source.fetch_page(&query).await,
            }
            .map_err(|source| FetchError::Page {
                page: page_number,
                source,
            })?;

            fetched.pages = page_number;
            metrics::counter!("log_pages_fetched_total").increment(1);
            metrics::counter!("log_records_fetched_total").increment(page.records.len() as u64);
            debug!(page = page_number, records = page.records.len(), "Fetched log page");

            fetched.records.extend(page.records);

            match page.next_token.filter(|token| !token.is_empty()) {
                Some(token) => {
                    debug!(page = page_number, "Continuation token returned, fetching next page");
                    query.next_token = Some(token);
                }
                None => break,
            }
        }

        info!(
            pages = fetched.pages,
            records = fetched.records.len(),
            "Finished fetching log window"
        );
        Ok(fetched)
    }
}
