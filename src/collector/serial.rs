// src/collector/serial.rs
use crate::api::{DiaryPageSource, DiaryTarget};
use crate::config::CollectorConfig;
use crate::error::{AppError, FetchError};
use crate::error_recovery::retry_with_backoff;
use crate::model::{CombinedDiaryTable, DayResult};
use crate::pipeline::{process_page, DayOutcome, NoProgress, ProgressReporter};
use crate::types::{Credentials, DateRange};
use chrono::NaiveDate;
use futures::stream::{self, Stream, StreamExt};
use std::sync::Arc;

/// Walks a date range one day at a time.
///
/// Transient fetch failures are retried with backoff; anything else is
/// recorded against its day and the walk continues.
pub struct SerialCollector {
    source: Arc<dyn DiaryPageSource>,
    config: CollectorConfig,
    progress: Arc<dyn ProgressReporter>,
}

impl SerialCollector {
    pub fn new(source: Arc<dyn DiaryPageSource>, config: &CollectorConfig) -> Self {
        Self {
            source,
            config: config.clone(),
            progress: Arc::new(NoProgress),
        }
    }

    /// Opens a session and builds a collector over it. Authentication
    /// failures end here, before any day is fetched.
    pub async fn authenticated(
        config: &CollectorConfig,
        credentials: Option<&Credentials>,
        target: DiaryTarget,
    ) -> Result<Self, AppError> {
        let source = super::open_page_source(config, credentials, target).await?;
        Ok(Self::new(source, config))
    }

    pub fn with_progress(mut self, reporter: impl ProgressReporter + 'static) -> Self {
        self.progress = Arc::new(reporter);
        self
    }

    /// Lazy stream with one outcome per day of `range`, in date order.
    ///
    /// Nothing is fetched until the stream is polled. The stream is single
    /// pass; call `collect` again to start over.
    pub fn collect(&self, range: DateRange) -> impl Stream<Item = DayOutcome> + Send + 'static {
        let source = Arc::clone(&self.source);
        let progress = Arc::clone(&self.progress);
        let config = self.config.clone();
        let total = range.len_days();
        log::info!("Collecting {} ({} days, serial)", range, total);

        stream::iter(range.days().enumerate()).then(move |(i, date)| {
            let source = Arc::clone(&source);
            let progress = Arc::clone(&progress);
            let config = config.clone();
            async move {
                let result = fetch_day(source.as_ref(), date, &config).await;
                let outcome = DayOutcome {
                    date,
                    index: i + 1,
                    total,
                    result,
                };
                progress.report(outcome.progress());
                outcome
            }
        })
    }

    /// Runs [`collect`](Self::collect) to completion.
    pub async fn collect_all(&self, range: DateRange) -> CombinedDiaryTable {
        let combined = self
            .collect(range)
            .fold(CombinedDiaryTable::new(), |mut combined, outcome| async move {
                combined.record(outcome.date, outcome.result);
                combined
            })
            .await;
        log::info!("{}", combined.summary());
        combined
    }
}

async fn fetch_day(
    source: &dyn DiaryPageSource,
    date: NaiveDate,
    config: &CollectorConfig,
) -> DayResult {
    let fetched = retry_with_backoff(
        || source.fetch_page(date),
        FetchError::is_retryable,
        config.retry_attempts,
        config.retry_initial_delay,
        config.retry_max_delay,
    )
    .await;

    match fetched {
        Ok(page) => process_page(&page),
        Err(source) => {
            log::warn!("{}: {}", date, source);
            DayResult::Failed(AppError::Fetch { date, source })
        }
    }
}
