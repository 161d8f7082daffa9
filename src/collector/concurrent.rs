// src/collector/concurrent.rs
use crate::api::{DiaryPageSource, DiaryTarget, RawPage};
use crate::config::CollectorConfig;
use crate::error::{AppError, FetchError, RangeRejection};
use crate::model::{CombinedDiaryTable, DayResult};
use crate::pipeline::{process_page, NoProgress, ProgressEvent, ProgressReporter};
use crate::types::{Credentials, DateRange};
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Fetches a whole range through a bounded in-flight window.
///
/// Fetches complete in any order; results are keyed by date and parsed in
/// date order once every fetch has resolved.
pub struct ConcurrentCollector {
    source: Arc<dyn DiaryPageSource>,
    config: CollectorConfig,
    progress: Arc<dyn ProgressReporter>,
}

impl ConcurrentCollector {
    /// Creates a collector; the window is `config.concurrency` clamped to
    /// 1..=32.
    pub fn new(source: Arc<dyn DiaryPageSource>, config: &CollectorConfig) -> Self {
        Self {
            source,
            config: config.clone(),
            progress: Arc::new(NoProgress),
        }
    }

    /// Opens a session and builds a collector over it.
    ///
    /// Check the range with [`check_range`](super::check_range) first so an
    /// oversized request never reaches the login.
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

    pub fn concurrency(&self) -> usize {
        self.config.effective_concurrency()
    }

    /// Collects every day of `range`.
    ///
    /// Fails without any request when the range exceeds the configured cap,
    /// and with [`RangeRejection::Throttled`] as soon as a connect timeout
    /// shows the service is limiting the burst. Any other failure stays with
    /// its day.
    pub async fn collect_concurrent(&self, range: DateRange) -> Result<CombinedDiaryTable, AppError> {
        super::check_range(&range, self.config.max_range_days)?;

        let total = range.len_days();
        let window = self.concurrency();
        log::info!("Collecting {} ({} days, {} at a time)", range, total, window);

        let fetched = self.fetch_all(range, window).await?;

        let mut combined = CombinedDiaryTable::new();
        for (date, result) in fetched {
            let day = match result {
                Ok(page) => process_page(&page),
                Err(source) => {
                    log::warn!("{}: {}", date, source);
                    DayResult::Failed(AppError::Fetch { date, source })
                }
            };
            combined.record(date, day);
        }

        log::info!("{}", combined.summary());
        Ok(combined)
    }

    async fn fetch_all(
        &self,
        range: DateRange,
        window: usize,
    ) -> Result<BTreeMap<NaiveDate, Result<RawPage, FetchError>>, AppError> {
        let total = range.len_days();
        let mut pending = stream::iter(range.days())
            .map(|date| {
                let source = Arc::clone(&self.source);
                async move { (date, source.fetch_page(date).await) }
            })
            .buffer_unordered(window);

        let mut fetched = BTreeMap::new();
        while let Some((date, result)) = pending.next().await {
            if let Err(e) = &result {
                if e.is_connect_timeout() {
                    log::warn!("{}: {}; abandoning the remaining fetches", date, e);
                    return Err(AppError::RangeTooLarge {
                        days: total,
                        reason: RangeRejection::Throttled { date },
                    });
                }
            }
            fetched.insert(date, result);
            self.progress.report(ProgressEvent {
                date,
                index: fetched.len(),
                total,
            });
        }
        Ok(fetched)
    }
}
