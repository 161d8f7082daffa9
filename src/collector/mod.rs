// src/collector/mod.rs
//! Date-range collection: one fetch, parse and clean per day.
//!
//! [`SerialCollector`] walks the range lazily and yields each day as it
//! completes. [`ConcurrentCollector`] fans the fetches out through a bounded
//! window and reduces the results in date order.

mod concurrent;
mod serial;

pub use concurrent::ConcurrentCollector;
pub use serial::SerialCollector;

use crate::api::{DiaryPageFetcher, DiaryPageSource, DiaryTarget, SessionAuthenticator};
use crate::config::CollectorConfig;
use crate::error::{AppError, RangeRejection};
use crate::types::{Credentials, DateRange};
use std::sync::Arc;

/// Rejects a range longer than `max_days` before any network call.
pub fn check_range(range: &DateRange, max_days: usize) -> Result<(), AppError> {
    let days = range.len_days();
    if days > max_days {
        return Err(AppError::RangeTooLarge {
            days,
            reason: RangeRejection::ExceedsCap { max: max_days },
        });
    }
    Ok(())
}

/// Opens a session (signed in when `credentials` are given) and wraps it in
/// an HTTP page source for `target`.
pub async fn open_page_source(
    config: &CollectorConfig,
    credentials: Option<&Credentials>,
    target: DiaryTarget,
) -> Result<Arc<dyn DiaryPageSource>, AppError> {
    let authenticator = SessionAuthenticator::new(config);
    let session = match credentials {
        Some(credentials) => authenticator.authenticate(credentials).await?,
        None => authenticator.anonymous()?,
    };
    log::info!("Reading {} ({})", target, session.identity());
    Ok(Arc::new(DiaryPageFetcher::new(session, target)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn range_guard_counts_both_ends() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let year = DateRange::new(start, NaiveDate::from_ymd_opt(2024, 12, 30).unwrap()).unwrap();
        assert_eq!(year.len_days(), 365);
        assert!(check_range(&year, 365).is_ok());

        let leap_year =
            DateRange::new(start, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()).unwrap();
        let err = check_range(&leap_year, 365).unwrap_err();
        assert!(err.should_narrow_range());
        assert!(matches!(
            err,
            AppError::RangeTooLarge {
                days: 366,
                reason: RangeRejection::ExceedsCap { max: 365 }
            }
        ));
    }
}
