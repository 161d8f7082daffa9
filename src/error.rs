// src/error.rs
//! Application error types with structured error handling.
//!
//! Error types form the vocabulary for failure modes in the system. Some end
//! a whole run (bad credentials, a range that is too large), others only
//! concern one day of the diary and are reported next to the days that
//! worked.

use chrono::NaiveDate;
use std::fmt;
use thiserror::Error;

/// Transport-level failure while retrieving one page.
///
/// Classified from the underlying reqwest error so collectors can decide
/// between retrying, recording the day as failed, or giving up on the run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The TCP/TLS connect phase timed out. Under concurrent load this is
    /// the service throttling us.
    #[error("connect timed out for {url}")]
    ConnectTimeout { url: String },

    #[error("request timed out for {url}")]
    Timeout { url: String },

    #[error("could not connect to {url}: {message}")]
    Connect { url: String, message: String },

    #[error("{url} answered with HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("transport failure for {url}: {message}")]
    Transport { url: String, message: String },
}

impl FetchError {
    /// Classifies a reqwest error raised while requesting `url`.
    pub fn from_reqwest(err: &reqwest::Error, url: &str) -> Self {
        let url = url.to_string();
        if err.is_connect() && err.is_timeout() {
            Self::ConnectTimeout { url }
        } else if err.is_timeout() {
            Self::Timeout { url }
        } else if err.is_connect() {
            Self::Connect {
                url,
                message: err.to_string(),
            }
        } else if let Some(status) = err.status() {
            Self::HttpStatus {
                url,
                status: status.as_u16(),
            }
        } else {
            Self::Transport {
                url,
                message: err.to_string(),
            }
        }
    }

    pub fn is_connect_timeout(&self) -> bool {
        matches!(self, Self::ConnectTimeout { .. })
    }

    /// Whether the same request is worth sending again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectTimeout { .. }
                | Self::Timeout { .. }
                | Self::Connect { .. }
                | Self::HttpStatus {
                    status: 408 | 429 | 500..=599,
                    ..
                }
        )
    }

    pub fn url(&self) -> &str {
        match self {
            Self::ConnectTimeout { url }
            | Self::Timeout { url }
            | Self::Connect { url, .. }
            | Self::HttpStatus { url, .. }
            | Self::Transport { url, .. } => url,
        }
    }
}

/// Why a run's date range was turned down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeRejection {
    /// More days than one run may request.
    ExceedsCap { max: usize },
    /// A concurrent fetch hit a connect timeout, which means the service is
    /// rate-limiting the burst.
    Throttled { date: NaiveDate },
}

impl fmt::Display for RangeRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExceedsCap { max } => write!(f, "at most {} days may be requested per run", max),
            Self::Throttled { date } => write!(
                f,
                "connect timeout while fetching {} (service is throttling)",
                date
            ),
        }
    }
}

/// Why a page had no diary table.
///
/// Not an error in itself: an absent diary is an expected per-day state
/// that callers must handle apart from real failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoDiaryReason {
    /// The page rendered but carried no table (empty or out-of-range day).
    NoTable,
    /// The owner keeps the diary private or password protected.
    Private,
}

impl fmt::Display for NoDiaryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTable => write!(f, "no diary table on the page"),
            Self::Private => write!(f, "diary is private"),
        }
    }
}

/// Returned by the table parser when the page holds no table.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("no diary found: {reason}")]
pub struct NoDiaryFound {
    pub reason: NoDiaryReason,
}

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {reason}")]
    Authentication { reason: String },

    #[error("Requested range of {days} days rejected: {reason}")]
    RangeTooLarge { days: usize, reason: RangeRejection },

    #[error("Fetching the diary for {date} failed: {source}")]
    Fetch {
        date: NaiveDate,
        #[source]
        source: FetchError,
    },

    #[error("No diary found for {date}: {reason}")]
    NoDiaryFound { date: NaiveDate, reason: NoDiaryReason },

    #[error("Malformed row {row}, column '{column}': {value:?} is not {expected}")]
    MalformedRow {
        row: usize,
        column: String,
        value: String,
        expected: &'static str,
    },

    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Network failure: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Filesystem IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Output delivery failed: {}", failures.join(", "))]
    DeliveryFailed { failures: Vec<String> },

    #[error("Internal error: {message}")]
    InternalError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error(transparent)]
    Validation(#[from] crate::types::ValidationError),
}

impl AppError {
    /// Whether the caller should retry the run with a narrower date range.
    pub fn should_narrow_range(&self) -> bool {
        matches!(self, Self::RangeTooLarge { .. })
    }
}

// Allow converting from anyhow::Error, preserving the message
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalError {
            message: err.to_string(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::MalformedResponse(err.to_string())
    }
}

/// Result type alias for convenience
pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_statuses() {
        let status = |status| FetchError::HttpStatus {
            url: "u".into(),
            status,
        };
        assert!(status(429).is_retryable());
        assert!(status(503).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(!FetchError::Transport {
            url: "u".into(),
            message: "m".into()
        }
        .is_retryable());
    }

    #[test]
    fn range_errors_ask_for_narrower_range() {
        let capped = AppError::RangeTooLarge {
            days: 400,
            reason: RangeRejection::ExceedsCap { max: 365 },
        };
        let throttled = AppError::RangeTooLarge {
            days: 30,
            reason: RangeRejection::Throttled {
                date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            },
        };
        assert!(capped.should_narrow_range());
        assert!(throttled.should_narrow_range());
        assert!(!AppError::Authentication {
            reason: "x".into()
        }
        .should_narrow_range());
        assert!(capped.to_string().contains("at most 365 days"));
    }

    #[test]
    fn malformed_row_message_names_the_cell() {
        let err = AppError::MalformedRow {
            row: 3,
            column: "carbs_g".into(),
            value: "abc".into(),
            expected: "numeric",
        };
        assert_eq!(
            err.to_string(),
            "Malformed row 3, column 'carbs_g': \"abc\" is not numeric"
        );
    }
}
