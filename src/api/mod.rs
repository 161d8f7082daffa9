// src/api/mod.rs
//! MyFitnessPal interaction: sessions and diary page retrieval.
//!
//! Collectors depend on [`DiaryPageSource`], never on HTTP details.

pub mod client;
mod fetcher;
mod responses;
mod session;

use crate::error::FetchError;
use chrono::NaiveDate;
use std::sync::Arc;

/// The ability to retrieve the diary page of one day.
#[async_trait::async_trait]
pub trait DiaryPageSource: Send + Sync {
    async fn fetch_page(&self, date: NaiveDate) -> Result<RawPage, FetchError>;
}

#[async_trait::async_trait]
impl<S: DiaryPageSource + ?Sized> DiaryPageSource for Arc<S> {
    async fn fetch_page(&self, date: NaiveDate) -> Result<RawPage, FetchError> {
        (**self).fetch_page(date).await
    }
}

pub use client::MfpHttpClient;
pub use fetcher::{diary_url, DiaryPageFetcher, DiaryTarget, RawPage};
pub use responses::{CsrfResponse, SessionResponse};
pub use session::{is_logged_in, Session, SessionAuthenticator, SessionIdentity};
