// src/api/fetcher.rs
//! One diary page per request.

use super::client::extract_response_text;
use super::session::Session;
use super::DiaryPageSource;
use crate::constants::DIARY_PATH;
use crate::error::FetchError;
use crate::types::Username;
use chrono::NaiveDate;
use std::fmt;
use url::Url;

/// Whose diary is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiaryTarget {
    /// The signed-in user's own diary.
    Own,
    User(Username),
}

impl fmt::Display for DiaryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Own => write!(f, "own diary"),
            Self::User(user) => write!(f, "diary of {}", user),
        }
    }
}

/// HTML of one diary day.
#[derive(Debug, Clone)]
pub struct RawPage {
    pub date: NaiveDate,
    pub html: String,
    /// Final URL after redirects.
    pub url: String,
}

/// Diary URL for `target` on `date` below the service root `base`.
pub fn diary_url(base: &Url, target: &DiaryTarget, date: NaiveDate) -> Result<Url, url::ParseError> {
    let path = match target {
        DiaryTarget::Own => DIARY_PATH.to_string(),
        DiaryTarget::User(user) => format!("{}/{}", DIARY_PATH, user.as_str()),
    };
    let mut url = base.join(&path)?;
    url.query_pairs_mut()
        .append_pair("date", &date.format("%Y-%m-%d").to_string());
    Ok(url)
}

/// Fetches diary pages through a [`Session`]. Single GET, no retries.
#[derive(Debug, Clone)]
pub struct DiaryPageFetcher {
    session: Session,
    target: DiaryTarget,
}

impl DiaryPageFetcher {
    pub fn new(session: Session, target: DiaryTarget) -> Self {
        Self { session, target }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn target(&self) -> &DiaryTarget {
        &self.target
    }

    pub async fn fetch(&self, date: NaiveDate) -> Result<RawPage, FetchError> {
        let base = self.session.http().base_url();
        let url = diary_url(base, &self.target, date).map_err(|e| FetchError::Transport {
            url: base.to_string(),
            message: e.to_string(),
        })?;
        let requested = url.to_string();

        let response = self
            .session
            .http()
            .get(url)
            .await
            .map_err(|e| FetchError::from_reqwest(&e, &requested))?;
        let page = extract_response_text(response)
            .await
            .map_err(|e| FetchError::from_reqwest(&e, &requested))?;

        log::debug!(
            "Fetched {} ({} bytes, HTTP {})",
            date,
            page.data.len(),
            page.status
        );
        Ok(RawPage {
            date,
            html: page.data,
            url: page.url,
        })
    }
}

#[async_trait::async_trait]
impl DiaryPageSource for DiaryPageFetcher {
    async fn fetch_page(&self, date: NaiveDate) -> Result<RawPage, FetchError> {
        self.fetch(date).await
    }
}
