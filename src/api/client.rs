// src/api/client.rs
//! Thin HTTP wrapper around reqwest for the MyFitnessPal web service.
//!
//! Owns the cookie jar that carries the login between requests. No parsing
//! and no retry logic lives here.

use crate::config::CollectorConfig;
use crate::error::AppError;
use reqwest::{header, Client, Response};
use url::Url;

/// Cookie-carrying client bound to one service root.
///
/// Cloning is cheap and every clone shares the same cookie jar and
/// connection pool.
#[derive(Clone, Debug)]
pub struct MfpHttpClient {
    client: Client,
    base_url: Url,
}

impl MfpHttpClient {
    pub fn new(config: &CollectorConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .cookie_store(true)
            .user_agent(config.user_agent.as_str())
            .default_headers(Self::create_headers())
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    fn create_headers() -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("text/html,application/json;q=0.9,*/*;q=0.8"),
        );
        headers
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves a path relative to the service root.
    pub fn endpoint(&self, path: &str) -> Result<Url, AppError> {
        self.base_url.join(path).map_err(|e| AppError::InternalError {
            message: format!("cannot build URL for '{}'", path),
            source: Some(Box::new(e)),
        })
    }

    /// Sends a GET and fails on a non-success status.
    pub async fn get(&self, url: Url) -> Result<Response, reqwest::Error> {
        log::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        log::debug!("GET {} -> {}", response.url(), response.status());
        response.error_for_status()
    }

    /// Sends a form-encoded POST and fails on a non-success status.
    pub async fn post_form(
        &self,
        url: Url,
        form: &[(&str, &str)],
    ) -> Result<Response, reqwest::Error> {
        log::debug!("POST {}", url);
        let response = self.client.post(url).form(form).send().await?;
        log::debug!("POST {} -> {}", response.url(), response.status());
        response.error_for_status()
    }
}

/// Result of an HTTP operation with response metadata.
#[derive(Debug)]
pub struct ApiResponse<T> {
    pub data: T,
    pub status: reqwest::StatusCode,
    pub url: String,
}

/// Extracts the response body as text with metadata.
pub async fn extract_response_text(
    response: Response,
) -> Result<ApiResponse<String>, reqwest::Error> {
    let status = response.status();
    let url = response.url().to_string();
    let text = response.text().await?;

    Ok(ApiResponse {
        data: text,
        status,
        url,
    })
}
