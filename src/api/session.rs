// src/api/session.rs
//! Session acquisition: the signed-in login flow or an anonymous client for
//! public diaries.

use super::client::{extract_response_text, MfpHttpClient};
use super::responses::{parse_csrf_token, parse_session};
use crate::config::CollectorConfig;
use crate::constants::{
    CSRF_PATH, LOGGED_IN_MARKER, LOGIN_CALLBACK_PATH, LOGIN_PATH, SESSION_PATH,
};
use crate::error::AppError;
use crate::types::{Credentials, Username};
use std::fmt;

/// Who a session acts as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionIdentity {
    Authenticated { username: Username },
    /// No login; only public diaries are readable.
    Anonymous,
}

impl fmt::Display for SessionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authenticated { username } => write!(f, "signed in as {}", username),
            Self::Anonymous => write!(f, "anonymous"),
        }
    }
}

/// Transport state for one collection run.
///
/// Read-only once created. Clones share the cookie jar, so every fetch of a
/// run sees the same login.
#[derive(Debug, Clone)]
pub struct Session {
    http: MfpHttpClient,
    identity: SessionIdentity,
}

impl Session {
    pub fn http(&self) -> &MfpHttpClient {
        &self.http
    }

    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.identity, SessionIdentity::Authenticated { .. })
    }
}

/// Creates sessions against one service root.
#[derive(Debug, Clone)]
pub struct SessionAuthenticator {
    config: CollectorConfig,
}

impl SessionAuthenticator {
    pub fn new(config: &CollectorConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// A cookie-enabled session with no identity.
    pub fn anonymous(&self) -> Result<Session, AppError> {
        Ok(Session {
            http: MfpHttpClient::new(&self.config)?,
            identity: SessionIdentity::Anonymous,
        })
    }

    /// Runs the CSRF / credentials / session / home-page login flow.
    ///
    /// Fails with [`AppError::Authentication`] when the home page does not
    /// show the signed-in user. Never retried.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<Session, AppError> {
        let http = MfpHttpClient::new(&self.config)?;
        log::info!("Signing in to {} as {}", http.base_url(), credentials.username);

        let response = http
            .get(http.endpoint(CSRF_PATH)?)
            .await
            .map_err(|e| login_step_failed("CSRF request", e))?;
        let body = extract_response_text(response).await?;
        let csrf_token = parse_csrf_token(&body.data)?;

        let callback_url = http.endpoint(LOGIN_CALLBACK_PATH)?;
        let form = [
            ("username", credentials.username.as_str()),
            ("password", credentials.password.expose()),
            ("csrfToken", csrf_token.as_str()),
            ("callbackUrl", callback_url.as_str()),
            ("redirect", "false"),
            ("json", "true"),
        ];
        http.post_form(http.endpoint(LOGIN_PATH)?, &form)
            .await
            .map_err(|e| login_step_failed("credential submission", e))?;

        let response = http
            .get(http.endpoint(SESSION_PATH)?)
            .await
            .map_err(|e| login_step_failed("session request", e))?;
        let session = parse_session(&extract_response_text(response).await?.data);
        log::debug!("Session expires: {:?}", session.expires);

        let response = http
            .get(http.endpoint("")?)
            .await
            .map_err(|e| login_step_failed("home page", e))?;
        let home = extract_response_text(response).await?;
        if !is_logged_in(&home.data) {
            return Err(AppError::Authentication {
                reason: format!(
                    "{} is not signed in after login (check MFP_USER / MFP_PASS)",
                    credentials.username
                ),
            });
        }

        log::info!("Signed in as {}", credentials.username);
        Ok(Session {
            http,
            identity: SessionIdentity::Authenticated {
                username: credentials.username.clone(),
            },
        })
    }
}

/// Whether a page was rendered for a signed-in user.
pub fn is_logged_in(html: &str) -> bool {
    html.find(LOGGED_IN_MARKER).is_some_and(|position| position > 0)
}

fn login_step_failed(step: &str, err: reqwest::Error) -> AppError {
    match err.status() {
        Some(status) => AppError::Authentication {
            reason: format!("{} rejected with HTTP {}", step, status),
        },
        None => AppError::NetworkFailure(err),
    }
}
