// src/api/responses.rs
//! JSON bodies returned by the authentication endpoints.

use crate::constants::ERROR_BODY_PREVIEW_LENGTH;
use crate::error::AppError;
use serde::Deserialize;

/// `GET api/auth/csrf`
#[derive(Debug, Clone, Deserialize)]
pub struct CsrfResponse {
    #[serde(rename = "csrfToken")]
    pub csrf_token: String,
}

/// `GET api/auth/session`. Empty (`{}`) when nobody is signed in.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionResponse {
    #[serde(default)]
    pub user: Option<SessionUser>,
    #[serde(default)]
    pub expires: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionUser {
    #[serde(default)]
    pub name: Option<String>,
}

/// Parses the CSRF endpoint body.
pub fn parse_csrf_token(body: &str) -> Result<String, AppError> {
    let response: CsrfResponse =
        serde_json::from_str(body).map_err(|e| AppError::Authentication {
            reason: format!(
                "unexpected CSRF response ({}): {}",
                e,
                preview(body)
            ),
        })?;
    if response.csrf_token.trim().is_empty() {
        return Err(AppError::Authentication {
            reason: "empty CSRF token".to_string(),
        });
    }
    Ok(response.csrf_token)
}

/// Parses the session endpoint body; anything unreadable counts as no session.
pub fn parse_session(body: &str) -> SessionResponse {
    serde_json::from_str(body).unwrap_or_else(|e| {
        log::debug!("Unreadable session body ({}): {}", e, preview(body));
        SessionResponse::default()
    })
}

fn preview(body: &str) -> String {
    body.chars().take(ERROR_BODY_PREVIEW_LENGTH).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_the_csrf_token() {
        let token = parse_csrf_token(r#"{"csrfToken":"abc123"}"#).unwrap();
        assert_eq!(token, "abc123");
    }

    #[test]
    fn rejects_a_body_without_token() {
        assert!(matches!(
            parse_csrf_token("<html>maintenance</html>"),
            Err(AppError::Authentication { .. })
        ));
        assert!(matches!(
            parse_csrf_token(r#"{"csrfToken":""}"#),
            Err(AppError::Authentication { .. })
        ));
    }

    #[test]
    fn session_body_is_lenient() {
        let session = parse_session(r#"{"user":{"name":"jo"},"expires":"2030-01-01"}"#);
        assert_eq!(session.user.and_then(|u| u.name).as_deref(), Some("jo"));
        assert!(parse_session("{}").user.is_none());
        assert!(parse_session("not json").user.is_none());
    }
}
