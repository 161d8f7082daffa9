use super::ValidationError;
use std::fmt;

/// A MyFitnessPal account name, usable as a diary path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyField("username"));
        }
        if let Some(bad) = trimmed
            .chars()
            .find(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#' | '&'))
        {
            return Err(ValidationError::InvalidUsername {
                name: trimmed.to_string(),
                reason: format!("contains '{}'", bad),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Account password. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ValidationError::EmptyField("password"));
        }
        Ok(Self(value))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Login credentials handed to the session authenticator.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: Username,
    pub password: Password,
}

impl Credentials {
    pub fn new(username: Username, password: Password) -> Self {
        Self { username, password }
    }
}
