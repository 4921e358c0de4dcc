//! Login check run before any roster command.

use crate::config::AuthConfig;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,
}

/// The accepted login pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.username.clone(), config.password.clone())
    }
}

// Keep the password out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Check a login attempt. The username is trimmed, the password is not.
pub fn authenticate(expected: &Credentials, username: &str, password: &str) -> Result<(), AuthError> {
    let username = username.trim();
    if username == expected.username && password == expected.password {
        info!(user = %username, "Login accepted");
        Ok(())
    } else {
        warn!(user = %username, "Login rejected");
        Err(AuthError::InvalidCredentials)
    }
}
