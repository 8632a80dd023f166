//! Login credentials type.

use serde::Serialize;
use std::fmt;

/// A username/password pair for login and registration.
///
/// Serializes to the backend's `{user, pwd}` body.
///
/// # Security
///
/// The password is never exposed in Debug output to prevent accidental logging.
///
/// # Example
///
/// ```
/// use tokenward_core::Credentials;
///
/// let creds = Credentials::new("ana", "Secret#123");
/// assert_eq!(creds.username(), "ana");
/// ```
#[derive(Clone, Serialize)]
pub struct Credentials {
    #[serde(rename = "user")]
    username: String,
    #[serde(rename = "pwd")]
    password: String,
}

impl Credentials {
    /// Create new credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Returns the username.
    pub fn username(&self) -> &str {
        &self.username
    }
}

// Intentionally hide password in Debug output
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
