//! Session layer configuration.

use serde::{Deserialize, Serialize};

/// Endpoint paths and the statuses that mean "access credential rejected".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Login endpoint (`POST`, `{user, pwd}`).
    pub auth_path: String,
    /// Renewal endpoint (`GET`, ambient refresh cookie).
    pub refresh_path: String,
    /// Logout endpoint (`GET`).
    pub logout_path: String,
    /// Registration endpoint (`POST`, `{user, pwd}`).
    pub register_path: String,
    /// Statuses from a protected endpoint that trigger renew-and-retry.
    pub rejection_statuses: Vec<u16>,
}

impl SessionConfig {
    pub fn is_rejection(&self, status: u16) -> bool {
        self.rejection_statuses.contains(&status)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            auth_path: "/auth".to_string(),
            refresh_path: "/refresh".to_string(),
            logout_path: "/logout".to_string(),
            register_path: "/register".to_string(),
            rejection_statuses: vec![401],
        }
    }
}
