//! The protected users listing.

use serde::{Deserialize, Serialize};

use tokenward_core::{CancelSignal, Result, Transport};

use crate::gateway::Gateway;

/// Path of the users listing.
pub const USERS_PATH: &str = "/users";

/// One entry of the users listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub username: String,
}

/// Fetch every user through the gateway.
pub async fn list_users<T: Transport>(
    gateway: &Gateway<T>,
    cancel: &CancelSignal,
) -> Result<Vec<UserSummary>> {
    gateway.get_json(USERS_PATH, cancel).await
}
