//! Wire types of the backend's session endpoints.

use serde::Deserialize;

use tokenward_core::UserIdentity;

/// Body returned by `/auth` and `/refresh`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub user: Option<UserIdentity>,
}
