//! Unauthenticated calls that open and close a session.

use tracing::{debug, info, instrument, warn};

use tokenward_core::{
    AccessToken, ApiRequest, ApiResponse, CancelSignal, Credentials, Error, Result, Transport,
    UserIdentity,
};

use crate::endpoints::TokenResponse;
use crate::gateway::Gateway;

/// Registration, login and logout against the backend.
///
/// Shares the gateway's transport, so the refresh cookie set by login is
/// the one later renewals carry, and its session, so a login is visible to
/// every protected call.
pub struct AuthClient<T> {
    gateway: Gateway<T>,
}

impl<T> Clone for AuthClient<T> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
        }
    }
}

impl<T: Transport> AuthClient<T> {
    pub fn new(gateway: &Gateway<T>) -> Self {
        Self {
            gateway: gateway.clone(),
        }
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// A taken username comes back as [`Error::Validation`] with
    /// [`Error::is_conflict`] set.
    #[instrument(skip(self, credentials, cancel), fields(username = credentials.username()))]
    pub async fn register(&self, credentials: &Credentials, cancel: &CancelSignal) -> Result<()> {
        let path = self.gateway.config().register_path.as_str();
        let request = ApiRequest::post(path).json(credentials)?;
        let response = self.send(&request, cancel).await?;

        if response.is_success() {
            info!("Account registered");
            Ok(())
        } else {
            let error = Error::from_status(response.protocol_error());
            if error.is_conflict() {
                debug!("Username taken");
            }
            Err(error)
        }
    }

    /// Sign in and store the issued identity and access token.
    ///
    /// The backend also sets the refresh cookie; it stays in the transport.
    #[instrument(skip(self, credentials, cancel), fields(username = credentials.username()))]
    pub async fn login(
        &self,
        credentials: &Credentials,
        cancel: &CancelSignal,
    ) -> Result<UserIdentity> {
        let path = self.gateway.config().auth_path.as_str();
        let request = ApiRequest::post(path).json(credentials)?;
        let response = self.send(&request, cancel).await?;

        if response.status() == 401 {
            return Err(Error::InvalidCredentials);
        }
        if !response.is_success() {
            return Err(Error::from_status(response.protocol_error()));
        }

        let body: TokenResponse = response.json()?;
        let identity = body.user.ok_or_else(|| Error::Malformed {
            message: "login response carried no user".to_string(),
        })?;

        self.gateway
            .session()
            .set(identity.clone(), AccessToken::new(body.access_token));
        info!(user = %identity, "Signed in");
        Ok(identity)
    }

    /// End the session on the backend and forget it locally.
    ///
    /// The local session is cleared even if the backend call fails.
    #[instrument(skip(self, cancel))]
    pub async fn logout(&self, cancel: &CancelSignal) -> Result<()> {
        self.gateway.session().clear();

        let path = self.gateway.config().logout_path.as_str();
        let response = self.send(&ApiRequest::get(path), cancel).await?;
        if response.is_success() {
            info!("Signed out");
            Ok(())
        } else {
            warn!(status = response.status(), "Logout endpoint failed");
            Err(Error::from_status(response.protocol_error()))
        }
    }

    async fn send(&self, request: &ApiRequest, cancel: &CancelSignal) -> Result<ApiResponse> {
        cancel
            .guard(self.gateway.transport().send(request, cancel))
            .await?
    }
}

impl<T> std::fmt::Debug for AuthClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthClient")
            .field("gateway", &self.gateway)
            .finish()
    }
}
