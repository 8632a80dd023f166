//! The request gateway: every protected call goes through here.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use tokenward_core::{
    AccessToken, ApiRequest, ApiResponse, CancelSignal, Error, Result, Transport,
};

use crate::config::SessionConfig;
use crate::refresher::{RefreshOutcome, Refresher};
use crate::state::SessionState;

/// Wraps a [`Transport`] with bearer attachment and renew-and-retry.
///
/// For each call the gateway attaches the current access token and sends
/// the request. When the backend answers with a rejection status (see
/// [`SessionConfig::rejection_statuses`]) the token is renewed through the
/// shared [`Refresher`] and the original request is sent exactly once more.
/// Whatever that retry yields is final.
///
/// Cheap to clone; clones share the refresher and therefore its
/// single-flight guarantee.
pub struct Gateway<T> {
    refresher: Refresher<T>,
    config: Arc<SessionConfig>,
}

impl<T> Clone for Gateway<T> {
    fn clone(&self) -> Self {
        Self {
            refresher: self.refresher.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<T: Transport> Gateway<T> {
    pub fn new(transport: T, state: SessionState, config: SessionConfig) -> Self {
        let refresher = Refresher::new(transport, state, config.refresh_path.clone());
        Self::with_refresher(refresher, config)
    }

    /// Build a gateway around an existing refresher.
    pub fn with_refresher(refresher: Refresher<T>, config: SessionConfig) -> Self {
        Self {
            refresher,
            config: Arc::new(config),
        }
    }

    pub fn session(&self) -> &SessionState {
        self.refresher.state()
    }

    pub fn refresher(&self) -> &Refresher<T> {
        &self.refresher
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub(crate) fn transport(&self) -> &T {
        self.refresher.transport()
    }

    /// Send a protected request.
    ///
    /// Returns the response for a 2xx status. Otherwise:
    ///
    /// - [`Error::Rejected`] if authorization was refused again after renewal,
    ///   or renewal failed transiently
    /// - [`Error::AuthDenied`] if the refresh credential was rejected
    /// - [`Error::Validation`] / [`Error::Server`] for other statuses,
    ///   without any renewal
    /// - [`Error::Aborted`] if `cancel` fired; no renewal or retry follows
    #[instrument(skip(self, request, cancel), fields(method = %request.method(), path = request.path()))]
    pub async fn call(&self, request: &ApiRequest, cancel: &CancelSignal) -> Result<ApiResponse> {
        let attached = self.session().access_token();
        let generation = self.refresher.generation();
        let response = self.send(request, attached.as_ref(), cancel).await?;

        if !self.config.is_rejection(response.status()) {
            return finish(response);
        }

        debug!(status = response.status(), "Access token rejected");

        // Someone else may have renewed while this request was in flight.
        let current = self.session().access_token();
        if current.is_some() && current != attached {
            debug!("Token changed since the request was sent, retrying without renewal");
            let retry = self.send(request, current.as_ref(), cancel).await?;
            return self.finish_retry(retry);
        }

        // A renewal that settled after this request went out already answers
        // for its stale token, whatever the outcome was.
        let outcome = match self.refresher.settled_since(generation) {
            Some(outcome) => {
                debug!(?outcome, "Renewal settled while the request was in flight");
                outcome
            }
            None => cancel.guard(self.refresher.refresh()).await?,
        };

        match outcome {
            RefreshOutcome::Renewed(token) => {
                let retry = self.send(request, Some(&token), cancel).await?;
                self.finish_retry(retry)
            }
            RefreshOutcome::Denied => {
                info!("Session denied during renewal");
                Err(Error::AuthDenied)
            }
            RefreshOutcome::TransientFailure => {
                warn!("Renewal failed transiently, returning the original failure");
                Err(Error::Rejected(response.protocol_error()))
            }
        }
    }

    /// `GET` a protected path and decode the JSON body.
    pub async fn get_json<R: DeserializeOwned>(
        &self,
        path: &str,
        cancel: &CancelSignal,
    ) -> Result<R> {
        self.call(&ApiRequest::get(path), cancel).await?.json()
    }

    /// `POST` a JSON body to a protected path and decode the JSON response.
    pub async fn post_json<B, R>(&self, path: &str, body: &B, cancel: &CancelSignal) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = ApiRequest::post(path).json(body)?;
        self.call(&request, cancel).await?.json()
    }

    async fn send(
        &self,
        request: &ApiRequest,
        token: Option<&AccessToken>,
        cancel: &CancelSignal,
    ) -> Result<ApiResponse> {
        let request = request.with_bearer(token);
        // guard() discards a response that arrives alongside the cancel.
        cancel.guard(self.transport().send(&request, cancel)).await?
    }

    fn finish_retry(&self, response: ApiResponse) -> Result<ApiResponse> {
        if self.config.is_rejection(response.status()) {
            warn!(
                status = response.status(),
                "Still rejected after renewal, not retrying again"
            );
            return Err(Error::Rejected(response.protocol_error()));
        }
        finish(response)
    }
}

fn finish(response: ApiResponse) -> Result<ApiResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(Error::from_status(response.protocol_error()))
    }
}

impl<T> std::fmt::Debug for Gateway<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("refresher", &self.refresher)
            .field("config", &self.config)
            .finish()
    }
}
