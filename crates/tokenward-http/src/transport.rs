//! reqwest-backed transport.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tracing::{debug, instrument, trace};

use tokenward_core::error::TransportError;
use tokenward_core::{ApiRequest, ApiResponse, ApiUrl, CancelSignal, Error, Method, Result, Transport};

use crate::cookies::CookieJar;

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Client-side settings for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            user_agent: concat!("tokenward/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Sends [`ApiRequest`]s to one backend over HTTP.
///
/// Clone is cheap: reqwest's client and the cookie jar are shared.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    api: ApiUrl,
    jar: Arc<CookieJar>,
}

impl HttpTransport {
    /// Create a transport with an empty cookie jar.
    pub fn new(api: ApiUrl, config: &TransportConfig) -> Result<Self> {
        Self::with_jar(api, config, Arc::new(CookieJar::new()))
    }

    /// Create a transport around an existing (e.g. loaded) cookie jar.
    pub fn with_jar(api: ApiUrl, config: &TransportConfig, jar: Arc<CookieJar>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .cookie_provider(Arc::clone(&jar))
            .build()
            .map_err(transport_error)?;

        Ok(Self { client, api, jar })
    }

    pub fn api(&self) -> &ApiUrl {
        &self.api
    }

    /// The jar holding the backend's cookies.
    pub fn jar(&self) -> &Arc<CookieJar> {
        &self.jar
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, request, cancel), fields(method = %request.method(), path = request.path()))]
    async fn send(&self, request: &ApiRequest, cancel: &CancelSignal) -> Result<ApiResponse> {
        let url = self.api.endpoint_url(request.path());
        debug!(%url, authed = request.bearer().is_some(), "HTTP request");

        let mut builder = self
            .client
            .request(reqwest_method(request.method()), &url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json");

        if let Some(token) = request.bearer() {
            builder = builder.bearer_auth(token.as_str());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let exchange = async {
            let response = builder.send().await?;
            let status = response.status().as_u16();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>(ApiResponse::new(status, body.to_vec()))
        };

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Request cancelled");
                return Err(Error::Aborted);
            }
            result = exchange => result.map_err(transport_error)?,
        };

        trace!(status = response.status(), "HTTP response");
        Ok(response)
    }
}

fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn transport_error(err: reqwest::Error) -> Error {
    let err = if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connection {
            message: err.to_string(),
        }
    } else {
        TransportError::Http {
            message: err.to_string(),
        }
    };
    Error::Transport(err)
}
