//! Wiring of transport, gateway and stored state for one invocation.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use tokenward_core::ApiUrl;
use tokenward_http::{CookieJar, HttpTransport, TransportConfig};
use tokenward_session::{
    AuthClient, Bootstrapper, Gateway, Persistence, SessionConfig, SessionState,
};

use crate::storage;

/// Everything a command needs, built once per process.
pub struct App {
    pub gateway: Gateway<HttpTransport>,
    pub auth: AuthClient<HttpTransport>,
    persistence: Persistence,
    jar: Arc<CookieJar>,
}

impl App {
    /// Build the app for `api`, loading the saved cookie jar only if the
    /// user asked to be remembered.
    pub fn open(api: &str) -> Result<Self> {
        let api = ApiUrl::new(api).context("Invalid API URL")?;
        let persistence = storage::load_preference()?;

        let jar = if persistence.is_on() {
            let path = storage::jar_path()?;
            CookieJar::load(&path).context("Failed to load cookie jar")?
        } else {
            CookieJar::new()
        };
        let jar = Arc::new(jar);

        let transport = HttpTransport::with_jar(api, &TransportConfig::default(), Arc::clone(&jar))
            .context("Failed to build HTTP client")?;
        let gateway = Gateway::new(transport, SessionState::new(), SessionConfig::default());
        let auth = AuthClient::new(&gateway);

        debug!(%persistence, "App opened");
        Ok(Self {
            gateway,
            auth,
            persistence,
            jar,
        })
    }

    pub fn persistence(&self) -> Persistence {
        self.persistence
    }

    /// Use a preference chosen during this invocation (e.g. at login).
    pub fn set_persistence(&mut self, persistence: Persistence) -> Result<()> {
        storage::save_preference(persistence)?;
        self.persistence = persistence;
        Ok(())
    }

    /// A bootstrapper reading the preference as it stands now.
    pub fn bootstrapper(&self) -> Bootstrapper<HttpTransport> {
        Bootstrapper::new(self.gateway.refresher().clone(), self.persistence)
    }

    /// Save the jar if remembered, otherwise make sure nothing is left on disk.
    pub fn store_cookies(&self) -> Result<()> {
        if self.persistence.is_on() {
            let path = storage::jar_path()?;
            self.jar.save(&path).context("Failed to save cookie jar")
        } else {
            storage::clear_jar()
        }
    }
}
