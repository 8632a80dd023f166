//! Resuming a previous session at startup.

use tokio::sync::{OnceCell, watch};
use tracing::{debug, info, instrument};

use tokenward_core::{Error, Transport, UserIdentity};

use crate::preference::Persistence;
use crate::refresher::{RefreshOutcome, Refresher};

/// Where the bootstrapper is in its one-shot lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapPhase {
    Idle,
    /// A renewal is in flight; protected content must not render yet.
    Resuming,
    Resolved,
}

/// How startup resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// No resumption attempted: persistence is off or a session already exists.
    Skipped,
    /// The previous session was resumed.
    Resumed(UserIdentity),
    /// The refresh credential was rejected; the user is signed out.
    Denied,
    /// Resumption could not complete; the user is treated as signed out.
    Unavailable,
}

impl BootstrapOutcome {
    /// The error a caller should surface, if any.
    pub fn error(&self) -> Option<Error> {
        match self {
            BootstrapOutcome::Denied => Some(Error::AuthDenied),
            _ => None,
        }
    }
}

/// Decides once per process whether a prior session can be resumed.
///
/// With [`Persistence::On`] and no access token in memory, `run` performs a
/// single renewal before anything protected is shown. It never retries: a
/// denied or failed resumption simply leaves the user signed out.
pub struct Bootstrapper<T> {
    refresher: Refresher<T>,
    persistence: Persistence,
    phase: watch::Sender<BootstrapPhase>,
    outcome: OnceCell<BootstrapOutcome>,
}

impl<T: Transport> Bootstrapper<T> {
    pub fn new(refresher: Refresher<T>, persistence: Persistence) -> Self {
        let (phase, _rx) = watch::channel(BootstrapPhase::Idle);
        Self {
            refresher,
            persistence,
            phase,
            outcome: OnceCell::new(),
        }
    }

    /// Run the bootstrap, or wait for and return the result of the run
    /// already under way.
    ///
    /// Dropping this future while resuming still moves the phase to
    /// `Resolved`; the renewal itself keeps running and updates the session.
    /// A later call starts over.
    pub async fn run(&self) -> BootstrapOutcome {
        self.outcome.get_or_init(|| self.resolve()).await.clone()
    }

    #[instrument(skip(self), fields(persistence = %self.persistence))]
    async fn resolve(&self) -> BootstrapOutcome {
        if !self.persistence.is_on() {
            debug!("Persistence off, not resuming");
            self.phase.send_replace(BootstrapPhase::Resolved);
            return BootstrapOutcome::Skipped;
        }

        if self.refresher.state().is_authenticated() {
            debug!("Session already present, not resuming");
            self.phase.send_replace(BootstrapPhase::Resolved);
            return BootstrapOutcome::Skipped;
        }

        self.phase.send_replace(BootstrapPhase::Resuming);
        let _resolved = ResolveOnDrop(&self.phase);
        info!("Resuming previous session");

        let outcome = match self.refresher.refresh().await {
            RefreshOutcome::Renewed(_) => match self.refresher.state().identity() {
                Some(identity) => BootstrapOutcome::Resumed(identity),
                None => BootstrapOutcome::Unavailable,
            },
            RefreshOutcome::Denied => BootstrapOutcome::Denied,
            RefreshOutcome::TransientFailure => BootstrapOutcome::Unavailable,
        };

        info!(?outcome, "Bootstrap resolved");
        outcome
    }

    pub fn phase(&self) -> BootstrapPhase {
        *self.phase.borrow()
    }

    /// Watch phase transitions.
    pub fn subscribe(&self) -> watch::Receiver<BootstrapPhase> {
        self.phase.subscribe()
    }

    /// Wait until the bootstrap has resolved. Does not start it.
    pub async fn wait_resolved(&self) {
        let mut rx = self.phase.subscribe();
        // The sender lives in self, so the channel cannot close here.
        let _ = rx.wait_for(|phase| *phase == BootstrapPhase::Resolved).await;
    }

    /// Whether protected content may render now.
    pub fn may_render(&self) -> bool {
        !self.persistence.is_on() || self.phase() == BootstrapPhase::Resolved
    }

    pub fn persistence(&self) -> Persistence {
        self.persistence
    }
}

/// Publishes `Resolved` when the resume finishes or is abandoned.
struct ResolveOnDrop<'a>(&'a watch::Sender<BootstrapPhase>);

impl Drop for ResolveOnDrop<'_> {
    fn drop(&mut self) {
        self.0.send_replace(BootstrapPhase::Resolved);
    }
}

impl<T> std::fmt::Debug for Bootstrapper<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bootstrapper")
            .field("persistence", &self.persistence)
            .field("phase", &*self.phase.borrow())
            .finish()
    }
}
