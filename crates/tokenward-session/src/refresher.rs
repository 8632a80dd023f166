//! Single-flight access token renewal.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tracing::{debug, info, instrument, warn};

use tokenward_core::{AccessToken, ApiRequest, CancelSignal, Transport};

use crate::endpoints::TokenResponse;
use crate::state::SessionState;

/// Result of one renewal exchange, shared by every caller that waited on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new access token was issued and is now in the session.
    Renewed(AccessToken),
    /// The refresh credential was rejected. The session has been cleared.
    Denied,
    /// The exchange could not complete. The session is untouched.
    TransientFailure,
}

type SharedOutcome = Shared<BoxFuture<'static, RefreshOutcome>>;

struct PendingRefresh {
    id: u64,
    outcome: SharedOutcome,
}

/// The most recent finished exchange.
#[derive(Default)]
struct Settled {
    generation: u64,
    outcome: Option<RefreshOutcome>,
}

/// Trades the ambient refresh credential for a new access token.
///
/// At most one exchange is in flight across all clones. A call made while
/// one is pending joins it and receives the same [`RefreshOutcome`]. The
/// exchange runs on its own task, so a caller that gives up waiting does
/// not cancel it for the others.
///
/// Every finished exchange bumps a generation and is remembered, so a
/// caller whose rejection arrives after the exchange already settled can
/// reuse that outcome instead of starting another one (see
/// [`generation`](Self::generation) and [`settled_since`](Self::settled_since)).
///
/// Must be used from within a Tokio runtime.
pub struct Refresher<T> {
    inner: Arc<RefresherInner<T>>,
}

struct RefresherInner<T> {
    transport: T,
    state: SessionState,
    refresh_path: String,
    pending: Mutex<Option<PendingRefresh>>,
    settled: Mutex<Settled>,
    next_id: AtomicU64,
    exchanges: AtomicU64,
}

impl<T> Clone for Refresher<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> Refresher<T> {
    pub fn new(transport: T, state: SessionState, refresh_path: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RefresherInner {
                transport,
                state,
                refresh_path: refresh_path.into(),
                pending: Mutex::new(None),
                settled: Mutex::new(Settled::default()),
                next_id: AtomicU64::new(0),
                exchanges: AtomicU64::new(0),
            }),
        }
    }

    /// Renew the access token, joining an exchange already in flight.
    pub async fn refresh(&self) -> RefreshOutcome {
        let outcome = {
            let mut pending = self
                .inner
                .pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner);

            match pending.as_ref() {
                Some(existing) => {
                    debug!(id = existing.id, "Joining pending refresh");
                    existing.outcome.clone()
                }
                None => {
                    let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
                    let outcome = self.start(id);
                    *pending = Some(PendingRefresh {
                        id,
                        outcome: outcome.clone(),
                    });
                    outcome
                }
            }
        };

        outcome.await
    }

    fn start(&self, id: u64) -> SharedOutcome {
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let outcome = inner.exchange(id).await;
            // Settle before freeing the slot so no caller sees neither.
            inner.settle(outcome.clone());
            inner.finish(id);
            outcome
        });

        let inner = Arc::clone(&self.inner);
        async move {
            let outcome = task.await.unwrap_or_else(|e| {
                warn!(error = %e, "Refresh task did not complete");
                RefreshOutcome::TransientFailure
            });
            inner.finish(id);
            outcome
        }
        .boxed()
        .shared()
    }

    /// The session this refresher writes renewed tokens into.
    pub fn state(&self) -> &SessionState {
        &self.inner.state
    }

    pub(crate) fn transport(&self) -> &T {
        &self.inner.transport
    }

    /// Number of exchanges that have finished so far.
    pub fn generation(&self) -> u64 {
        self.inner.lock_settled().generation
    }

    /// The outcome of the latest exchange, if one finished after `generation`.
    pub fn settled_since(&self, generation: u64) -> Option<RefreshOutcome> {
        let settled = self.inner.lock_settled();
        if settled.generation > generation {
            settled.outcome.clone()
        } else {
            None
        }
    }

    /// Number of renewal exchanges actually sent to the backend.
    pub fn exchange_count(&self) -> u64 {
        self.inner.exchanges.load(Ordering::SeqCst)
    }

    /// Returns true while an exchange is in flight.
    pub fn is_pending(&self) -> bool {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl<T: Transport> RefresherInner<T> {
    #[instrument(skip(self), fields(path = %self.refresh_path))]
    async fn exchange(&self, id: u64) -> RefreshOutcome {
        self.exchanges.fetch_add(1, Ordering::SeqCst);
        info!("Renewing access token");

        let request = ApiRequest::get(self.refresh_path.as_str());
        let response = match self.transport.send(&request, &CancelSignal::never()).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Renewal exchange failed");
                return RefreshOutcome::TransientFailure;
            }
        };

        let status = response.status();
        if response.is_success() {
            let body: TokenResponse = match response.json() {
                Ok(body) => body,
                Err(e) => {
                    warn!(error = %e, "Renewal response could not be decoded");
                    return RefreshOutcome::TransientFailure;
                }
            };

            let Some(identity) = body.user.or_else(|| self.state.identity()) else {
                warn!("Renewal response carried no identity and none is known");
                return RefreshOutcome::TransientFailure;
            };

            let token = AccessToken::new(body.access_token);
            debug!(user = %identity, "Access token renewed");
            self.state.set(identity, token.clone());
            RefreshOutcome::Renewed(token)
        } else if response.protocol_error().is_auth_error() {
            info!(status, "Refresh credential rejected, clearing session");
            self.state.clear();
            RefreshOutcome::Denied
        } else {
            warn!(status, "Renewal endpoint failed");
            RefreshOutcome::TransientFailure
        }
    }

    fn settle(&self, outcome: RefreshOutcome) {
        let mut settled = self.lock_settled();
        settled.generation += 1;
        settled.outcome = Some(outcome);
    }

    fn lock_settled(&self) -> std::sync::MutexGuard<'_, Settled> {
        self.settled.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn finish(&self, id: u64) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if pending.as_ref().is_some_and(|p| p.id == id) {
            *pending = None;
        }
    }
}

impl<T> std::fmt::Debug for Refresher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Refresher")
            .field("refresh_path", &self.inner.refresh_path)
            .field("exchanges", &self.inner.exchanges.load(Ordering::SeqCst))
            .finish()
    }
}
