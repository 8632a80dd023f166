//! Explicit request cancellation.
//!
//! A [`CancelHandle`] belongs to whatever started a batch of requests (a
//! screen, a command); each request gets a [`CancelSignal`] from it. When the
//! owner goes away it calls [`CancelHandle::cancel`] and every request still
//! holding a signal resolves to [`Error::Aborted`].

use std::future::Future;

use tokio::sync::watch;

use crate::error::Error;

/// Owner side of a cancellation pair.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

/// Observer side of a cancellation pair. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// A signal tied to this handle.
    pub fn signal(&self) -> CancelSignal {
        CancelSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Cancel every request holding a signal from this handle.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelSignal {
    /// A signal that is never cancelled.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the owning handle cancels; pends forever otherwise.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            // Handle dropped without cancelling.
            std::future::pending::<()>().await;
        }
    }

    /// Drive `fut` unless cancellation comes first.
    ///
    /// Cancellation wins ties, so a result that arrives together with the
    /// cancel is discarded rather than treated as authoritative.
    pub async fn guard<F: Future>(&self, fut: F) -> Result<F::Output, Error> {
        if self.is_cancelled() {
            return Err(Error::Aborted);
        }
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(Error::Aborted),
            output = fut => {
                if self.is_cancelled() {
                    Err(Error::Aborted)
                } else {
                    Ok(output)
                }
            }
        }
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::never()
    }
}
