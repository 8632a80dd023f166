//! In-memory session state.

use std::sync::{Arc, PoisonError, RwLock};

use tokenward_core::{AccessToken, UserIdentity};

/// A snapshot of who is signed in and with which access token.
///
/// An access token never exists without an identity: the only way to get a
/// token in is [`SessionState::set`], which takes both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    identity: Option<UserIdentity>,
    access_token: Option<AccessToken>,
}

impl Session {
    pub fn identity(&self) -> Option<&UserIdentity> {
        self.identity.as_ref()
    }

    pub fn access_token(&self) -> Option<&AccessToken> {
        self.access_token.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }
}

/// The process-wide session, shared by every clone.
///
/// Lives in memory only. A fresh process always starts empty, which is what
/// the [`Bootstrapper`](crate::Bootstrapper) is for.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    inner: Arc<RwLock<Session>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current session.
    pub fn get(&self) -> Session {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, identity: UserIdentity, access_token: AccessToken) {
        let mut session = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        session.identity = Some(identity);
        session.access_token = Some(access_token);
    }

    pub fn clear(&self) {
        let mut session = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *session = Session::default();
    }

    pub fn access_token(&self) -> Option<AccessToken> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .access_token
            .clone()
    }

    pub fn identity(&self) -> Option<UserIdentity> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .identity
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_authenticated()
    }
}
