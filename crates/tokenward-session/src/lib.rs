//! tokenward-session - Session lifecycle over any [`Transport`].
//!
//! Protected calls go through a [`Gateway`], which attaches the current
//! access token and, when the backend rejects it, renews it through the
//! shared [`Refresher`] and retries once. A [`Bootstrapper`] resumes a
//! previous session at startup when the user asked to be remembered.
//!
//! # Example
//!
//! ```no_run
//! use tokenward_core::{CancelHandle, Transport};
//! use tokenward_session::{Bootstrapper, Gateway, Persistence, SessionConfig, SessionState};
//!
//! # async fn example<T: Transport>(transport: T) -> tokenward_core::Result<()> {
//! let state = SessionState::new();
//! let gateway = Gateway::new(transport, state.clone(), SessionConfig::default());
//!
//! let bootstrapper = Bootstrapper::new(gateway.refresher().clone(), Persistence::On);
//! bootstrapper.run().await;
//!
//! let screen = CancelHandle::new();
//! let users = tokenward_session::users::list_users(&gateway, &screen.signal()).await?;
//! for user in users {
//!     println!("{}", user.username);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! [`Transport`]: tokenward_core::Transport

pub mod auth;
pub mod bootstrap;
pub mod config;
mod endpoints;
pub mod gateway;
pub mod preference;
pub mod refresher;
pub mod state;
pub mod users;

pub use auth::AuthClient;
pub use bootstrap::{BootstrapOutcome, BootstrapPhase, Bootstrapper};
pub use config::SessionConfig;
pub use gateway::Gateway;
pub use preference::Persistence;
pub use refresher::{RefreshOutcome, Refresher};
pub use state::{Session, SessionState};
