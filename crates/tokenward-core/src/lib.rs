//! tokenward-core - Core types and traits shared by the tokenward crates.
//!
//! Everything that crosses a crate boundary lives here: the opaque
//! [`AccessToken`], the user's [`Credentials`] and [`UserIdentity`], the
//! request and response shapes handed to a [`Transport`], the cancellation
//! pair and the unified [`Error`].

pub mod cancel;
pub mod credentials;
pub mod error;
pub mod identity;
pub mod request;
pub mod tokens;
pub mod traits;
pub mod types;

pub use cancel::{CancelHandle, CancelSignal};
pub use credentials::Credentials;
pub use error::Error;
pub use identity::UserIdentity;
pub use request::{ApiRequest, ApiResponse, Method};
pub use tokens::AccessToken;
pub use traits::Transport;
pub use types::ApiUrl;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
