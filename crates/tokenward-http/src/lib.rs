//! tokenward-http - HTTP transport for tokenward.
//!
//! [`HttpTransport`] implements [`Transport`](tokenward_core::Transport)
//! with reqwest. Cookies set by the backend, the refresh cookie among them,
//! live in its [`CookieJar`] and ride along on every request without the
//! session layer ever reading them.

mod cookies;
mod transport;

pub use cookies::CookieJar;
pub use transport::{HttpTransport, TransportConfig};
