//! Error types for tokenward.
//!
//! Callers see one error type with a variant per failure class. An expired
//! access credential is not one of them: the request gateway resolves that
//! internally and only the outcome of the retried call comes back.

use std::fmt;
use thiserror::Error;

/// The unified error type for tokenward operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No response reached us (DNS, TLS, connection, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The refresh credential itself was rejected. The session is over and
    /// the user has to sign in again.
    #[error("session invalid, sign in again")]
    AuthDenied,

    /// Authorization was still refused after the one permitted retry, or
    /// the credential could not be renewed because of a transient failure.
    #[error("request rejected: {0}")]
    Rejected(ProtocolError),

    /// The login endpoint refused the username/password pair.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// A client-side failure the caller can act on (e.g. `409` username taken).
    #[error("validation failed: {0}")]
    Validation(ProtocolError),

    /// The backend failed (5xx).
    #[error("server failure: {0}")]
    Server(ProtocolError),

    /// The caller cancelled the request.
    #[error("request aborted")]
    Aborted,

    /// A successful response whose body could not be decoded.
    #[error("malformed response: {message}")]
    Malformed { message: String },

    /// Input validation errors (bad base URL and similar).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

impl Error {
    /// Classify a non-2xx response that is not a credential rejection.
    pub fn from_status(error: ProtocolError) -> Self {
        if error.is_server_error() {
            Error::Server(error)
        } else {
            Error::Validation(error)
        }
    }

    /// Returns true when the UI should drop the user back to sign-in.
    pub fn requires_sign_in(&self) -> bool {
        matches!(self, Error::AuthDenied)
    }

    /// Returns true for failures that must not be shown or logged as errors.
    pub fn is_silent(&self) -> bool {
        matches!(self, Error::Aborted)
    }

    /// Returns true for a `409 Conflict` (e.g. username already taken).
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Validation(e) if e.status == 409)
    }

    /// HTTP status behind this error, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Rejected(e) | Error::Validation(e) | Error::Server(e) => Some(e.status),
            _ => None,
        }
    }
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Request could not be built or the response could not be read.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// A non-2xx response from the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolError {
    /// HTTP status code.
    pub status: u16,
    /// Error message from the server, if the body carried one.
    pub message: Option<String>,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProtocolError {}

impl ProtocolError {
    /// Create a new protocol error.
    pub fn new(status: u16, message: Option<String>) -> Self {
        Self { status, message }
    }

    /// Check if this is a 5xx response.
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    /// Check if the status is one the backend uses for refused authorization.
    pub fn is_auth_error(&self) -> bool {
        self.status == 401 || self.status == 403
    }
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid backend URL.
    #[error("invalid API URL '{value}': {reason}")]
    ApiUrl { value: String, reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}
