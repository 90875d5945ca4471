//! Error types for the rest call layer.
//!
//! # Design
//! HTTP-level failures never show up here: they are delivered as failure
//! events once the dispatcher finishes. `ApiError` only covers what can go
//! wrong synchronously inside `Controller::submit`, plus configuration and
//! history export. Transport and connectivity errors are separate types
//! because they cross the two trait seams.

use thiserror::Error;

/// Errors returned synchronously by the controller and configuration.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A JSON call was submitted without a request body.
    #[error("JSON call to `{method}` submitted without a request body")]
    MissingJsonBody { method: String },

    /// Client configuration is missing or invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The dispatch thread could not be started.
    #[error("failed to spawn dispatcher: {0}")]
    Spawn(String),

    /// The call history could not be serialized.
    #[error("serialization failed: {0}")]
    SerializationError(String),
}

/// Errors raised by a `Transport` before any HTTP response was received.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The socket timeout elapsed.
    #[error("request timed out")]
    Timeout,

    /// Connection, TLS or protocol failure.
    #[error("transport failure: {0}")]
    Io(String),
}

impl From<ureq::Error> for TransportError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Timeout(_) => TransportError::Timeout,
            other => TransportError::Io(other.to_string()),
        }
    }
}

/// Errors raised by a `ConnectivityOracle`. The controller treats any of
/// these as "offline".
#[derive(Debug, Error)]
pub enum ConnectivityError {
    /// The probe target could not be resolved to a socket address.
    #[error("cannot resolve probe target `{0}`")]
    Unresolvable(String),

    /// The platform query itself failed.
    #[error("connectivity query failed: {0}")]
    Query(String),
}
