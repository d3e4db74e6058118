use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImportError>;

/// Reasons an endpoint import is aborted.
///
/// None of these are fatal: the endpoint simply stays unimported and the
/// registry table is left untouched.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Missing endpoint property: {0}")]
    MissingProperty(String),

    #[error("No interface found in: {requested:?}")]
    ResolutionFailure { requested: Vec<String> },

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Publication error: {0}")]
    Publication(#[from] PublishError),
}

/// Failures raised by a transport session.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("Invalid access URL: {0}")]
    InvalidUrl(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Remote error {code}: {message}")]
    Remote { code: i64, message: String },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Session closed")]
    Closed,
}

/// The single error kind surfaced to proxy callers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvocationError {
    #[error("Can't find a method called {method} with {arg_count} arguments")]
    MethodNotFound { method: String, arg_count: usize },

    #[error("Error calling remote method: {message}")]
    Remote { message: String },

    #[error("Proxy {0} is closed")]
    Closed(String),
}

impl From<TransportError> for InvocationError {
    fn from(err: TransportError) -> Self {
        let message = match err {
            TransportError::Remote { message, .. } => message,
            other => other.to_string(),
        };
        InvocationError::Remote { message }
    }
}

/// Failures reported by the local publication environment.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PublishError {
    #[error("Service rejected: {0}")]
    Rejected(String),

    #[error("Unknown registration: {0}")]
    UnknownRegistration(u64),
}
