use std::sync::Arc;

use reqwest::StatusCode;

/// Represents a result type for operations in this crate.
///
/// This `Result` type is a standard Rust `Result` type where the error variant is defined by the
/// crate-specific [`Error`] enum.
pub type Result<T> = std::result::Result<T, Error>;

/// Enum representing possible errors that can occur while fetching, persisting, or scheduling
/// feature toggles.
///
/// Note that evaluation never fails: unknown toggles and strategies resolve to "disabled" instead
/// of producing an error.
#[derive(thiserror::Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// Invalid base URL configuration.
    #[error("invalid base_url configuration")]
    InvalidBaseUrl(#[source] url::ParseError),

    /// A custom header name or value cannot be sent over HTTP.
    #[error("invalid custom header: {0}")]
    InvalidHeader(String),

    /// The request was unauthorized, possibly due to an invalid API token.
    #[error("unauthorized, api token is likely invalid")]
    Unauthorized,

    /// The server replied with a status we don't know how to handle.
    #[error("unexpected response status: {0}")]
    UnexpectedStatus(StatusCode),

    /// The operation was cancelled through its cancellation token.
    #[error("operation cancelled")]
    Cancelled,

    /// Indicates that the scheduler thread panicked. This should normally never happen.
    #[error("scheduler thread panicked")]
    SchedulerThreadPanicked,

    /// An I/O error.
    #[error(transparent)]
    // std::io::Error is not clonable, so we're wrapping it in an Arc.
    Io(Arc<std::io::Error>),

    /// Network error.
    #[error(transparent)]
    Network(Arc<reqwest::Error>),

    /// Toggle set could not be encoded or decoded.
    #[error(transparent)]
    Serialization(Arc<serde_json::Error>),
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(Arc::new(value))
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Error::Network(Arc::new(value.without_url()))
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::Serialization(Arc::new(value))
    }
}
