//! Error types for failures raised by the fake transport and client.
//!
//! # Design
//! Responder failures never pass through this type. They travel as the
//! responder's own boxed error so tests can downcast to exactly what they
//! returned. `Error` only covers what the crate itself can get wrong: a bad
//! base address, a request URI that cannot be resolved, a missing responder,
//! and body decoding on the convenience helpers.

use thiserror::Error;

/// Boxed error carried through the transport, matching tower's convention.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
    /// The configured base address is not an absolute URI.
    #[error("invalid base address {address:?}: {source}")]
    InvalidBaseAddress {
        address: String,
        #[source]
        source: url::ParseError,
    },

    /// A request URI could not be resolved against the base address.
    #[error("invalid request uri {uri:?}: {source}")]
    InvalidRequestUri {
        uri: String,
        #[source]
        source: BoxError,
    },

    /// A default header name or value was rejected.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// The responder answered with a non-2xx status where success was
    /// required.
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// A request reached a transport built without a responder.
    #[error("no responder configured for fake transport")]
    MissingResponder,

    /// A responder observed its cancellation signal and gave up.
    #[error("request cancelled")]
    Cancelled,

    #[error("response body is not valid UTF-8: {0}")]
    NonUtf8Body(#[from] std::str::Utf8Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}
