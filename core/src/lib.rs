//! In-process fake HTTP transport for tests.
//!
//! # Overview
//! Replaces the network layer of an HTTP client with a caller-supplied
//! responder function. Tests get a client that resolves URIs and applies
//! headers like a real one, while every request is answered in memory.
//!
//! # Design
//! - `FakeTransport` is a `tower::Service` that forwards each request and its
//!   cancellation token to one responder and returns the result untouched.
//! - `FakeClient` owns a transport plus a base address; `get_client` is the
//!   one-call factory.
//! - Responder errors are never wrapped. Downcast the returned `BoxError` to
//!   recover exactly what the responder produced.
//! - No sockets, no retries, no timeouts. Cancellation is honored only by
//!   responders that check the token.
//!
//! ```
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! use fake_http::{get_client, responders, DEFAULT_BASE_ADDRESS};
//! use http::StatusCode;
//!
//! let client = get_client(responders::text(StatusCode::OK, "OK"), DEFAULT_BASE_ADDRESS).unwrap();
//! let body = client.get_string("anything").await.unwrap();
//! assert_eq!(body, "OK");
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod message;
pub mod responders;
pub mod transport;

use std::future::Future;

use tokio_util::sync::CancellationToken;

pub use client::{FakeClient, DEFAULT_BASE_ADDRESS};
pub use config::{ClientBuilder, ClientConfig};
pub use error::{BoxError, Error};
pub use message::{Request, Response};
pub use transport::{FakeTransport, Responder, ResponseFuture};

/// Build a [`FakeClient`] whose transport routes every request to
/// `responder`.
///
/// Fails with [`Error::InvalidBaseAddress`] if `base_address` is not an
/// absolute URI; the responder is never invoked in that case.
pub fn get_client<F, Fut, E>(responder: F, base_address: &str) -> Result<FakeClient, Error>
where
    F: Fn(Request, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, E>> + Send + 'static,
    E: Into<BoxError>,
{
    ClientBuilder::new(FakeTransport::new(responder))
        .base_address(base_address)
        .build()
}
