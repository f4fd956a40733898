//! The fake transport: a `tower::Service` that hands every request to a
//! caller-supplied responder instead of the network.
//!
//! # Design
//! `FakeTransport` holds a single responder behind an `Arc`, so every clone
//! routes to the same function for its whole lifetime. `send` returns the
//! responder's future as-is: no buffering, no timeout, no retry, and errors
//! come back exactly as the responder produced them.
//!
//! Cancellation is pass-through. The transport hands the token to the
//! responder and never looks at it again.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio_util::sync::CancellationToken;
use tower::Service;
use tracing::{debug, warn};

use crate::error::{BoxError, Error};
use crate::message::{Request, Response};

/// Future returned by a responder.
pub type ResponseFuture = Pin<Box<dyn Future<Output = Result<Response, BoxError>> + Send>>;

/// Simulates a server for requests sent through a [`FakeTransport`].
///
/// Implemented for any `Fn(Request, CancellationToken) -> Future` whose
/// output is `Result<Response, E>` with `E: Into<BoxError>`, so plain async
/// closures work:
///
/// ```
/// use fake_http::{message, FakeTransport};
/// use http::StatusCode;
///
/// let transport = FakeTransport::new(|_req, _cancel| async {
///     Ok::<_, fake_http::BoxError>(message::response(StatusCode::OK, None, "OK"))
/// });
/// # let _ = transport;
/// ```
pub trait Responder: Send + Sync + 'static {
    fn respond(&self, request: Request, cancel: CancellationToken) -> ResponseFuture;
}

impl<F, Fut, E> Responder for F
where
    F: Fn(Request, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, E>> + Send + 'static,
    E: Into<BoxError>,
{
    fn respond(&self, request: Request, cancel: CancellationToken) -> ResponseFuture {
        let fut = self(request, cancel);
        Box::pin(async move { fut.await.map_err(Into::<BoxError>::into) })
    }
}

/// Transport handler that routes requests to a responder.
#[derive(Clone, Default)]
pub struct FakeTransport {
    responder: Option<Arc<dyn Responder>>,
}

impl FakeTransport {
    /// Build a transport around a responder closure.
    pub fn new<F, Fut, E>(responder: F) -> Self
    where
        F: Fn(Request, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        Self::from_responder(responder)
    }

    /// Build a transport around any [`Responder`] implementation.
    pub fn from_responder(responder: impl Responder) -> Self {
        Self {
            responder: Some(Arc::new(responder)),
        }
    }

    /// A transport with no responder. Construction succeeds; every send
    /// fails with [`Error::MissingResponder`].
    pub fn without_responder() -> Self {
        Self::default()
    }

    pub fn has_responder(&self) -> bool {
        self.responder.is_some()
    }

    /// Forward `request` and `cancel` to the responder and return its result
    /// unchanged.
    pub fn send(&self, request: Request, cancel: CancellationToken) -> ResponseFuture {
        debug!(method = %request.method(), uri = %request.uri(), "dispatching request to responder");
        match &self.responder {
            Some(responder) => responder.respond(request, cancel),
            None => {
                warn!(uri = %request.uri(), "fake transport has no responder");
                Box::pin(async { Err(Error::MissingResponder.into()) })
            }
        }
    }
}

impl fmt::Debug for FakeTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeTransport")
            .field("has_responder", &self.has_responder())
            .finish()
    }
}

/// Reads the cancellation token from the request extensions, falling back to
/// one that is never cancelled.
impl Service<Request> for FakeTransport {
    type Response = Response;
    type Error = BoxError;
    type Future = ResponseFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let cancel = request
            .extensions()
            .get::<CancellationToken>()
            .cloned()
            .unwrap_or_default();
        self.send(request, cancel)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use bytes::Bytes;
    use http::{Method, StatusCode};
    use tower::ServiceExt;
    use tracing_test::traced_test;

    use super::*;
    use crate::message::response;

    #[derive(Debug, PartialEq)]
    struct Boom(u32);

    impl fmt::Display for Boom {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "boom {}", self.0)
        }
    }

    impl std::error::Error for Boom {}

    fn get(uri: &str) -> Request {
        http::Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Bytes::new())
            .unwrap()
    }

    #[tokio::test]
    async fn send_returns_responder_result() {
        let transport = FakeTransport::new(|req: Request, _cancel| async move {
            Ok::<_, BoxError>(response(StatusCode::OK, None, req.uri().path().to_string()))
        });
        let resp = transport
            .send(get("http://test/echo"), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.body(), "/echo");
    }

    #[tokio::test]
    async fn responder_error_is_not_wrapped() {
        let transport = FakeTransport::new(|_req, _cancel| async { Err::<Response, _>(Boom(7)) });
        let err = transport
            .send(get("http://test/"), CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.downcast_ref::<Boom>(), Some(&Boom(7)));
    }

    #[tokio::test]
    async fn missing_responder_fails_only_on_send() {
        let transport = FakeTransport::without_responder();
        assert!(!transport.has_responder());
        let err = transport
            .send(get("http://test/"), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::MissingResponder)
        ));
    }

    #[tokio::test]
    async fn cancellation_is_ignored_unless_responder_checks() {
        let transport = FakeTransport::new(|_req, _cancel| async {
            Ok::<_, BoxError>(response(StatusCode::OK, None, "done"))
        });
        let cancel = CancellationToken::new();
        cancel.cancel();
        let resp = transport.send(get("http://test/"), cancel).await.unwrap();
        assert_eq!(resp.body(), "done");
    }

    #[tokio::test]
    async fn clones_share_one_responder() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let transport = FakeTransport::new(move |_req, _cancel| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, BoxError>(response(StatusCode::OK, None, Bytes::new())) }
        });
        let other = transport.clone();
        transport.send(get("http://test/a"), CancellationToken::new()).await.unwrap();
        other.send(get("http://test/b"), CancellationToken::new()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn service_call_passes_token_from_extensions() {
        let transport = FakeTransport::new(|_req, cancel: CancellationToken| async move {
            let status = if cancel.is_cancelled() {
                StatusCode::REQUEST_TIMEOUT
            } else {
                StatusCode::OK
            };
            Ok::<_, BoxError>(response(status, None, Bytes::new()))
        });

        let resp = transport.clone().oneshot(get("http://test/")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut req = get("http://test/");
        req.extensions_mut().insert(cancel);
        let resp = transport.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::REQUEST_TIMEOUT);
    }

    #[tokio::test]
    #[traced_test]
    async fn send_logs_dispatch() {
        let transport = FakeTransport::without_responder();
        let _ = transport
            .send(get("http://test/logged"), CancellationToken::new())
            .await;
        assert!(logs_contain("dispatching request to responder"));
        assert!(logs_contain("fake transport has no responder"));
    }

    struct Teapot;

    impl Responder for Teapot {
        fn respond(&self, _request: Request, _cancel: CancellationToken) -> ResponseFuture {
            Box::pin(async { Ok(response(StatusCode::IM_A_TEAPOT, None, Bytes::new())) })
        }
    }

    #[tokio::test]
    async fn from_responder_accepts_trait_impls() {
        let transport = FakeTransport::from_responder(Teapot);
        let resp = transport
            .send(get("http://test/brew"), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::IM_A_TEAPOT);
    }

    #[test]
    fn debug_reports_responder_presence() {
        let transport = FakeTransport::without_responder();
        assert_eq!(format!("{transport:?}"), "FakeTransport { has_responder: false }");
    }
}
