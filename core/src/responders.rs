//! Ready-made responders for common test setups.
//!
//! Each function returns a closure suitable for [`FakeTransport::new`] or
//! [`get_client`](crate::get_client). Responders that need to share state
//! with the test (see [`Recorder`]) keep it behind an `Arc` and lock it only
//! for the duration of a push or a snapshot.
//!
//! [`FakeTransport::new`]: crate::FakeTransport::new

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::body::Body;
use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode, Uri};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tower::{Service, ServiceExt};

use crate::error::{BoxError, Error};
use crate::message::{response, Request, Response};
use crate::transport::{Responder, ResponseFuture};

/// Empty body with the given status.
pub fn status(
    code: StatusCode,
) -> impl Fn(Request, CancellationToken) -> ResponseFuture + Send + Sync + 'static {
    move |_request: Request, _cancel: CancellationToken| -> ResponseFuture {
        Box::pin(async move { Ok(response(code, None, Bytes::new())) })
    }
}

/// Plain-text body with the given status.
pub fn text(
    code: StatusCode,
    body: impl Into<Bytes>,
) -> impl Fn(Request, CancellationToken) -> ResponseFuture + Send + Sync + 'static {
    let body = body.into();
    move |_request: Request, _cancel: CancellationToken| -> ResponseFuture {
        let body = body.clone();
        Box::pin(async move { Ok(response(code, Some("text/plain; charset=utf-8"), body)) })
    }
}

/// JSON body with the given status. `value` is serialized on every call; a
/// serialization failure is returned as [`Error::Json`].
pub fn json<T>(
    code: StatusCode,
    value: T,
) -> impl Fn(Request, CancellationToken) -> ResponseFuture + Send + Sync + 'static
where
    T: Serialize + Send + Sync + 'static,
{
    move |_request: Request, _cancel: CancellationToken| -> ResponseFuture {
        let result = serde_json::to_vec(&value)
            .map(|body| response(code, Some("application/json"), body))
            .map_err(|e| BoxError::from(Error::Json(e)));
        Box::pin(async move { result })
    }
}

/// Fail every request with the error built by `make_error`.
pub fn fail<M, E>(
    make_error: M,
) -> impl Fn(Request, CancellationToken) -> ResponseFuture + Send + Sync + 'static
where
    M: Fn() -> E + Send + Sync + 'static,
    E: Into<BoxError>,
{
    move |_request: Request, _cancel: CancellationToken| -> ResponseFuture {
        let err: BoxError = make_error().into();
        Box::pin(async move { Err(err) })
    }
}

/// Respond after `delay`, unless the cancellation signal fires first, in
/// which case the request fails with [`Error::Cancelled`].
pub fn delayed(
    delay: Duration,
    code: StatusCode,
    body: impl Into<Bytes>,
) -> impl Fn(Request, CancellationToken) -> ResponseFuture + Send + Sync + 'static {
    let body = body.into();
    move |_request: Request, cancel: CancellationToken| -> ResponseFuture {
        let body = body.clone();
        Box::pin(async move {
            let result: Result<Response, BoxError> = tokio::select! {
                _ = cancel.cancelled() => Err(Error::Cancelled.into()),
                _ = tokio::time::sleep(delay) => Ok(response(code, None, body)),
            };
            result
        })
    }
}

/// Dispatch to an in-process `tower::Service` over axum bodies, such as an
/// `axum::Router`. Request extensions, including the cancellation token the
/// client stores there, are passed through to the service.
pub fn from_service<S>(
    service: S,
) -> impl Fn(Request, CancellationToken) -> ResponseFuture + Send + Sync + 'static
where
    S: Service<http::Request<Body>, Response = http::Response<Body>> + Clone + Send + Sync + 'static,
    S::Future: Send + 'static,
    S::Error: Into<BoxError>,
{
    move |request: Request, _cancel: CancellationToken| -> ResponseFuture {
        let service = service.clone();
        Box::pin(async move {
            let response = service
                .oneshot(request.map(Body::from))
                .await
                .map_err(Into::<BoxError>::into)?;
            let (parts, body) = response.into_parts();
            let body = axum::body::to_bytes(body, usize::MAX).await?;
            Ok::<_, BoxError>(Response::from_parts(parts, body))
        })
    }
}

/// A request as seen by a [`Recorder`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Records every request passing through the responders it wraps. Clones
/// share one log.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap `inner` so each request is recorded before `inner` sees it.
    pub fn wrap<F, Fut, E>(
        &self,
        inner: F,
    ) -> impl Fn(Request, CancellationToken) -> ResponseFuture + Send + Sync + 'static
    where
        F: Fn(Request, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        let recorder = self.clone();
        let inner: Arc<dyn Responder> = Arc::new(inner);
        move |request: Request, cancel: CancellationToken| -> ResponseFuture {
            recorder.lock().push(RecordedRequest {
                method: request.method().clone(),
                uri: request.uri().clone(),
                headers: request.headers().clone(),
                body: request.body().clone(),
            });
            inner.respond(request, cancel)
        }
    }

    /// Snapshot of the requests recorded so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RecordedRequest>> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
