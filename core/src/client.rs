//! HTTP client backed by a [`FakeTransport`].
//!
//! # Design
//! `FakeClient` does what a real client does before a request leaves the
//! process: resolve relative URIs against its base address and add default
//! headers. Then it hands the request to the transport. Everything after that
//! belongs to the responder.
//!
//! The whole surface returns `BoxError`. Responder failures come back as the
//! exact box the responder produced, and the client's own failures are
//! [`Error`] values boxed the same way, so callers downcast for either.

use bytes::Bytes;
use http::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use http::{Method, Uri};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::trace;
use url::Url;

use crate::config::ClientBuilder;
use crate::error::{BoxError, Error};
use crate::message::{body_str, Request, Response};
use crate::transport::FakeTransport;

/// Base address applied when none is configured.
pub const DEFAULT_BASE_ADDRESS: &str = "http://test/";

/// Client whose network layer is a [`FakeTransport`].
#[derive(Debug, Clone)]
pub struct FakeClient {
    transport: FakeTransport,
    base_address: Url,
    default_headers: HeaderMap,
}

impl FakeClient {
    pub fn builder(transport: FakeTransport) -> ClientBuilder {
        ClientBuilder::new(transport)
    }

    pub(crate) fn from_parts(
        transport: FakeTransport,
        base_address: Url,
        default_headers: HeaderMap,
    ) -> Self {
        Self {
            transport,
            base_address,
            default_headers,
        }
    }

    pub fn transport(&self) -> &FakeTransport {
        &self.transport
    }

    pub fn base_address(&self) -> &Url {
        &self.base_address
    }

    /// Replace the base address. On error the previous address is kept.
    pub fn set_base_address(&mut self, address: &str) -> Result<(), Error> {
        self.base_address = parse_base_address(address)?;
        Ok(())
    }

    pub fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    pub fn default_headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.default_headers
    }

    /// Send `request` with a fresh cancellation token.
    pub async fn send(&self, request: Request) -> Result<Response, BoxError> {
        self.send_with_cancel(request, CancellationToken::new()).await
    }

    /// Resolve the request URI, apply default headers and forward to the
    /// transport. The token is passed to the responder and also stored in the
    /// request extensions.
    pub async fn send_with_cancel(
        &self,
        mut request: Request,
        cancel: CancellationToken,
    ) -> Result<Response, BoxError> {
        let uri = self.resolve(request.uri())?;
        *request.uri_mut() = uri;

        for name in self.default_headers.keys() {
            if request.headers().contains_key(name) {
                continue;
            }
            for value in self.default_headers.get_all(name) {
                request.headers_mut().append(name.clone(), value.clone());
            }
        }

        request.extensions_mut().insert(cancel.clone());
        self.transport.send(request, cancel).await
    }

    /// Resolve `uri` against the base address. Absolute URIs pass through.
    pub fn resolve(&self, uri: &Uri) -> Result<Uri, Error> {
        if uri.scheme().is_some() {
            return Ok(uri.clone());
        }
        self.resolve_str(&uri.to_string())
    }

    /// Resolve a URI reference given as text, following RFC 3986.
    pub fn resolve_str(&self, reference: &str) -> Result<Uri, Error> {
        let resolved = self
            .base_address
            .join(reference)
            .map_err(|e| Error::InvalidRequestUri {
                uri: reference.to_string(),
                source: e.into(),
            })?;
        trace!(%reference, %resolved, "resolved request uri");
        resolved
            .as_str()
            .parse::<Uri>()
            .map_err(|e| Error::InvalidRequestUri {
                uri: reference.to_string(),
                source: e.into(),
            })
    }

    pub async fn get(&self, uri: &str) -> Result<Response, BoxError> {
        self.execute(Method::GET, uri, Bytes::new(), None).await
    }

    pub async fn delete(&self, uri: &str) -> Result<Response, BoxError> {
        self.execute(Method::DELETE, uri, Bytes::new(), None).await
    }

    pub async fn post(&self, uri: &str, body: impl Into<Bytes>) -> Result<Response, BoxError> {
        self.execute(Method::POST, uri, body.into(), None).await
    }

    pub async fn put(&self, uri: &str, body: impl Into<Bytes>) -> Result<Response, BoxError> {
        self.execute(Method::PUT, uri, body.into(), None).await
    }

    /// GET `uri` and return the body as text. Fails on a non-2xx status.
    pub async fn get_string(&self, uri: &str) -> Result<String, BoxError> {
        let response = self.get(uri).await?;
        check_status(&response)?;
        Ok(body_str(&response)?.to_string())
    }

    /// GET `uri` and deserialize the JSON body. Fails on a non-2xx status.
    pub async fn get_json<T: DeserializeOwned>(&self, uri: &str) -> Result<T, BoxError> {
        let response = self.get(uri).await?;
        check_status(&response)?;
        let value = serde_json::from_slice(response.body()).map_err(Error::from)?;
        Ok(value)
    }

    /// POST `value` serialized as JSON.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        uri: &str,
        value: &T,
    ) -> Result<Response, BoxError> {
        let body = serde_json::to_vec(value).map_err(Error::from)?;
        self.execute(Method::POST, uri, body.into(), Some("application/json"))
            .await
    }

    async fn execute(
        &self,
        method: Method,
        uri: &str,
        body: Bytes,
        content_type: Option<&'static str>,
    ) -> Result<Response, BoxError> {
        let mut request = Request::new(body);
        *request.method_mut() = method;
        *request.uri_mut() = self.resolve_str(uri)?;
        if let Some(content_type) = content_type {
            request
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        self.send(request).await
    }
}

pub(crate) fn parse_base_address(address: &str) -> Result<Url, Error> {
    Url::parse(address).map_err(|source| Error::InvalidBaseAddress {
        address: address.to_string(),
        source,
    })
}

/// Map a non-success status to `Error::HttpStatus`.
fn check_status(response: &Response) -> Result<(), Error> {
    if response.status().is_success() {
        return Ok(());
    }
    Err(Error::HttpStatus {
        status: response.status().as_u16(),
        body: String::from_utf8_lossy(response.body()).into_owned(),
    })
}
