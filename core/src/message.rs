//! HTTP message types flowing through the fake transport.
//!
//! # Design
//! Bodies are fully buffered `Bytes`. A fake never streams, and owned buffers
//! let responders inspect, clone and record requests without touching body
//! trait machinery.

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;

pub type Request = http::Request<Bytes>;
pub type Response = http::Response<Bytes>;

/// Build a response with the given status, content type and body.
pub fn response(
    status: StatusCode,
    content_type: Option<&'static str>,
    body: impl Into<Bytes>,
) -> Response {
    let mut response = Response::new(body.into());
    *response.status_mut() = status;
    if let Some(content_type) = content_type {
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    }
    response
}

/// Decode a response body as UTF-8.
pub fn body_str(response: &Response) -> Result<&str, crate::Error> {
    Ok(std::str::from_utf8(response.body())?)
}
