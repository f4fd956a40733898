//! Client configuration.
//!
//! `ClientConfig` is plain data that can be deserialized from a JSON fixture.
//! `ClientBuilder` validates it and produces a [`FakeClient`]. Nothing is
//! parsed until `build`, so an invalid base address surfaces there and never
//! at send time.

use std::collections::BTreeMap;

use http::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;

use crate::client::{parse_base_address, FakeClient, DEFAULT_BASE_ADDRESS};
use crate::error::Error;
use crate::transport::FakeTransport;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Absolute URI relative requests resolve against. Defaults to
    /// `http://test/`.
    pub base_address: Option<String>,
    /// Headers added to every request that does not already set them.
    pub default_headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct ClientBuilder {
    transport: FakeTransport,
    config: ClientConfig,
}

impl ClientBuilder {
    pub fn new(transport: FakeTransport) -> Self {
        Self::from_config(transport, ClientConfig::default())
    }

    pub fn from_config(transport: FakeTransport, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    pub fn base_address(mut self, address: impl Into<String>) -> Self {
        self.config.base_address = Some(address.into());
        self
    }

    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(name.into(), value.into());
        self
    }

    pub fn build(self) -> Result<FakeClient, Error> {
        let address = self
            .config
            .base_address
            .as_deref()
            .unwrap_or(DEFAULT_BASE_ADDRESS);
        let base_address = parse_base_address(address)?;

        let mut headers = HeaderMap::new();
        for (name, value) in &self.config.default_headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::InvalidHeader(format!("{name}: {e}")))?;
            let header_value =
                HeaderValue::from_str(value).map_err(|e| Error::InvalidHeader(format!("{name}: {e}")))?;
            headers.insert(header_name, header_value);
        }

        Ok(FakeClient::from_parts(self.transport, base_address, headers))
    }
}
