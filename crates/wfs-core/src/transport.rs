//! Blocking HTTP plumbing behind spec fetches and operation calls.

use std::fmt;
use std::io::Write;
use std::time::Duration;

use indexmap::IndexMap;
use log::debug;
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};

use crate::config::ClientConfig;
use crate::error::TransportError;

/// A GET request: the only kind a WFS3 client issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: IndexMap<String, String>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: IndexMap::new(),
        }
    }

    pub fn method(&self) -> &'static str {
        "GET"
    }

    /// Set a header, replacing any previous value.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Executes requests. Anything but a 200 response is an error.
pub trait Transport: fmt::Debug + Send + Sync {
    /// Read the whole response body.
    fn fetch(&self, request: &HttpRequest) -> Result<Vec<u8>, TransportError>;

    /// Copy the response body into `sink`, returning the number of bytes.
    fn stream_to(&self, request: &HttpRequest, sink: &mut dyn Write)
    -> Result<u64, TransportError>;
}

/// [`Transport`] over a `reqwest` blocking client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    cache_max_age: Option<u64>,
}

impl HttpTransport {
    pub fn new() -> Result<Self, TransportError> {
        Self::from_config(&ClientConfig::default())
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(TransportError::Build)?;
        Ok(Self {
            client,
            cache_max_age: config.cache_max_age,
        })
    }

    fn send(&self, request: &HttpRequest, cacheable: bool) -> Result<Response, TransportError> {
        debug!("{} {}", request.method(), request.url);
        let mut builder = self.client.get(&request.url);
        if let Some(max_age) = self.cache_max_age.filter(|_| cacheable) {
            builder = builder.header("Cache-Control", format!("max-age={max_age}"));
        }
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        let response = builder.send().map_err(|source| TransportError::Request {
            url: request.url.clone(),
            source,
        })?;
        check_status(request, response.status())?;
        Ok(response)
    }
}

impl Transport for HttpTransport {
    fn fetch(&self, request: &HttpRequest) -> Result<Vec<u8>, TransportError> {
        let response = self.send(request, true)?;
        let bytes = response.bytes().map_err(|source| TransportError::Body {
            url: request.url.clone(),
            source,
        })?;
        Ok(bytes.to_vec())
    }

    fn stream_to(
        &self,
        request: &HttpRequest,
        sink: &mut dyn Write,
    ) -> Result<u64, TransportError> {
        let mut response = self.send(request, false)?;
        Ok(std::io::copy(&mut response, sink)?)
    }
}

fn check_status(request: &HttpRequest, status: StatusCode) -> Result<(), TransportError> {
    if status == StatusCode::OK {
        return Ok(());
    }
    Err(TransportError::Status {
        method: request.method().to_string(),
        url: request.url.clone(),
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or_default().to_string(),
    })
}
