use thiserror::Error;

use crate::parse::parameter::ParameterLocation;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported OpenAPI version: {0}")]
    UnsupportedVersion(String),
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid reference format: {0}")]
    InvalidRefFormat(String),

    #[error("reference target not found: {0}")]
    RefTargetNotFound(String),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to build HTTP client")]
    Build(#[source] reqwest::Error),

    #[error("error calling {url}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("http error calling {method} {url} : {status} - {reason}")]
    Status {
        method: String,
        url: String,
        status: u16,
        reason: String,
    },

    #[error("failed to read response body from {url}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to stream response body")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("invalid service url {url}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to fetch spec: {0}")]
    Fetch(#[from] TransportError),

    #[error("failed to decode spec: {0}")]
    Decode(#[from] ParseError),

    #[error("failed to resolve spec references: {0}")]
    Resolve(#[from] ResolveError),
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("no operation {0:?}")]
    NoOperation(String),

    #[error("no describeCollections operation defined")]
    NoDescribeCollections,
}

#[derive(Debug, Error)]
pub enum CallError {
    #[error("no parameter named {name:?} on operation {operation:?}")]
    UnknownParameter { operation: String, name: String },

    #[error("parameter in {location} not supported for {name}")]
    UnsupportedLocation {
        name: String,
        location: ParameterLocation,
    },

    #[error("method {method} not supported for operation {operation:?}")]
    UnsupportedMethod { operation: String, method: String },

    #[error("no media type: {0}")]
    UnknownMediaType(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
