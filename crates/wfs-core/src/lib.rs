//! Client library for OGC Web Feature Service 3 endpoints.
//!
//! [`Service::connect`] fetches a service's OpenAPI document, patching in the
//! standard WFS components when the server leaves them out. The service then
//! lists its [`Operation`]s, which bind path parameters into a [`Call`] that
//! streams the response to any writer.

pub mod collections;
pub mod config;
pub mod error;
pub mod media;
pub mod operation;
pub mod parse;
pub mod paths;
pub mod repository;
pub mod service;
pub mod transport;

pub use error::{CallError, ConnectError, LookupError, ParseError, ResolveError, TransportError};
pub use operation::{Call, Operation, ParamValue, Parameter};
pub use paths::{PathConvention, PathResolver};
pub use service::{Service, ServiceInfo};
pub use transport::{HttpRequest, HttpTransport, Transport};
