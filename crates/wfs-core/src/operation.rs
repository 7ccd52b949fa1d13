//! Operations declared by a service, and calls bound against them.

use std::fmt;
use std::io::Write;
use std::sync::Arc;

use log::debug;

use crate::error::CallError;
use crate::media;
use crate::parse::operation::HttpMethod;
use crate::parse::parameter::ParameterLocation;
use crate::transport::{HttpRequest, Transport};

/// Media type alias a call requests unless told otherwise.
pub const DEFAULT_MEDIA_TYPE: &str = "json";

/// An optional or mandatory argument to an [`Operation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub description: String,
    pub required: bool,
    /// Schema type name, empty when the spec declares none.
    pub param_type: String,
    pub location: ParameterLocation,
}

/// A value bound to a parameter. Rendered with [`fmt::Display`] when
/// substituted into a path.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::String(s) => f.write_str(s),
            ParamValue::Integer(i) => write!(f, "{i}"),
            ParamValue::Float(x) => write!(f, "{x}"),
            ParamValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::String(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::String(v.to_string())
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Integer(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

/// One addressable action of a service.
#[derive(Debug, Clone)]
pub struct Operation {
    pub id: String,
    pub description: String,
    pub method: HttpMethod,
    /// Path template with `{name}` placeholders left in place.
    pub path: String,
    pub parameters: Vec<Parameter>,
    pub(crate) base_url: String,
    pub(crate) transport: Arc<dyn Transport>,
}

impl Operation {
    /// Service URL followed by the raw path template.
    pub fn url(&self) -> String {
        format!("{}{}", self.base_url, self.path)
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// A call without parameters.
    pub fn simple_call(&self) -> Call {
        Call {
            operation: self.clone(),
            params: Vec::new(),
            media_type: DEFAULT_MEDIA_TYPE.to_string(),
        }
    }

    /// A call binding every entry of `params`. Each key must name a
    /// declared parameter.
    pub fn call<K, V>(&self, params: impl IntoIterator<Item = (K, V)>) -> Result<Call, CallError>
    where
        K: AsRef<str>,
        V: Into<ParamValue>,
    {
        let mut bound = Vec::new();
        for (name, value) in params {
            let name = name.as_ref();
            let param = self
                .parameter(name)
                .ok_or_else(|| CallError::UnknownParameter {
                    operation: self.id.clone(),
                    name: name.to_string(),
                })?;
            bound.push((param.clone(), value.into()));
        }
        Ok(Call {
            operation: self.clone(),
            params: bound,
            media_type: DEFAULT_MEDIA_TYPE.to_string(),
        })
    }
}

/// A pending invocation of an [`Operation`]. Building one performs no I/O.
#[derive(Debug, Clone)]
pub struct Call {
    operation: Operation,
    params: Vec<(Parameter, ParamValue)>,
    media_type: String,
}

impl Call {
    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn params(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.params.iter().map(|(p, v)| (p.name.as_str(), v))
    }

    /// Request the response in `media_type`, checked only on execution.
    pub fn accept(mut self, media_type: impl Into<String>) -> Call {
        self.media_type = media_type.into();
        self
    }

    /// The request this call would send, with path parameters substituted.
    pub fn build_request(&self) -> Result<HttpRequest, CallError> {
        if self.operation.method != HttpMethod::Get {
            return Err(CallError::UnsupportedMethod {
                operation: self.operation.id.clone(),
                method: self.operation.method.to_string(),
            });
        }
        let mut url = self.operation.url();
        for (param, value) in &self.params {
            if param.location != ParameterLocation::Path {
                return Err(CallError::UnsupportedLocation {
                    name: param.name.clone(),
                    location: param.location,
                });
            }
            url = url.replace(&format!("{{{}}}", param.name), &value.to_string());
        }
        Ok(HttpRequest::get(url))
    }

    /// Execute the call, streaming the response body into `sink`.
    pub fn execute_writer(&self, sink: &mut dyn Write) -> Result<u64, CallError> {
        let request = negotiate(self.build_request()?, &self.media_type)?;
        debug!("calling {} as {}", self.operation.id, request.url);
        Ok(self.operation.transport.stream_to(&request, sink)?)
    }
}

/// Attach an `Accept` header for `media_type`. An empty alias sends none.
pub(crate) fn negotiate(request: HttpRequest, media_type: &str) -> Result<HttpRequest, CallError> {
    if media_type.is_empty() {
        return Ok(request);
    }
    let mt = media::lookup(media_type)
        .ok_or_else(|| CallError::UnknownMediaType(media_type.to_string()))?;
    Ok(request.header("Accept", mt.full))
}
