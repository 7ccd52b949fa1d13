use std::io::Write;
use std::sync::Arc;

use crate::error::{CallError, ConnectError, LookupError};
use crate::operation::{Operation, Parameter, negotiate};
use crate::parse::operation::{HttpMethod, Operation as SpecOperation};
use crate::parse::parameter::ParameterOrRef;
use crate::parse::spec::OpenApiSpec;
use crate::paths::{PathConvention, PathResolver};
use crate::repository::SpecRepository;
use crate::transport::{HttpRequest, Transport};

/// Server URL reported when the spec declares none.
pub const UNDEFINED_URL: &str = "undefined";

/// Operation id of the aggregate collection metadata operation.
pub const DESCRIBE_COLLECTIONS: &str = "describeCollections";

/// A high-level summary of the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    pub url: String,
    pub description: String,
}

/// A connected WFS3 service. Immutable once connected.
#[derive(Debug, Clone)]
pub struct Service {
    transport: Arc<dyn Transport>,
    spec: Arc<OpenApiSpec>,
    paths: PathResolver,
    patched: bool,
}

impl Service {
    /// Fetch the spec of the service rooted at `url_root`.
    pub fn connect(
        transport: Arc<dyn Transport>,
        url_root: &str,
        convention: PathConvention,
    ) -> Result<Service, ConnectError> {
        let paths =
            PathResolver::new(url_root, convention).map_err(|source| ConnectError::InvalidUrl {
                url: url_root.to_string(),
                source,
            })?;
        let loaded = SpecRepository::new(transport.as_ref(), &paths).fetch()?;
        Ok(Service {
            transport,
            spec: Arc::new(loaded.spec),
            paths,
            patched: loaded.patched,
        })
    }

    pub fn info(&self) -> ServiceInfo {
        let url = self
            .spec
            .servers
            .first()
            .map(|s| s.url.clone())
            .unwrap_or_else(|| UNDEFINED_URL.to_string());
        ServiceInfo {
            url,
            description: self.spec.info.description.clone().unwrap_or_default(),
        }
    }

    pub fn spec(&self) -> &OpenApiSpec {
        &self.spec
    }

    pub fn paths(&self) -> &PathResolver {
        &self.paths
    }

    /// Whether the built-in WFS components were patched into the spec.
    pub fn components_patched(&self) -> bool {
        self.patched
    }

    /// Every operation of every path, in document order.
    pub fn operations(&self) -> Vec<Operation> {
        let base_url = self.info().url;
        let mut ops = Vec::new();
        for (path, item) in &self.spec.paths {
            for (method, op) in item.operations() {
                ops.push(self.build_operation(&base_url, path, method, op, &item.parameters));
            }
        }
        ops
    }

    /// The first operation whose id is `id`.
    pub fn get_operation(&self, id: &str) -> Result<Operation, LookupError> {
        self.operations()
            .into_iter()
            .find(|op| op.id == id)
            .ok_or_else(|| LookupError::NoOperation(id.to_string()))
    }

    /// The operation retrieving metadata for all feature collections.
    pub fn describe_collections(&self) -> Result<Operation, LookupError> {
        self.get_operation(DESCRIBE_COLLECTIONS)
            .map_err(|_| LookupError::NoDescribeCollections)
    }

    /// GET an arbitrary service URL, e.g. one built by [`Service::paths`],
    /// negotiating `media_type` like [`crate::operation::Call::execute_writer`].
    pub fn stream_url(
        &self,
        url: &str,
        media_type: &str,
        sink: &mut dyn Write,
    ) -> Result<u64, CallError> {
        let request = negotiate(HttpRequest::get(url), media_type)?;
        Ok(self.transport.stream_to(&request, sink)?)
    }

    fn build_operation(
        &self,
        base_url: &str,
        path: &str,
        method: HttpMethod,
        op: &SpecOperation,
        inherited: &[ParameterOrRef],
    ) -> Operation {
        let mut parameters: Vec<Parameter> = Vec::new();
        for p in inherited.iter().chain(&op.parameters) {
            let ParameterOrRef::Parameter(p) = p else {
                continue;
            };
            let param = Parameter {
                name: p.name.clone(),
                description: p.description.clone().unwrap_or_default(),
                required: p.required,
                param_type: p.schema.as_ref().map(|s| s.type_name()).unwrap_or_default(),
                location: p.location,
            };
            // Operation-level parameters override path-level ones
            match parameters
                .iter_mut()
                .find(|existing| existing.name == param.name && existing.location == param.location)
            {
                Some(existing) => *existing = param,
                None => parameters.push(param),
            }
        }

        Operation {
            id: op.operation_id.clone().unwrap_or_default(),
            description: op
                .description
                .clone()
                .or_else(|| op.summary.clone())
                .unwrap_or_default(),
            method,
            path: path.to_string(),
            parameters,
            base_url: base_url.to_string(),
            transport: self.transport.clone(),
        }
    }
}
