//! Fetching and decoding a service's OpenAPI document.
//!
//! Many WFS3 servers reference the standard OGC parameters and schemas
//! (`#/components/parameters/f`, `#/components/schemas/featureGeoJSON`, ...)
//! without publishing them. When references do not resolve, the built-in
//! component set is installed in place of the document's own and resolution
//! is retried once.

use log::{debug, warn};

use crate::error::{ConnectError, ParseError};
use crate::media;
use crate::parse;
use crate::parse::components::Components;
use crate::parse::ref_resolve::RefResolver;
use crate::parse::spec::OpenApiSpec;
use crate::paths::PathResolver;
use crate::transport::{HttpRequest, Transport};

const WFS_COMPONENTS_JSON: &str = include_str!("wfs_components.json");

/// A decoded document with every internal reference resolved.
#[derive(Debug, Clone)]
pub struct LoadedSpec {
    pub spec: OpenApiSpec,
    /// Whether the built-in components had to be patched in.
    pub patched: bool,
}

/// Loads the spec document of one service.
pub struct SpecRepository<'a> {
    transport: &'a dyn Transport,
    paths: &'a PathResolver,
}

impl<'a> SpecRepository<'a> {
    pub fn new(transport: &'a dyn Transport, paths: &'a PathResolver) -> Self {
        Self { transport, paths }
    }

    pub fn fetch(&self) -> Result<LoadedSpec, ConnectError> {
        let mut request = HttpRequest::get(self.paths.spec());
        if let Some(json) = media::lookup_short("json") {
            request = request.header("Accept", json.full);
        }
        let bytes = self.transport.fetch(&request)?;
        debug!("fetched {} bytes of spec from {}", bytes.len(), request.url);
        decode_spec(&bytes)
    }
}

/// Decode and resolve a spec document, patching in the standard WFS
/// components if its references cannot be resolved as published.
pub fn decode_spec(bytes: &[u8]) -> Result<LoadedSpec, ConnectError> {
    let mut spec = parse::from_slice(bytes)?;

    let first = RefResolver::new(&spec).resolve_spec(&spec);
    let err = match first {
        Ok(spec) => {
            return Ok(LoadedSpec {
                spec,
                patched: false,
            });
        }
        Err(err) => err,
    };

    let components = wfs_components()?;
    warn!(
        "{err}; patching in standard WFS components (parameters: {})",
        components
            .parameters
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    );
    spec.components = Some(components);

    let resolved = RefResolver::new(&spec).resolve_spec(&spec)?;
    Ok(LoadedSpec {
        spec: resolved,
        patched: true,
    })
}

/// The standard OGC WFS3 parameters and schemas.
pub fn wfs_components() -> Result<Components, ParseError> {
    Ok(serde_json::from_str(WFS_COMPONENTS_JSON)?)
}
