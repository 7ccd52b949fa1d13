use std::io::Write;
use std::sync::{Arc, Mutex};

use wfs_core::error::{ConnectError, LookupError, TransportError};
use wfs_core::parse::operation::HttpMethod;
use wfs_core::parse::parameter::ParameterLocation;
use wfs_core::paths::PathResolver;
use wfs_core::repository::SpecRepository;
use wfs_core::{HttpRequest, PathConvention, Service, Transport};

const LEGACY: &str = include_str!("fixtures/wfs3-legacy.json");
const CURRENT: &str = include_str!("fixtures/wfs3-current.json");

/// Serves one fixed body for every request and records what was asked.
#[derive(Debug)]
struct FixedTransport {
    body: Vec<u8>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FixedTransport {
    fn new(body: &str) -> Arc<Self> {
        Arc::new(Self {
            body: body.as_bytes().to_vec(),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for FixedTransport {
    fn fetch(&self, request: &HttpRequest) -> Result<Vec<u8>, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.body.clone())
    }

    fn stream_to(
        &self,
        request: &HttpRequest,
        sink: &mut dyn Write,
    ) -> Result<u64, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        sink.write_all(&self.body)?;
        Ok(self.body.len() as u64)
    }
}

fn try_connect(body: &str, root: &str) -> Result<Service, ConnectError> {
    Service::connect(FixedTransport::new(body), root, PathConvention::Legacy)
}

fn connect(body: &str, root: &str, convention: PathConvention) -> Service {
    Service::connect(FixedTransport::new(body), root, convention).unwrap()
}

#[test]
fn repository_requests_spec_as_json() {
    let transport = FixedTransport::new(CURRENT);
    let paths = PathResolver::new("http://localhost:8080/wfs", PathConvention::Current).unwrap();
    let loaded = SpecRepository::new(transport.as_ref(), &paths).fetch().unwrap();
    assert!(!loaded.patched);

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url, "http://localhost:8080/wfs/api/");
    assert_eq!(requests[0].headers["Accept"], "application/json");
}

#[test]
fn legacy_spec_is_patched_once() {
    let transport = FixedTransport::new(LEGACY);
    let svc = Service::connect(
        transport.clone(),
        "http://localhost:8080/wfs/",
        PathConvention::Legacy,
    )
    .expect("should connect after patching");
    assert!(svc.components_patched());
    assert_eq!(transport.requests().len(), 1);

    let components = svc.spec().components.as_ref().expect("patched components");
    assert!(components.parameters.contains_key("resultType"));
    assert!(components.schemas.contains_key("featureGeoJSON"));
}

#[test]
fn legacy_service_info_and_operations() {
    let svc = connect(LEGACY, "http://localhost:8080/wfs", PathConvention::Legacy);

    let info = svc.info();
    assert_eq!(info.url, "http://localhost:8080/wfs");
    assert_eq!(info.description, "Rivers and lakes served over WFS 3.0");

    let ids: Vec<String> = svc.operations().into_iter().map(|op| op.id).collect();
    assert_eq!(ids, ["describeCollections", "getRiversFeatures", "getRiversFeature"]);

    let features = svc.get_operation("getRiversFeatures").unwrap();
    let names: Vec<&str> = features.parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["f", "startIndex", "count", "bbox", "resultType"]);
    let count = features.parameter("count").unwrap();
    assert_eq!(count.param_type, "integer");
    assert_eq!(count.location, ParameterLocation::Query);
    assert!(!count.required);
    assert_eq!(features.description, "retrieve features of rivers");

    let feature = svc.get_operation("getRiversFeature").unwrap();
    assert_eq!(feature.url(), "http://localhost:8080/wfs/rivers/{id}");
    assert_eq!(feature.description, "Fetch a single river by feature id.");
    let id = feature.parameter("id").unwrap();
    assert!(id.required);
    assert_eq!(id.location, ParameterLocation::Path);
    assert_eq!(id.description, "The id of a feature");
}

#[test]
fn legacy_call_builds_feature_url() {
    let svc = connect(LEGACY, "http://localhost:8080/wfs", PathConvention::Legacy);
    let op = svc.get_operation("getRiversFeature").unwrap();
    let req = op.call([("id", "rhine")]).unwrap().build_request().unwrap();
    assert_eq!(req.url, "http://localhost:8080/wfs/rivers/rhine");
}

#[test]
fn missing_server_is_undefined() {
    let svc = connect(CURRENT, "http://localhost:8080/", PathConvention::Current);
    let info = svc.info();
    assert_eq!(info.url, "undefined");
    assert_eq!(info.description, "");
}

#[test]
fn path_item_parameters_are_inherited_and_overridden() {
    let svc = connect(CURRENT, "http://localhost:8080/", PathConvention::Current);
    let op = svc.get_operation("getFeature").unwrap();
    let names: Vec<&str> = op.parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["collectionId", "featureId", "crs"]);
    assert_eq!(
        op.parameter("collectionId").unwrap().description,
        "Local identifier of a collection"
    );
    assert_eq!(op.parameter("featureId").unwrap().param_type, "integer");

    let delete = svc.get_operation("deleteFeature").unwrap();
    assert_eq!(delete.method, HttpMethod::Delete);
    assert_eq!(delete.parameters.len(), 2);
}

#[test]
fn describe_collections_lookup() {
    let svc = connect(CURRENT, "http://localhost:8080/", PathConvention::Current);
    let op = svc.describe_collections().unwrap();
    assert_eq!(op.path, "/collections");

    let err = svc.get_operation("nope").unwrap_err();
    assert!(matches!(err, LookupError::NoOperation(ref id) if id == "nope"));
}

#[test]
fn missing_describe_collections_is_reported() {
    let spec = r#"{"openapi":"3.0.0","paths":{"/x":{"get":{"operationId":"other"}}}}"#;
    let svc = connect(spec, "http://localhost/", PathConvention::Legacy);
    assert!(matches!(
        svc.describe_collections().unwrap_err(),
        LookupError::NoDescribeCollections
    ));
}

#[test]
fn duplicate_ids_resolve_to_first() {
    let spec = r#"{
      "openapi": "3.0.0",
      "paths": {
        "/a": { "get": { "operationId": "dup" } },
        "/b": { "get": { "operationId": "dup" } }
      }
    }"#;
    let svc = connect(spec, "http://localhost/", PathConvention::Legacy);
    assert_eq!(svc.get_operation("dup").unwrap().path, "/a");
}

#[test]
fn invalid_root_url_is_rejected() {
    let err = try_connect(CURRENT, "not a url").unwrap_err();
    assert!(matches!(err, ConnectError::InvalidUrl { .. }));
}

#[test]
fn garbage_spec_is_a_decode_error() {
    let err = try_connect("<html/>", "http://localhost/").unwrap_err();
    assert!(matches!(err, ConnectError::Decode(_)));
}
