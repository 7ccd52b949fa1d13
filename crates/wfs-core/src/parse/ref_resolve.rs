use std::collections::HashSet;

use indexmap::IndexMap;

use super::components::Components;
use super::content::Content;
use super::operation::{Operation, PathItem};
use super::parameter::{Parameter, ParameterOrRef};
use super::request_body::{RequestBody, RequestBodyOrRef};
use super::response::{Response, ResponseOrRef};
use super::schema::{AdditionalProperties, Schema, SchemaOrRef};
use super::spec::OpenApiSpec;
use crate::error::ResolveError;

/// Resolves all internal `$ref` pointers of a spec against its own
/// components. Circular schema references are left in place.
pub struct RefResolver<'a> {
    components: Option<&'a Components>,
    visited: HashSet<String>,
}

impl<'a> RefResolver<'a> {
    pub fn new(spec: &'a OpenApiSpec) -> Self {
        Self {
            components: spec.components.as_ref(),
            visited: HashSet::new(),
        }
    }

    /// Resolve the entire spec, returning a copy with inlined references.
    pub fn resolve_spec(&mut self, spec: &OpenApiSpec) -> Result<OpenApiSpec, ResolveError> {
        let mut resolved = spec.clone();

        for (_path, item) in &mut resolved.paths {
            self.resolve_path_item(item)?;
        }

        if let Some(ref mut components) = resolved.components {
            for schema in components.schemas.values_mut() {
                *schema = self.resolve_schema_or_ref(schema)?;
            }
            for param in components.parameters.values_mut() {
                *param = self.resolve_parameter_or_ref(param)?;
            }
            for resp in components.responses.values_mut() {
                *resp = self.resolve_response_or_ref(resp)?;
            }
            for body in components.request_bodies.values_mut() {
                *body = self.resolve_request_body_or_ref(body)?;
            }
        }

        Ok(resolved)
    }

    fn resolve_path_item(&mut self, item: &mut PathItem) -> Result<(), ResolveError> {
        item.parameters = self.resolve_parameters(&item.parameters)?;

        macro_rules! resolve_op {
            ($op:expr) => {
                if let Some(ref mut op) = $op {
                    self.resolve_operation(op)?;
                }
            };
        }
        resolve_op!(item.get);
        resolve_op!(item.post);
        resolve_op!(item.put);
        resolve_op!(item.delete);
        resolve_op!(item.patch);
        resolve_op!(item.options);
        resolve_op!(item.head);
        resolve_op!(item.trace);
        Ok(())
    }

    fn resolve_operation(&mut self, op: &mut Operation) -> Result<(), ResolveError> {
        op.parameters = self.resolve_parameters(&op.parameters)?;

        if let Some(ref body) = op.request_body {
            op.request_body = Some(self.resolve_request_body_or_ref(body)?);
        }

        let mut resolved_responses = IndexMap::new();
        for (status, resp) in &op.responses {
            resolved_responses.insert(status.clone(), self.resolve_response_or_ref(resp)?);
        }
        op.responses = resolved_responses;

        Ok(())
    }

    fn resolve_parameters(
        &mut self,
        params: &[ParameterOrRef],
    ) -> Result<Vec<ParameterOrRef>, ResolveError> {
        params
            .iter()
            .map(|p| self.resolve_parameter_or_ref(p))
            .collect()
    }

    pub fn resolve_schema_or_ref(
        &mut self,
        schema_or_ref: &SchemaOrRef,
    ) -> Result<SchemaOrRef, ResolveError> {
        match schema_or_ref {
            SchemaOrRef::Ref { ref_path } => {
                if self.visited.contains(ref_path) {
                    return Ok(schema_or_ref.clone());
                }
                let resolved = self.lookup_schema(ref_path)?;
                self.visited.insert(ref_path.clone());
                let result =
                    self.resolve_schema_or_ref(&SchemaOrRef::Schema(Box::new(resolved)));
                self.visited.remove(ref_path);
                result
            }
            SchemaOrRef::Schema(schema) => {
                let resolved = self.resolve_schema(schema)?;
                Ok(SchemaOrRef::Schema(Box::new(resolved)))
            }
        }
    }

    fn resolve_schema(&mut self, schema: &Schema) -> Result<Schema, ResolveError> {
        let mut resolved = schema.clone();

        let mut resolved_props = IndexMap::new();
        for (name, prop) in &schema.properties {
            resolved_props.insert(name.clone(), self.resolve_schema_or_ref(prop)?);
        }
        resolved.properties = resolved_props;

        if let Some(ref items) = schema.items {
            resolved.items = Some(Box::new(self.resolve_schema_or_ref(items)?));
        }

        resolved.all_of = self.resolve_schema_list(&schema.all_of)?;
        resolved.one_of = self.resolve_schema_list(&schema.one_of)?;
        resolved.any_of = self.resolve_schema_list(&schema.any_of)?;

        if let Some(AdditionalProperties::Schema(ref s)) = schema.additional_properties {
            resolved.additional_properties = Some(AdditionalProperties::Schema(Box::new(
                self.resolve_schema_or_ref(s)?,
            )));
        }

        Ok(resolved)
    }

    fn resolve_schema_list(
        &mut self,
        schemas: &[SchemaOrRef],
    ) -> Result<Vec<SchemaOrRef>, ResolveError> {
        schemas
            .iter()
            .map(|s| self.resolve_schema_or_ref(s))
            .collect()
    }

    fn resolve_parameter_or_ref(
        &mut self,
        param: &ParameterOrRef,
    ) -> Result<ParameterOrRef, ResolveError> {
        let mut resolved = match param {
            ParameterOrRef::Ref { ref_path } => self.lookup_parameter(ref_path)?,
            ParameterOrRef::Parameter(p) => p.clone(),
        };
        if let Some(ref s) = resolved.schema {
            resolved.schema = Some(self.resolve_schema_or_ref(s)?);
        }
        Ok(ParameterOrRef::Parameter(resolved))
    }

    fn resolve_request_body_or_ref(
        &mut self,
        body: &RequestBodyOrRef,
    ) -> Result<RequestBodyOrRef, ResolveError> {
        let mut resolved = match body {
            RequestBodyOrRef::Ref { ref_path } => self.lookup_request_body(ref_path)?,
            RequestBodyOrRef::RequestBody(rb) => rb.clone(),
        };
        self.resolve_content(&mut resolved.content)?;
        Ok(RequestBodyOrRef::RequestBody(resolved))
    }

    fn resolve_response_or_ref(
        &mut self,
        resp: &ResponseOrRef,
    ) -> Result<ResponseOrRef, ResolveError> {
        let mut resolved = match resp {
            ResponseOrRef::Ref { ref_path } => self.lookup_response(ref_path)?,
            ResponseOrRef::Response(r) => r.clone(),
        };
        self.resolve_content(&mut resolved.content)?;
        Ok(ResponseOrRef::Response(resolved))
    }

    fn resolve_content(
        &mut self,
        content: &mut IndexMap<String, Content>,
    ) -> Result<(), ResolveError> {
        for media in content.values_mut() {
            if let Some(ref s) = media.schema {
                media.schema = Some(self.resolve_schema_or_ref(s)?);
            }
        }
        Ok(())
    }

    // Lookup helpers

    /// Follows chains of aliased schema components (`A -> B -> schema`).
    /// A chain that loops back on itself is reported as not found.
    fn lookup_schema(&self, ref_path: &str) -> Result<Schema, ResolveError> {
        let mut seen = HashSet::new();
        let mut current = ref_path;
        loop {
            let name = parse_ref_name(current, "schemas")?;
            let target = self.components.and_then(|c| c.schemas.get(name));
            match target {
                Some(SchemaOrRef::Schema(schema)) => return Ok(schema.as_ref().clone()),
                Some(SchemaOrRef::Ref { ref_path: next }) if seen.insert(current) => {
                    current = next;
                }
                _ => return Err(ResolveError::RefTargetNotFound(ref_path.to_string())),
            }
        }
    }

    fn lookup_parameter(&self, ref_path: &str) -> Result<Parameter, ResolveError> {
        let mut seen = HashSet::new();
        let mut current = ref_path;
        loop {
            let name = parse_ref_name(current, "parameters")?;
            let target = self.components.and_then(|c| c.parameters.get(name));
            match target {
                Some(ParameterOrRef::Parameter(param)) => return Ok(param.clone()),
                Some(ParameterOrRef::Ref { ref_path: next }) if seen.insert(current) => {
                    current = next;
                }
                _ => return Err(ResolveError::RefTargetNotFound(ref_path.to_string())),
            }
        }
    }

    fn lookup_request_body(&self, ref_path: &str) -> Result<RequestBody, ResolveError> {
        let name = parse_ref_name(ref_path, "requestBodies")?;
        self.components
            .and_then(|c| c.request_bodies.get(name))
            .and_then(|rb| match rb {
                RequestBodyOrRef::RequestBody(body) => Some(body.clone()),
                _ => None,
            })
            .ok_or_else(|| ResolveError::RefTargetNotFound(ref_path.to_string()))
    }

    fn lookup_response(&self, ref_path: &str) -> Result<Response, ResolveError> {
        let name = parse_ref_name(ref_path, "responses")?;
        self.components
            .and_then(|c| c.responses.get(name))
            .and_then(|r| match r {
                ResponseOrRef::Response(resp) => Some(resp.clone()),
                _ => None,
            })
            .ok_or_else(|| ResolveError::RefTargetNotFound(ref_path.to_string()))
    }
}

/// Parse a `$ref` path like `#/components/schemas/Foo` and extract the name.
fn parse_ref_name<'a>(ref_path: &'a str, expected_section: &str) -> Result<&'a str, ResolveError> {
    let stripped = ref_path
        .strip_prefix("#/components/")
        .ok_or_else(|| ResolveError::InvalidRefFormat(ref_path.to_string()))?;
    let (section, name) = stripped
        .split_once('/')
        .ok_or_else(|| ResolveError::InvalidRefFormat(ref_path.to_string()))?;
    if section != expected_section {
        return Err(ResolveError::InvalidRefFormat(format!(
            "expected section '{}', got '{}' in {}",
            expected_section, section, ref_path
        )));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    #[test]
    fn resolves_parameter_refs() {
        let spec = parse::from_json(
            r##"{
              "openapi": "3.0.0",
              "paths": {
                "/roads/{id}": {
                  "get": {
                    "operationId": "getRoad",
                    "parameters": [ { "$ref": "#/components/parameters/id" } ]
                  }
                }
              },
              "components": {
                "parameters": {
                  "id": { "name": "id", "in": "path", "required": true, "schema": { "type": "string" } }
                }
              }
            }"##,
        )
        .unwrap();
        let resolved = RefResolver::new(&spec).resolve_spec(&spec).unwrap();
        let op = resolved.paths["/roads/{id}"].get.as_ref().unwrap();
        match &op.parameters[0] {
            ParameterOrRef::Parameter(p) => {
                assert_eq!(p.name, "id");
                assert!(p.required);
            }
            other => panic!("expected inline parameter, got {other:?}"),
        }
    }

    #[test]
    fn missing_component_is_reported() {
        let spec = parse::from_json(
            r##"{
              "openapi": "3.0.0",
              "paths": {
                "/": { "get": { "parameters": [ { "$ref": "#/components/parameters/f" } ] } }
              }
            }"##,
        )
        .unwrap();
        let err = RefResolver::new(&spec).resolve_spec(&spec).unwrap_err();
        assert!(
            matches!(err, ResolveError::RefTargetNotFound(ref r) if r == "#/components/parameters/f")
        );
    }

    #[test]
    fn circular_schema_is_left_in_place() {
        let spec = parse::from_json(
            r##"{
              "openapi": "3.0.0",
              "components": {
                "schemas": {
                  "node": {
                    "type": "object",
                    "properties": { "child": { "$ref": "#/components/schemas/node" } }
                  }
                }
              }
            }"##,
        )
        .unwrap();
        assert!(RefResolver::new(&spec).resolve_spec(&spec).is_ok());
    }

    #[test]
    fn aliased_components_are_followed() {
        let spec = parse::from_json(
            r##"{
              "openapi": "3.0.0",
              "paths": {
                "/items/{featureId}": {
                  "get": {
                    "parameters": [ { "$ref": "#/components/parameters/fid" } ],
                    "responses": {
                      "200": {
                        "description": "ok",
                        "content": {
                          "application/json": { "schema": { "$ref": "#/components/schemas/a" } }
                        }
                      }
                    }
                  }
                }
              },
              "components": {
                "schemas": {
                  "a": { "$ref": "#/components/schemas/b" },
                  "b": { "$ref": "#/components/schemas/c" },
                  "c": { "type": "object" }
                },
                "parameters": {
                  "fid": { "$ref": "#/components/parameters/featureId" },
                  "featureId": { "name": "featureId", "in": "path", "required": true }
                }
              }
            }"##,
        )
        .unwrap();
        let resolved = RefResolver::new(&spec).resolve_spec(&spec).unwrap();
        let op = resolved.paths["/items/{featureId}"].get.as_ref().unwrap();
        match &op.parameters[0] {
            ParameterOrRef::Parameter(p) => assert_eq!(p.name, "featureId"),
            other => panic!("expected inline parameter, got {other:?}"),
        }
        match &op.responses["200"] {
            ResponseOrRef::Response(r) => {
                let schema = r.content["application/json"].schema.as_ref().unwrap();
                assert_eq!(schema.type_name(), "object");
            }
            other => panic!("expected inline response, got {other:?}"),
        }
    }

    #[test]
    fn looping_alias_is_not_found() {
        let spec = parse::from_json(
            r##"{
              "openapi": "3.0.0",
              "paths": {
                "/": { "get": { "parameters": [ { "$ref": "#/components/parameters/a" } ] } }
              },
              "components": {
                "parameters": {
                  "a": { "$ref": "#/components/parameters/b" },
                  "b": { "$ref": "#/components/parameters/a" }
                }
              }
            }"##,
        )
        .unwrap();
        let err = RefResolver::new(&spec).resolve_spec(&spec).unwrap_err();
        assert!(
            matches!(err, ResolveError::RefTargetNotFound(ref r) if r == "#/components/parameters/a")
        );
    }

    #[test]
    fn wrong_section_is_invalid() {
        let err = parse_ref_name("#/components/schemas/link", "parameters").unwrap_err();
        assert!(matches!(err, ResolveError::InvalidRefFormat(_)));
    }
}
