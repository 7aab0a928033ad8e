use std::collections::HashSet;

use openroute_core::http::StatusCode;
use openroute_core::{
    Example, PartKind, ResponseSpec, RouteInfo, SchemaDescriptor, Tag, ValidationErrorBody,
};
use serde_json::{json, Map, Value};

use crate::config::OpenApiConfig;
use crate::error::DocumentError;
use crate::schema::{component_ref, component_refs, ComponentRegistry};

const JSON: &str = "application/json";
const URLENCODED: &str = "application/x-www-form-urlencoded";
const MULTIPART: &str = "multipart/form-data";

/// Build an OpenAPI 3.1.0 document from config and route declarations.
///
/// Routes marked hidden are skipped. Every `$ref` of the result resolves
/// inside the document; a dangling one is an error.
pub fn build_spec(config: &OpenApiConfig, routes: &[RouteInfo]) -> Result<Value, DocumentError> {
    let documented: Vec<&RouteInfo> = routes.iter().filter(|r| r.documented).collect();

    let mut registry = ComponentRegistry::new();
    let validation_ref = if documented.iter().any(|r| !r.parts.is_empty()) {
        let name = registry.register(&SchemaDescriptor::of::<ValidationErrorBody>(), "openroute")?;
        Some(component_ref(&name))
    } else {
        None
    };

    let mut tags = TagSet::default();
    for tag in &config.tags {
        tags.add(tag);
    }

    let mut paths: Map<String, Value> = Map::new();
    let mut operation_ids: HashSet<String> = HashSet::new();

    for route in documented {
        let operation_id = route.operation_id();
        if !operation_ids.insert(operation_id.clone()) {
            return Err(DocumentError::DuplicateOperationId(operation_id));
        }

        let mut operation: Map<String, Value> = Map::new();

        if !route.tags.is_empty() {
            for tag in &route.tags {
                tags.add(tag);
            }
            let names: Vec<&str> = route.tags.iter().map(|t| t.name.as_str()).collect();
            operation.insert("tags".into(), json!(names));
        }
        if let Some(ref summary) = route.summary {
            operation.insert("summary".into(), json!(summary));
        }
        if let Some(ref description) = route.description {
            operation.insert("description".into(), json!(description));
        }
        if let Some(ref docs) = route.external_docs {
            operation.insert("externalDocs".into(), json!(docs));
        }
        operation.insert("operationId".into(), json!(operation_id));

        let params = parameters(&mut registry, route, &operation_id)?;
        if !params.is_empty() {
            operation.insert("parameters".into(), Value::Array(params));
        }

        if let Some(body) = request_body(&mut registry, route, &operation_id)? {
            operation.insert("requestBody".into(), body);
        }

        let responses = responses(&mut registry, route, &operation_id, validation_ref.as_deref())?;
        operation.insert("responses".into(), Value::Object(responses));

        if route.deprecated {
            operation.insert("deprecated".into(), json!(true));
        }

        if let Some(ref requirements) = route.security {
            for scheme in requirements.iter().flat_map(|r| r.keys()) {
                if !config.security_schemes.contains_key(scheme) {
                    return Err(DocumentError::UnknownSecurityScheme {
                        scheme: scheme.clone(),
                        operation_id,
                    });
                }
            }
            operation.insert("security".into(), json!(requirements));
        }

        let path_entry = paths
            .entry(route.rule.openapi_path())
            .or_insert_with(|| json!({}));
        if let Some(obj) = path_entry.as_object_mut() {
            obj.insert(route.method.as_lower(), Value::Object(operation));
        }
    }

    let mut info: Map<String, Value> = Map::new();
    info.insert("title".into(), json!(config.title));
    info.insert("version".into(), json!(config.version));
    if let Some(ref desc) = config.description {
        info.insert("description".into(), json!(desc));
    }

    let mut components: Map<String, Value> = Map::new();
    if !registry.is_empty() {
        components.insert("schemas".into(), Value::Object(registry.into_schemas()));
    }
    if !config.security_schemes.is_empty() {
        components.insert("securitySchemes".into(), json!(config.security_schemes));
    }

    let mut doc: Map<String, Value> = Map::new();
    doc.insert("openapi".into(), json!("3.1.0"));
    doc.insert("info".into(), Value::Object(info));
    if !config.servers.is_empty() {
        doc.insert("servers".into(), json!(config.servers));
    }
    let tags = tags.into_vec();
    if !tags.is_empty() {
        doc.insert("tags".into(), json!(tags));
    }
    doc.insert("paths".into(), Value::Object(paths));
    doc.insert("components".into(), Value::Object(components));
    let doc = Value::Object(doc);

    check_refs(&doc)?;
    Ok(doc)
}

/// Document tags, deduplicated by name. The first description wins.
#[derive(Default)]
struct TagSet {
    tags: Vec<Tag>,
}

impl TagSet {
    fn add(&mut self, tag: &Tag) {
        match self.tags.iter_mut().find(|t| t.name == tag.name) {
            None => self.tags.push(tag.clone()),
            Some(existing) => {
                if existing.description.is_none() {
                    existing.description = tag.description.clone();
                } else if tag.description.is_some() && existing.description != tag.description {
                    tracing::debug!(tag = %tag.name, "Ignoring later description of duplicate tag");
                }
                if existing.external_docs.is_none() {
                    existing.external_docs = tag.external_docs.clone();
                }
            }
        }
    }

    fn into_vec(self) -> Vec<Tag> {
        self.tags
    }
}

fn parameters(
    registry: &mut ComponentRegistry,
    route: &RouteInfo,
    operation_id: &str,
) -> Result<Vec<Value>, DocumentError> {
    let mut params = Vec::new();
    for (kind, desc) in route.parts.iter().filter(|(kind, _)| kind.is_parameter()) {
        for field in desc.fields() {
            let name = match kind {
                PartKind::Header => field.name.replace('_', "-"),
                _ => field.name.clone(),
            };
            let mut param: Map<String, Value> = Map::new();
            param.insert("name".into(), json!(name));
            param.insert("in".into(), json!(kind.as_str()));
            param.insert(
                "required".into(),
                json!(kind == PartKind::Path || field.required),
            );
            param.insert("schema".into(), registry.link(desc, &field.schema, operation_id)?);
            if let Some(ref description) = field.description {
                param.insert("description".into(), json!(description));
            }
            if let Some(ref example) = field.example {
                param.insert("example".into(), example.clone());
            }
            params.push(Value::Object(param));
        }
    }
    Ok(params)
}

fn request_body(
    registry: &mut ComponentRegistry,
    route: &RouteInfo,
    operation_id: &str,
) -> Result<Option<Value>, DocumentError> {
    let mut content: Map<String, Value> = Map::new();
    let mut required = false;

    if let Some(desc) = route.parts.get(PartKind::Form) {
        let schema = json!({ "$ref": component_ref(&registry.register(desc, operation_id)?) });
        let media = media_type(schema, &route.form_examples);
        content.insert(URLENCODED.into(), media.clone());
        content.insert(MULTIPART.into(), media);
        required |= desc.has_required();
    }
    if let Some(desc) = route.parts.get(PartKind::Body) {
        let schema = json!({ "$ref": component_ref(&registry.register(desc, operation_id)?) });
        content.insert(JSON.into(), media_type(schema, &route.body_examples));
        required |= desc.has_required();
    }

    if content.is_empty() {
        return Ok(None);
    }
    Ok(Some(json!({ "required": required, "content": content })))
}

fn media_type(schema: Value, examples: &std::collections::BTreeMap<String, Example>) -> Value {
    let mut media: Map<String, Value> = Map::new();
    media.insert("schema".into(), schema);
    if !examples.is_empty() {
        media.insert("examples".into(), json!(examples));
    }
    Value::Object(media)
}

fn responses(
    registry: &mut ComponentRegistry,
    route: &RouteInfo,
    operation_id: &str,
    validation_ref: Option<&str>,
) -> Result<Map<String, Value>, DocumentError> {
    let mut responses: Map<String, Value> = Map::new();

    for (status, spec) in &route.responses {
        let description = StatusCode::from_u16(*status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Response");
        let response = match spec {
            ResponseSpec::Schema(desc) => {
                let name = registry.register(desc, operation_id)?;
                json!({
                    "description": description,
                    "content": { JSON: { "schema": { "$ref": component_ref(&name) } } }
                })
            }
            ResponseSpec::Example(example) => json!({
                "description": description,
                "content": { JSON: { "example": example } }
            }),
            ResponseSpec::Empty => json!({ "description": description }),
        };
        responses.insert(status.to_string(), response);
    }

    if responses.is_empty() {
        responses.insert("200".into(), json!({ "description": "Successful response" }));
    }

    if let Some(validation_ref) = validation_ref {
        if !route.parts.is_empty() && !responses.contains_key("422") {
            responses.insert(
                "422".into(),
                json!({
                    "description": "Unprocessable Entity",
                    "content": { JSON: { "schema": { "$ref": validation_ref } } }
                }),
            );
        }
    }

    for (status, extra) in &route.extra_responses {
        let merged = match (responses.get_mut(status), extra) {
            (Some(Value::Object(generated)), Value::Object(fields)) => {
                for (key, value) in fields {
                    generated.insert(key.clone(), value.clone());
                }
                true
            }
            _ => false,
        };
        if !merged {
            responses.insert(status.clone(), extra.clone());
        }
    }

    Ok(responses)
}

fn check_refs(doc: &Value) -> Result<(), DocumentError> {
    for (reference, location) in component_refs(doc) {
        let resolves = reference.starts_with("#/components/") && doc.pointer(&reference[1..]).is_some();
        if !resolves {
            return Err(DocumentError::UnresolvedReference {
                reference,
                location,
            });
        }
    }
    Ok(())
}
