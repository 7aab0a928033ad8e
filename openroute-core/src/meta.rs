use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::http::MethodFilter;
use crate::part::PartSchemas;
use crate::rule::RouteRule;
use crate::schema::SchemaDescriptor;

/// HTTP methods a route can be registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Trace,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
        }
    }

    /// Lowercase form used as the operation key of an OpenAPI path item.
    pub fn as_lower(&self) -> String {
        self.as_str().to_ascii_lowercase()
    }

    pub(crate) fn filter(&self) -> MethodFilter {
        match self {
            HttpMethod::Get => MethodFilter::GET,
            HttpMethod::Post => MethodFilter::POST,
            HttpMethod::Put => MethodFilter::PUT,
            HttpMethod::Patch => MethodFilter::PATCH,
            HttpMethod::Delete => MethodFilter::DELETE,
            HttpMethod::Head => MethodFilter::HEAD,
            HttpMethod::Options => MethodFilter::OPTIONS,
            HttpMethod::Trace => MethodFilter::TRACE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A link to documentation outside the generated document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalDocs {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ExternalDocs {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            description: None,
        }
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }
}

/// A named group of operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "externalDocs", skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocs>,
}

impl Tag {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            external_docs: None,
        }
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    pub fn with_external_docs(mut self, docs: ExternalDocs) -> Self {
        self.external_docs = Some(docs);
        self
    }
}

/// One security requirement: scheme name to required scopes.
pub type SecurityRequirement = BTreeMap<String, Vec<String>>;

/// What a route declares for one response status.
#[derive(Debug, Clone)]
pub enum ResponseSpec {
    /// A typed payload, documented through the components registry.
    Schema(SchemaDescriptor),
    /// A literal example payload.
    Example(Value),
    /// A response without a body.
    Empty,
}

/// A named example attached to a form or body request schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Example {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub value: Value,
}

/// Immutable declaration of one registered route.
///
/// Owned by the registrar; read (never mutated) by documentation consumers.
#[derive(Debug, Clone)]
pub struct RouteInfo {
    pub rule: RouteRule,
    pub method: HttpMethod,
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<Tag>,
    pub parts: PartSchemas,
    pub responses: BTreeMap<u16, ResponseSpec>,
    /// Raw response objects merged over the generated ones, keyed by status.
    pub extra_responses: BTreeMap<String, Value>,
    /// `None` inherits the enclosing blueprint's requirements.
    pub security: Option<Vec<SecurityRequirement>>,
    pub deprecated: bool,
    pub external_docs: Option<ExternalDocs>,
    pub form_examples: BTreeMap<String, Example>,
    pub body_examples: BTreeMap<String, Example>,
    /// Whether the route appears in the generated document.
    pub documented: bool,
}

impl RouteInfo {
    /// The explicit operation id, or one derived from method and path
    /// (`put_book_bid` for `PUT /book/{bid}`).
    pub fn operation_id(&self) -> String {
        match &self.operation_id {
            Some(id) => id.clone(),
            None => {
                let raw = format!("{}_{}", self.method.as_lower(), self.rule.openapi_path());
                let mut id = String::with_capacity(raw.len());
                for c in raw.chars() {
                    if c.is_ascii_alphanumeric() {
                        id.push(c);
                    } else if !id.ends_with('_') {
                        id.push('_');
                    }
                }
                id.trim_end_matches('_').to_string()
            }
        }
    }

    /// Security requirements in effect (empty when none were declared).
    pub fn effective_security(&self) -> &[SecurityRequirement] {
        self.security.as_deref().unwrap_or_default()
    }
}
