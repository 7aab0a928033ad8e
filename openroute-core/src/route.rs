//! Typed route declarations.
//!
//! A [`Route`] carries, in its type parameters, which request parts the
//! handler expects. Each part can be declared once; the handler then receives
//! a [`Validated`](crate::part::Validated) bundle whose fields have the
//! declared types.
//!
//! ```ignore
//! app.route(
//!     Route::put("/book/<int:bid>")
//!         .tag(Tag::new("book"))
//!         .path::<BookPath>()
//!         .body::<BookData>()
//!         .response::<Book>(200),
//!     |req: Validated<(), (), BookPath, (), (), BookData>| async move {
//!         Json(update(req.path.bid, req.body))
//!     },
//! )?;
//! ```

use std::collections::BTreeMap;
use std::marker::PhantomData;

use serde_json::Value;

use crate::error::RegistrationError;
use crate::meta::{
    Example, ExternalDocs, HttpMethod, ResponseSpec, RouteInfo, SecurityRequirement, Tag,
};
use crate::part::{Declared, Model, PartKind, PartSchemas, Unset};
use crate::rule::RouteRule;
use crate::schema::SchemaDescriptor;

/// Declaration of one route. Type parameters, in order: header, cookie, path,
/// query, form, body.
pub struct Route<H = Unset, C = Unset, P = Unset, Q = Unset, F = Unset, B = Unset> {
    rule: String,
    method: HttpMethod,
    operation_id: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    tags: Vec<Tag>,
    parts: PartSchemas,
    responses: BTreeMap<u16, ResponseSpec>,
    extra_responses: BTreeMap<String, Value>,
    security: Option<Vec<SecurityRequirement>>,
    deprecated: bool,
    external_docs: Option<ExternalDocs>,
    form_examples: BTreeMap<String, Example>,
    body_examples: BTreeMap<String, Example>,
    documented: bool,
    _parts: PhantomData<fn() -> (H, C, P, Q, F, B)>,
}

impl Route {
    pub fn new(method: HttpMethod, rule: &str) -> Self {
        Route {
            rule: rule.to_string(),
            method,
            operation_id: None,
            summary: None,
            description: None,
            tags: Vec::new(),
            parts: PartSchemas::default(),
            responses: BTreeMap::new(),
            extra_responses: BTreeMap::new(),
            security: None,
            deprecated: false,
            external_docs: None,
            form_examples: BTreeMap::new(),
            body_examples: BTreeMap::new(),
            documented: true,
            _parts: PhantomData,
        }
    }

    pub fn get(rule: &str) -> Self {
        Self::new(HttpMethod::Get, rule)
    }

    pub fn post(rule: &str) -> Self {
        Self::new(HttpMethod::Post, rule)
    }

    pub fn put(rule: &str) -> Self {
        Self::new(HttpMethod::Put, rule)
    }

    pub fn patch(rule: &str) -> Self {
        Self::new(HttpMethod::Patch, rule)
    }

    pub fn delete(rule: &str) -> Self {
        Self::new(HttpMethod::Delete, rule)
    }
}

impl<H, C, P, Q, F, B> Route<H, C, P, Q, F, B> {
    fn retype<H2, C2, P2, Q2, F2, B2>(self) -> Route<H2, C2, P2, Q2, F2, B2> {
        Route {
            rule: self.rule,
            method: self.method,
            operation_id: self.operation_id,
            summary: self.summary,
            description: self.description,
            tags: self.tags,
            parts: self.parts,
            responses: self.responses,
            extra_responses: self.extra_responses,
            security: self.security,
            deprecated: self.deprecated,
            external_docs: self.external_docs,
            form_examples: self.form_examples,
            body_examples: self.body_examples,
            documented: self.documented,
            _parts: PhantomData,
        }
    }

    fn declare<T: Model>(mut self, kind: PartKind) -> Self {
        self.parts.set(kind, SchemaDescriptor::of::<T>());
        self
    }

    pub fn tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn tags(mut self, tags: impl IntoIterator<Item = Tag>) -> Self {
        self.tags.extend(tags);
        self
    }

    pub fn summary(mut self, summary: &str) -> Self {
        self.summary = Some(summary.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn operation_id(mut self, id: &str) -> Self {
        self.operation_id = Some(id.to_string());
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    pub fn external_docs(mut self, docs: ExternalDocs) -> Self {
        self.external_docs = Some(docs);
        self
    }

    /// Keep the route out of the generated document. It is still validated
    /// and served.
    pub fn hidden(mut self) -> Self {
        self.documented = false;
        self
    }

    /// Require `scheme` with `scopes`. Repeated calls add alternative
    /// requirements; overrides any blueprint default.
    pub fn security(mut self, scheme: &str, scopes: &[&str]) -> Self {
        let requirement = SecurityRequirement::from([(
            scheme.to_string(),
            scopes.iter().map(|s| s.to_string()).collect(),
        )]);
        self.security.get_or_insert_with(Vec::new).push(requirement);
        self
    }

    /// Declare that the route needs no credentials, even inside a secured blueprint.
    pub fn no_security(mut self) -> Self {
        self.security = Some(Vec::new());
        self
    }

    /// Document a typed response payload for `status`.
    pub fn response<T: schemars::JsonSchema>(self, status: u16) -> Self {
        self.response_descriptor(status, SchemaDescriptor::of::<T>())
    }

    /// Document a response payload from an explicit descriptor.
    pub fn response_descriptor(mut self, status: u16, descriptor: SchemaDescriptor) -> Self {
        self.responses.insert(status, ResponseSpec::Schema(descriptor));
        self
    }

    /// Document a literal example payload for `status`.
    pub fn response_example(mut self, status: u16, example: Value) -> Self {
        self.responses.insert(status, ResponseSpec::Example(example));
        self
    }

    /// Document a body-less response for `status`.
    pub fn response_empty(mut self, status: u16) -> Self {
        self.responses.insert(status, ResponseSpec::Empty);
        self
    }

    /// Merge a raw OpenAPI response object for `status` over the generated one.
    pub fn extra_response(mut self, status: &str, response: Value) -> Self {
        self.extra_responses.insert(status.to_string(), response);
        self
    }

    pub fn form_example(mut self, name: &str, summary: Option<&str>, value: Value) -> Self {
        self.form_examples.insert(
            name.to_string(),
            Example {
                summary: summary.map(str::to_string),
                value,
            },
        );
        self
    }

    pub fn body_example(mut self, name: &str, summary: Option<&str>, value: Value) -> Self {
        self.body_examples.insert(
            name.to_string(),
            Example {
                summary: summary.map(str::to_string),
                value,
            },
        );
        self
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Parse the rule and check it against the path schema.
    pub(crate) fn into_info(self) -> Result<RouteInfo, RegistrationError> {
        let rule = RouteRule::parse(&self.rule)?;
        Ok(RouteInfo {
            rule,
            method: self.method,
            operation_id: self.operation_id,
            summary: self.summary,
            description: self.description,
            tags: self.tags,
            parts: self.parts,
            responses: self.responses,
            extra_responses: self.extra_responses,
            security: self.security,
            deprecated: self.deprecated,
            external_docs: self.external_docs,
            form_examples: self.form_examples,
            body_examples: self.body_examples,
            documented: self.documented,
        })
    }
}

impl<C, P, Q, F, B> Route<Unset, C, P, Q, F, B> {
    pub fn header<T: Model>(self) -> Route<Declared<T>, C, P, Q, F, B> {
        self.declare::<T>(PartKind::Header).retype()
    }
}

impl<H, P, Q, F, B> Route<H, Unset, P, Q, F, B> {
    pub fn cookie<T: Model>(self) -> Route<H, Declared<T>, P, Q, F, B> {
        self.declare::<T>(PartKind::Cookie).retype()
    }
}

impl<H, C, Q, F, B> Route<H, C, Unset, Q, F, B> {
    pub fn path<T: Model>(self) -> Route<H, C, Declared<T>, Q, F, B> {
        self.declare::<T>(PartKind::Path).retype()
    }
}

impl<H, C, P, F, B> Route<H, C, P, Unset, F, B> {
    pub fn query<T: Model>(self) -> Route<H, C, P, Declared<T>, F, B> {
        self.declare::<T>(PartKind::Query).retype()
    }
}

impl<H, C, P, Q, B> Route<H, C, P, Q, Unset, B> {
    pub fn form<T: Model>(self) -> Route<H, C, P, Q, Declared<T>, B> {
        self.declare::<T>(PartKind::Form).retype()
    }
}

impl<H, C, P, Q, F> Route<H, C, P, Q, F, Unset> {
    pub fn body<T: Model>(self) -> Route<H, C, P, Q, F, Declared<T>> {
        self.declare::<T>(PartKind::Body).retype()
    }
}

/// Every placeholder needs a path field and every path field a placeholder.
pub(crate) fn check_path_fields(rule: &RouteRule, parts: &PartSchemas) -> Result<(), RegistrationError> {
    let placeholders = rule.placeholders();
    let fields: Vec<&str> = parts
        .get(PartKind::Path)
        .map(|desc| desc.fields().iter().map(|f| f.name.as_str()).collect())
        .unwrap_or_default();

    let missing_fields: Vec<String> = placeholders
        .iter()
        .filter(|p| !fields.contains(p))
        .map(|p| p.to_string())
        .collect();
    let unknown_fields: Vec<String> = fields
        .iter()
        .filter(|f| !placeholders.contains(f))
        .map(|f| f.to_string())
        .collect();

    if missing_fields.is_empty() && unknown_fields.is_empty() {
        Ok(())
    } else {
        Err(RegistrationError::PathMismatch {
            rule: rule.as_str().to_string(),
            missing_fields,
            unknown_fields,
        })
    }
}
