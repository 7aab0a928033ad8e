use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::binder::{bind_part, RawRequest};
use crate::schema::SchemaDescriptor;
use crate::validation::Violation;

/// One distinct source of input within a request.
///
/// The variant order is the bind order: path and query problems (usually
/// caller mistakes) surface before the body is looked at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PartKind {
    Path,
    Query,
    Header,
    Cookie,
    Form,
    Body,
}

impl PartKind {
    pub const BIND_ORDER: [PartKind; 6] = [
        PartKind::Path,
        PartKind::Query,
        PartKind::Header,
        PartKind::Cookie,
        PartKind::Form,
        PartKind::Body,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PartKind::Path => "path",
            PartKind::Query => "query",
            PartKind::Header => "header",
            PartKind::Cookie => "cookie",
            PartKind::Form => "form",
            PartKind::Body => "body",
        }
    }

    /// Parts documented as OpenAPI parameters rather than request bodies.
    pub fn is_parameter(&self) -> bool {
        matches!(
            self,
            PartKind::Path | PartKind::Query | PartKind::Header | PartKind::Cookie
        )
    }
}

impl fmt::Display for PartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A type usable as a part group: deserializable, schema-describable, and
/// constraint-checked by `garde`.
///
/// Binding additionally requires `Context: Default`, since validation runs
/// without caller-supplied context.
pub trait Model: DeserializeOwned + JsonSchema + garde::Validate + Send + 'static {}

impl<T> Model for T where T: DeserializeOwned + JsonSchema + garde::Validate + Send + 'static {}

/// Type-level marker for one part slot of a [`Route`](crate::route::Route).
pub trait PartSlot: Send + Sync + 'static {
    /// What the handler receives for this part.
    type Output: Send + 'static;

    fn bind(
        kind: PartKind,
        descriptor: Option<&SchemaDescriptor>,
        raw: &RawRequest,
    ) -> Result<Self::Output, Vec<Violation>>;
}

/// The part is not declared; the handler receives `()`.
pub struct Unset;

impl PartSlot for Unset {
    type Output = ();

    fn bind(_: PartKind, _: Option<&SchemaDescriptor>, _: &RawRequest) -> Result<(), Vec<Violation>> {
        Ok(())
    }
}

/// The part is declared with model `T`.
pub struct Declared<T>(PhantomData<fn() -> T>);

impl<T> PartSlot for Declared<T>
where
    T: Model,
    T::Context: Default,
{
    type Output = T;

    fn bind(
        kind: PartKind,
        descriptor: Option<&SchemaDescriptor>,
        raw: &RawRequest,
    ) -> Result<T, Vec<Violation>> {
        match descriptor {
            Some(descriptor) => bind_part::<T>(kind, descriptor, raw),
            None => bind_part::<T>(kind, &SchemaDescriptor::of::<T>(), raw),
        }
    }
}

/// The per-part descriptors a route declared, at most one per kind.
#[derive(Debug, Clone, Default)]
pub struct PartSchemas {
    slots: BTreeMap<PartKind, Arc<SchemaDescriptor>>,
}

impl PartSchemas {
    pub(crate) fn set(&mut self, kind: PartKind, descriptor: SchemaDescriptor) {
        self.slots.insert(kind, Arc::new(descriptor));
    }

    pub fn get(&self, kind: PartKind) -> Option<&SchemaDescriptor> {
        self.slots.get(&kind).map(Arc::as_ref)
    }

    /// Declared parts in bind order.
    pub fn iter(&self) -> impl Iterator<Item = (PartKind, &SchemaDescriptor)> {
        self.slots.iter().map(|(kind, desc)| (*kind, desc.as_ref()))
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether binding needs the request body.
    pub fn needs_body(&self) -> bool {
        self.slots.contains_key(&PartKind::Form) || self.slots.contains_key(&PartKind::Body)
    }
}

/// The validated request bundle handed to a handler.
///
/// Undeclared parts are `()`.
#[derive(Debug, Clone, Default)]
pub struct Validated<H = (), C = (), P = (), Q = (), F = (), B = ()> {
    pub header: H,
    pub cookie: C,
    pub path: P,
    pub query: Q,
    pub form: F,
    pub body: B,
}
