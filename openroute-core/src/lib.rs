pub mod binder;
pub mod blueprint;
pub mod config;
pub mod error;
mod handler;
pub mod http;
pub mod layers;
pub mod meta;
pub mod part;
pub mod plugin;
pub mod prelude;
pub mod registrar;
pub mod reply;
pub mod route;
pub mod rule;
pub mod schema;
pub mod validation;

pub use binder::{bind, bind_part, RawBody, RawRequest};
pub use blueprint::Blueprint;
pub use config::{AppConfig, ConfigError, ConfigValue, FromConfigValue};
pub use error::{error_response, HttpError, RegistrationError};
pub use layers::{default_trace, init_tracing};
pub use meta::{
    Example, ExternalDocs, HttpMethod, ResponseSpec, RouteInfo, SecurityRequirement, Tag,
};
pub use part::{Declared, Model, PartKind, PartSchemas, PartSlot, Unset, Validated};
pub use plugin::Plugin;
pub use registrar::App;
pub use reply::Reply;
pub use route::Route;
pub use rule::{Converter, RouteRule};
pub use schema::{Constraints, FieldDescriptor, FieldType, SchemaDescriptor};
pub use validation::{ValidationErrorBody, ValidationFailure, Violation};

pub use garde;
pub use schemars;
