//! OpenAPI 3.1 documentation for openroute applications.
//!
//! [`OpenApiPlugin`] turns the route declarations of an [`App`](openroute_core::App)
//! into a document served at `<doc_prefix>/openapi.json`, with an optional
//! Swagger UI page at `<doc_prefix>/`.

mod builder;
mod config;
mod error;
mod ext;
mod handlers;
pub mod schema;

pub use builder::build_spec;
pub use config::{OpenApiConfig, SecurityScheme, Server};
pub use error::DocumentError;
pub use ext::OpenApiPlugin;
pub use handlers::{openapi_routes, ApiDoc};
pub use schema::ComponentRegistry;
