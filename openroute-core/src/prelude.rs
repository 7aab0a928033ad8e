//! Import everything needed to declare routes with a single `use`.
//!
//! ```ignore
//! use openroute_core::prelude::*;
//!
//! #[derive(Deserialize, JsonSchema, Validate)]
//! struct BookQuery {
//!     #[garde(range(min = 2, max = 4))]
//!     age: i64,
//! }
//!
//! let app = App::new().route(
//!     Route::get("/book").query::<BookQuery>(),
//!     |req: Validated<(), (), (), BookQuery>| async move { Json(req.query.age) },
//! )?;
//! ```

pub use crate::http::{Html, IntoResponse, Json, Response, Router, StatusCode};
pub use crate::{
    App, AppConfig, Blueprint, ExternalDocs, HttpError, HttpMethod, Plugin, RegistrationError,
    Reply, Route, RouteInfo, Tag, Validated, ValidationFailure,
};
pub use garde::Validate;
pub use schemars::JsonSchema;
