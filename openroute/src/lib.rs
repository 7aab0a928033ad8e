//! openroute: typed request validation and OpenAPI documentation over Axum.
//!
//! This facade crate re-exports the openroute sub-crates through a single
//! dependency with feature flags. Import everything you need with:
//!
//! ```ignore
//! use openroute::prelude::*;
//! ```
//!
//! # Feature flags
//!
//! | Feature   | Default | Crate               |
//! |-----------|---------|---------------------|
//! | `openapi` | **yes** | `openroute-openapi` |
//! | `test`    | no      | `openroute-test`    |
//! | `full`    | no      | All of the above    |

pub extern crate openroute_core;

pub use openroute_core::*;

#[cfg(feature = "openapi")]
pub use openroute_openapi;

#[cfg(feature = "test")]
pub use openroute_test;

/// Unified prelude: the core prelude plus the types of enabled feature crates.
pub mod prelude {
    pub use openroute_core::prelude::*;

    #[cfg(feature = "openapi")]
    pub use openroute_openapi::{OpenApiConfig, OpenApiPlugin, SecurityScheme, Server};

    #[cfg(feature = "test")]
    pub use openroute_test::{TestApp, TestResponse};
}
