use openroute_core::config::{AppConfig, ConfigError};
use openroute_core::{App, Plugin};

use crate::{openapi_routes, OpenApiConfig};

/// Plugin that serves the generated OpenAPI document and the Swagger UI.
///
/// # Example
///
/// ```ignore
/// use openroute_openapi::{OpenApiConfig, OpenApiPlugin, SecurityScheme};
///
/// let router = App::new()
///     .with(OpenApiPlugin::new(
///         OpenApiConfig::new("Book API", "1.0.0")
///             .with_security_scheme("jwt", SecurityScheme::bearer("JWT")),
///     ))
///     .register_api(books)?
///     .build()?;
/// ```
pub struct OpenApiPlugin {
    config: OpenApiConfig,
}

impl OpenApiPlugin {
    pub fn new(config: OpenApiConfig) -> Self {
        Self { config }
    }

    /// Create the plugin from the `openapi.*` configuration keys.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(OpenApiConfig::from_config(config)?))
    }
}

impl Plugin for OpenApiPlugin {
    fn install(self, app: App) -> App {
        let config = self.config;
        app.with_meta_consumer(move |routes| openapi_routes(config, routes))
    }
}
