use std::collections::BTreeMap;

use openroute_core::config::{AppConfig, ConfigError};
use openroute_core::Tag;
use serde::Serialize;

/// A server the API is reachable at.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Server {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Server {
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

/// A security scheme routes may reference by name.
///
/// Only described in the document; enforcement belongs to another layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum SecurityScheme {
    #[serde(rename = "http")]
    Http {
        scheme: String,
        #[serde(rename = "bearerFormat", skip_serializing_if = "Option::is_none")]
        bearer_format: Option<String>,
    },
    #[serde(rename = "apiKey")]
    ApiKey {
        name: String,
        #[serde(rename = "in")]
        location: String,
    },
    #[serde(rename = "oauth2")]
    OAuth2 { flows: serde_json::Value },
    #[serde(rename = "openIdConnect")]
    OpenIdConnect {
        #[serde(rename = "openIdConnectUrl")]
        url: String,
    },
}

impl SecurityScheme {
    /// HTTP bearer authentication, e.g. `SecurityScheme::bearer("JWT")`.
    pub fn bearer(format: &str) -> Self {
        SecurityScheme::Http {
            scheme: "bearer".to_string(),
            bearer_format: Some(format.to_string()),
        }
    }

    pub fn basic() -> Self {
        SecurityScheme::Http {
            scheme: "basic".to_string(),
            bearer_format: None,
        }
    }

    /// An API key sent in `location` (`header`, `query` or `cookie`).
    pub fn api_key(name: &str, location: &str) -> Self {
        SecurityScheme::ApiKey {
            name: name.to_string(),
            location: location.to_string(),
        }
    }
}

/// Global metadata of the generated document, and how it is served.
#[derive(Debug, Clone)]
pub struct OpenApiConfig {
    pub title: String,
    pub version: String,
    pub description: Option<String>,
    pub servers: Vec<Server>,
    pub security_schemes: BTreeMap<String, SecurityScheme>,
    /// Tags listed before any route tag; their descriptions win.
    pub tags: Vec<Tag>,
    /// Path the document routes are mounted under.
    pub doc_prefix: String,
    /// Serve the Swagger UI page at `<doc_prefix>/`.
    pub docs_ui: bool,
    /// Build the document while the app is built, so errors stop startup.
    pub validate_on_startup: bool,
    /// Include the document routes themselves in the document.
    pub document_self: bool,
}

impl OpenApiConfig {
    pub fn new(title: &str, version: &str) -> Self {
        Self {
            title: title.to_string(),
            version: version.to_string(),
            description: None,
            servers: Vec::new(),
            security_schemes: BTreeMap::new(),
            tags: Vec::new(),
            doc_prefix: "/openapi".to_string(),
            docs_ui: true,
            validate_on_startup: true,
            document_self: false,
        }
    }

    /// Read the `openapi.*` keys of `config`.
    ///
    /// `openapi.title` and `openapi.version` default to `API` and `0.1.0`.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let mut this = Self::new(
            &config.get_or("openapi.title", "API".to_string()),
            &config.get_or("openapi.version", "0.1.0".to_string()),
        );
        this.description = config.get_opt("openapi.description")?;
        if let Some(prefix) = config.get_opt::<String>("openapi.doc_prefix")? {
            this.doc_prefix = prefix;
        }
        if let Some(ui) = config.get_opt("openapi.docs_ui")? {
            this.docs_ui = ui;
        }
        if let Some(validate) = config.get_opt("openapi.validate_on_startup")? {
            this.validate_on_startup = validate;
        }
        if let Some(document_self) = config.get_opt("openapi.document_self")? {
            this.document_self = document_self;
        }
        if let Some(urls) = config.get_opt::<Vec<String>>("openapi.servers")? {
            this.servers = urls.iter().map(|url| Server::new(url)).collect();
        }
        Ok(this)
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    pub fn with_server(mut self, server: Server) -> Self {
        self.servers.push(server);
        self
    }

    pub fn with_security_scheme(mut self, name: &str, scheme: SecurityScheme) -> Self {
        self.security_schemes.insert(name.to_string(), scheme);
        self
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn with_doc_prefix(mut self, prefix: &str) -> Self {
        self.doc_prefix = prefix.to_string();
        self
    }

    pub fn with_docs_ui(mut self, enabled: bool) -> Self {
        self.docs_ui = enabled;
        self
    }

    pub fn with_validate_on_startup(mut self, enabled: bool) -> Self {
        self.validate_on_startup = enabled;
        self
    }

    pub fn with_document_self(mut self, enabled: bool) -> Self {
        self.document_self = enabled;
        self
    }

    /// `doc_prefix` with a leading and no trailing slash (`""` for the root).
    pub(crate) fn prefix(&self) -> String {
        match self.doc_prefix.trim_matches('/') {
            "" => String::new(),
            p => format!("/{p}"),
        }
    }

    pub(crate) fn json_path(&self) -> String {
        format!("{}/openapi.json", self.prefix())
    }

    pub(crate) fn ui_path(&self) -> String {
        format!("{}/", self.prefix())
    }
}
