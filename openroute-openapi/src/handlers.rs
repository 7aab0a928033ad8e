use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use axum::http::header::CONTENT_TYPE;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use openroute_core::http::StatusCode;
use openroute_core::{
    error_response, HttpMethod, PartSchemas, RegistrationError, RouteInfo, RouteRule, Tag,
};
use serde_json::{json, Value};

use crate::builder::build_spec;
use crate::config::OpenApiConfig;
use crate::error::DocumentError;

/// The built document and its serialized form.
struct BuiltDoc {
    value: Value,
    json: Bytes,
}

/// Route declarations plus the document built from them, at most once.
pub struct ApiDoc {
    config: OpenApiConfig,
    routes: Vec<RouteInfo>,
    built: OnceLock<Result<BuiltDoc, DocumentError>>,
}

impl ApiDoc {
    pub fn new(config: OpenApiConfig, routes: &[RouteInfo]) -> Result<Self, RegistrationError> {
        let mut routes = routes.to_vec();
        if config.document_self {
            routes.push(doc_route(
                &config.json_path(),
                "openapi_json",
                "The OpenAPI document",
                "application/json",
            )?);
            if config.docs_ui {
                routes.push(doc_route(
                    &config.ui_path(),
                    "openapi_ui",
                    "Interactive API documentation",
                    "text/html",
                )?);
            }
        }
        Ok(Self {
            config,
            routes,
            built: OnceLock::new(),
        })
    }

    /// The document, built on first access.
    pub fn document(&self) -> Result<&Value, DocumentError> {
        self.built().map(|doc| &doc.value)
    }

    /// The document serialized as JSON. Every call returns the same bytes.
    pub fn json(&self) -> Result<Bytes, DocumentError> {
        self.built().map(|doc| doc.json.clone())
    }

    fn built(&self) -> Result<&BuiltDoc, DocumentError> {
        self.built
            .get_or_init(|| {
                let value = build_spec(&self.config, &self.routes)?;
                let json = serde_json::to_vec_pretty(&value)
                    .map_err(|e| DocumentError::Serialize(e.to_string()))?;
                tracing::info!(
                    paths = value["paths"].as_object().map_or(0, |p| p.len()),
                    schemas = value["components"]["schemas"]
                        .as_object()
                        .map_or(0, |s| s.len()),
                    "OpenAPI document built"
                );
                Ok(BuiltDoc {
                    value,
                    json: Bytes::from(json),
                })
            })
            .as_ref()
            .map_err(Clone::clone)
    }

    fn json_response(&self) -> Response {
        match self.json() {
            Ok(json) => ([(CONTENT_TYPE, "application/json")], json).into_response(),
            Err(err) => {
                tracing::error!(error = %err, "OpenAPI document could not be built");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        }
    }
}

/// Build an `axum::Router` serving `<doc_prefix>/openapi.json` and, when
/// enabled, the Swagger UI at `<doc_prefix>/`.
///
/// With `validate_on_startup` the document is built here and any
/// [`DocumentError`] is returned.
pub fn openapi_routes(
    config: OpenApiConfig,
    routes: &[RouteInfo],
) -> Result<Router, RegistrationError> {
    let json_path = config.json_path();
    let ui_path = config.ui_path();
    let docs_ui = config.docs_ui;
    let html = swagger_html(&config.title, &json_path);

    let doc = Arc::new(ApiDoc::new(config, routes)?);
    if doc.config.validate_on_startup {
        doc.document()?;
    }

    let json_doc = Arc::clone(&doc);
    let mut router = Router::new().route(
        &json_path,
        get(move || {
            let doc = Arc::clone(&json_doc);
            async move { doc.json_response() }
        }),
    );

    if docs_ui {
        router = router.route(
            &ui_path,
            get(move || {
                let doc = Arc::clone(&doc);
                let html = html.clone();
                async move {
                    if let Err(err) = doc.document() {
                        tracing::error!(error = %err, "OpenAPI document could not be built");
                    }
                    Html(html).into_response()
                }
            }),
        );
    }

    tracing::debug!(json = %json_path, ui = docs_ui, "OpenAPI routes mounted");
    Ok(router)
}

fn doc_route(
    path: &str,
    operation_id: &str,
    description: &str,
    media_type: &str,
) -> Result<RouteInfo, RegistrationError> {
    Ok(RouteInfo {
        rule: RouteRule::parse(path)?,
        method: HttpMethod::Get,
        operation_id: Some(operation_id.to_string()),
        summary: None,
        description: None,
        tags: vec![Tag::new("openapi")],
        parts: PartSchemas::default(),
        responses: BTreeMap::new(),
        extra_responses: BTreeMap::from([(
            "200".to_string(),
            json!({ "description": description, "content": { media_type: {} } }),
        )]),
        security: None,
        deprecated: false,
        external_docs: None,
        form_examples: BTreeMap::new(),
        body_examples: BTreeMap::new(),
        documented: true,
    })
}

fn swagger_html(title: &str, spec_url: &str) -> String {
    let title = title
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    SWAGGER_HTML
        .replace("{{TITLE}}", &title)
        .replace("{{SPEC_URL}}", spec_url)
}

const SWAGGER_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{TITLE}}</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5.9.0/swagger-ui.css" />
    <style>
        html {
            box-sizing: border-box;
            overflow-y: scroll;
        }
        body {
            margin: 0;
            background: #fafafa;
        }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5.9.0/swagger-ui-bundle.js"></script>
    <script src="https://unpkg.com/swagger-ui-dist@5.9.0/swagger-ui-standalone-preset.js"></script>
    <script>
        window.onload = function() {
            window.ui = SwaggerUIBundle({
                url: '{{SPEC_URL}}',
                dom_id: '#swagger-ui',
                deepLinking: true,
                presets: [
                    SwaggerUIBundle.presets.apis,
                    SwaggerUIStandalonePreset
                ],
                layout: "StandaloneLayout"
            });
        };
    </script>
</body>
</html>"#;
