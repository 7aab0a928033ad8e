//! Route registration and router assembly.
//!
//! [`App`] collects typed route declarations, wraps each handler with the
//! request binder and, on [`App::build`], freezes the declarations and
//! produces the `axum::Router`.

use std::collections::BTreeMap;
use std::future::Future;

use crate::blueprint::Blueprint;
use crate::config::{AppConfig, ConfigError};
use crate::error::RegistrationError;
use crate::handler::{self, Endpoint};
use crate::http::{DefaultBodyLimit, MethodRouter, Request, Router};
use crate::meta::RouteInfo;
use crate::part::{PartSlot, Validated};
use crate::plugin::Plugin;
use crate::reply::Reply;
use crate::route::Route;

/// Declarations and their wrapped handlers, in registration order.
///
/// Shared by [`App`] and [`Blueprint`].
#[derive(Default)]
pub(crate) struct RouteTable {
    infos: Vec<RouteInfo>,
    endpoints: Vec<Endpoint>,
    blueprints: Vec<String>,
    /// Rules are still relative to a blueprint prefix; path fields are
    /// checked once the table is attached to an app.
    nested: bool,
}

impl RouteTable {
    pub(crate) fn nested() -> Self {
        Self {
            nested: true,
            ..Self::default()
        }
    }

    pub(crate) fn add<H, C, P, Q, F, B, Fun, Fut>(
        &mut self,
        route: Route<H, C, P, Q, F, B>,
        handler: Fun,
    ) -> Result<(), RegistrationError>
    where
        H: PartSlot,
        C: PartSlot,
        P: PartSlot,
        Q: PartSlot,
        F: PartSlot,
        B: PartSlot,
        Fun: Fn(Validated<H::Output, C::Output, P::Output, Q::Output, F::Output, B::Output>) -> Fut
            + Clone
            + Send
            + Sync
            + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Reply,
    {
        let info = route.into_info()?;
        if !self.nested {
            crate::route::check_path_fields(&info.rule, &info.parts)?;
        }
        let endpoint = handler::wrap::<H, C, P, Q, F, B, Fun, Fut>(info.parts.clone(), handler);
        self.insert(info, endpoint)
    }

    /// Insert one declaration, rejecting (rule, method) duplicates.
    pub(crate) fn insert(&mut self, info: RouteInfo, endpoint: Endpoint) -> Result<(), RegistrationError> {
        let key = info.rule.conflict_key();
        for existing in self.infos.iter().filter(|i| i.rule.conflict_key() == key) {
            if existing.method == info.method {
                return Err(RegistrationError::DuplicateRoute {
                    rule: info.rule.as_str().to_string(),
                    method: info.method,
                });
            }
            if existing.rule.axum_path() != info.rule.axum_path() {
                return Err(RegistrationError::InvalidRule {
                    rule: info.rule.as_str().to_string(),
                    reason: format!(
                        "placeholder names differ from '{}' registered on the same path",
                        existing.rule
                    ),
                });
            }
        }

        tracing::debug!(
            method = %info.method,
            rule = %info.rule,
            operation_id = %info.operation_id(),
            "Registered route"
        );
        self.infos.push(info);
        self.endpoints.push(endpoint);
        Ok(())
    }

    /// Merge `blueprint` under its prefix and security defaults.
    pub(crate) fn attach(&mut self, blueprint: Blueprint) -> Result<(), RegistrationError> {
        if self.blueprints.iter().any(|name| name == blueprint.name()) {
            return Err(RegistrationError::DuplicateBlueprint(blueprint.name().to_string()));
        }

        let (name, prefix, security, table) = blueprint.into_parts();
        let count = table.infos.len();
        for (mut info, endpoint) in table.infos.into_iter().zip(table.endpoints) {
            info.rule = info.rule.prefixed(&prefix)?;
            if !self.nested {
                crate::route::check_path_fields(&info.rule, &info.parts)?;
            }
            if info.security.is_none() {
                info.security = security.clone();
            }
            self.insert(info, endpoint)?;
        }

        tracing::info!(blueprint = %name, prefix = %prefix, routes = count, "Attached blueprint");
        self.blueprints.push(name);
        Ok(())
    }

    pub(crate) fn infos(&self) -> &[RouteInfo] {
        &self.infos
    }

    fn into_router(self) -> (Vec<RouteInfo>, Router) {
        let mut grouped: BTreeMap<String, MethodRouter> = BTreeMap::new();
        for (info, endpoint) in self.infos.iter().zip(self.endpoints) {
            let path = info.rule.axum_path();
            let has_placeholders = !info.rule.placeholders().is_empty();
            let methods = grouped.remove(&path).unwrap_or_else(MethodRouter::new);
            let methods =
                methods.on(info.method.filter(), move |req: Request| endpoint(req, has_placeholders));
            grouped.insert(path, methods);
        }

        let router = grouped
            .into_iter()
            .fold(Router::new(), |router, (path, methods)| router.route(&path, methods));
        (self.infos, router)
    }
}

type MetaConsumer = Box<dyn FnOnce(&[RouteInfo]) -> Result<Router, RegistrationError> + Send>;

/// The route registrar.
///
/// ```ignore
/// let router = App::new()
///     .with(OpenApiPlugin::new(OpenApiConfig::new("Book API", "1.0.0")))
///     .route(Route::post("/book").body::<BookData>(), create_book)?
///     .register_api(books)?
///     .build()?;
/// ```
pub struct App {
    table: RouteTable,
    body_limit: Option<usize>,
    trace: bool,
    meta_consumers: Vec<MetaConsumer>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            table: RouteTable::default(),
            body_limit: None,
            trace: false,
            meta_consumers: Vec::new(),
        }
    }

    /// Create an app from configuration.
    ///
    /// Reads `app.body_limit` (bytes) and `app.trace` (request tracing layer).
    /// Both are optional; a value of the wrong type is an error.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let mut app = Self::new();
        app.body_limit = config.get_opt::<usize>("app.body_limit")?;
        app.trace = config.get_opt::<bool>("app.trace")?.unwrap_or(false);
        Ok(app)
    }

    /// Limit the size of request bodies read for form and body binding.
    pub fn with_body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = Some(bytes);
        self
    }

    /// Wrap the router in a tower-http `TraceLayer`.
    pub fn with_trace(mut self) -> Self {
        self.trace = true;
        self
    }

    /// Install a plugin.
    pub fn with<Pl: Plugin>(self, plugin: Pl) -> Self {
        tracing::debug!(plugin = Pl::name(), "Installing plugin");
        plugin.install(self)
    }

    /// Register a consumer of the frozen route declarations.
    ///
    /// At [`build`](Self::build) time, `f` receives every registered
    /// [`RouteInfo`] and returns extra routes to merge into the app. An error
    /// aborts the build.
    pub fn with_meta_consumer<Fun>(mut self, f: Fun) -> Self
    where
        Fun: FnOnce(&[RouteInfo]) -> Result<Router, RegistrationError> + Send + 'static,
    {
        self.meta_consumers.push(Box::new(f));
        self
    }

    /// Register one route.
    ///
    /// Fails on a malformed rule, a (rule, method) pair that is already
    /// registered, or a path schema that does not match the rule.
    pub fn route<H, C, P, Q, F, B, Fun, Fut>(
        mut self,
        route: Route<H, C, P, Q, F, B>,
        handler: Fun,
    ) -> Result<Self, RegistrationError>
    where
        H: PartSlot,
        C: PartSlot,
        P: PartSlot,
        Q: PartSlot,
        F: PartSlot,
        B: PartSlot,
        Fun: Fn(Validated<H::Output, C::Output, P::Output, Q::Output, F::Output, B::Output>) -> Fut
            + Clone
            + Send
            + Sync
            + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Reply,
    {
        self.table.add(route, handler)?;
        Ok(self)
    }

    /// Attach a blueprint. Attaching two blueprints with the same name fails.
    pub fn register_api(mut self, blueprint: Blueprint) -> Result<Self, RegistrationError> {
        self.table.attach(blueprint)?;
        Ok(self)
    }

    /// Declarations registered so far.
    pub fn routes(&self) -> &[RouteInfo] {
        self.table.infos()
    }

    /// Freeze the declarations and assemble the router.
    pub fn build(self) -> Result<Router, RegistrationError> {
        let App {
            table,
            body_limit,
            trace,
            meta_consumers,
        } = self;

        let (infos, mut router) = table.into_router();
        for consumer in meta_consumers {
            router = router.merge(consumer(&infos)?);
        }

        if let Some(limit) = body_limit {
            router = router.layer(DefaultBodyLimit::max(limit));
        }
        if trace {
            router = router.layer(crate::layers::default_trace());
        }

        tracing::info!(routes = infos.len(), "Router assembled");
        Ok(router)
    }
}
