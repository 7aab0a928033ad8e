use std::future::Future;

use crate::error::RegistrationError;
use crate::meta::{RouteInfo, SecurityRequirement};
use crate::part::{PartSlot, Validated};
use crate::registrar::RouteTable;
use crate::reply::Reply;
use crate::route::Route;

/// A named group of routes sharing a URL prefix and security defaults.
///
/// Rules and parts are validated as routes are added. Path fields are matched
/// against placeholders, prefix included, and security is inherited when the
/// blueprint is attached with
/// [`App::register_api`](crate::App::register_api) or
/// [`Blueprint::register_api`].
///
/// ```ignore
/// let books = Blueprint::new("book", "/api/book")
///     .with_security("jwt", &[])
///     .route(Route::post("/").body::<BookData>(), create_book)?;
/// let app = App::new().register_api(books)?;
/// ```
pub struct Blueprint {
    name: String,
    url_prefix: String,
    security: Option<Vec<SecurityRequirement>>,
    table: RouteTable,
}

impl Blueprint {
    pub fn new(name: &str, url_prefix: &str) -> Self {
        Self {
            name: name.to_string(),
            url_prefix: url_prefix.to_string(),
            security: None,
            table: RouteTable::nested(),
        }
    }

    /// Require `scheme` with `scopes` on every route that declares no
    /// security of its own. Repeated calls add alternative requirements.
    pub fn with_security(mut self, scheme: &str, scopes: &[&str]) -> Self {
        let requirement = SecurityRequirement::from([(
            scheme.to_string(),
            scopes.iter().map(|s| s.to_string()).collect(),
        )]);
        self.security.get_or_insert_with(Vec::new).push(requirement);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    /// Declarations added so far, not yet prefixed.
    pub fn routes(&self) -> &[RouteInfo] {
        self.table.infos()
    }

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

    /// Nest another blueprint under this one.
    pub fn register_api(mut self, blueprint: Blueprint) -> Result<Self, RegistrationError> {
        self.table.attach(blueprint)?;
        Ok(self)
    }

    pub(crate) fn into_parts(
        self,
    ) -> (String, String, Option<Vec<SecurityRequirement>>, RouteTable) {
        (self.name, self.url_prefix, self.security, self.table)
    }
}
