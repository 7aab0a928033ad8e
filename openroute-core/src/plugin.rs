//! Plugin system.
//!
//! Plugins are composable units of functionality installed into an [`App`]
//! with `.with(plugin)`. A plugin typically registers a meta consumer to turn
//! the frozen route declarations into extra routes (the API document, for
//! instance).

use crate::registrar::App;

/// A composable unit of functionality that can be installed into an [`App`].
///
/// # Example
///
/// ```ignore
/// pub struct RouteCount;
///
/// impl Plugin for RouteCount {
///     fn install(self, app: App) -> App {
///         app.with_meta_consumer(|routes| {
///             let count = routes.len();
///             Ok(Router::new().route("/routes/count", get(move || async move { count.to_string() })))
///         })
///     }
/// }
/// ```
pub trait Plugin: Send + 'static {
    /// Install this plugin into the given `App`, returning the modified app.
    fn install(self, app: App) -> App;

    /// The name of this plugin (for diagnostics).
    fn name() -> &'static str
    where
        Self: Sized,
    {
        std::any::type_name::<Self>()
    }
}
