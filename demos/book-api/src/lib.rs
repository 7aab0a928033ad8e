//! A small book API: one secured blueprint, validated parts and a
//! generated OpenAPI document.

pub mod models;
pub mod store;

use openroute::prelude::*;
use serde_json::json;

use crate::models::{Book, BookData, BookPath, BookQuery};
use crate::store::BookStore;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn book_tag() -> Tag {
    Tag::new("book").with_description("Books")
}

/// The `/api/book` routes. Every route requires the `jwt` scheme.
pub fn book_blueprint(store: BookStore) -> Result<Blueprint, RegistrationError> {
    let create_store = store.clone();
    let update_store = store.clone();
    let get_store = store.clone();
    let list_store = store;

    Blueprint::new("book", "/api")
        .with_security("jwt", &[])
        .route(
            Route::post("/book")
                .tag(book_tag())
                .summary("Create a book")
                .body::<BookData>()
                .body_example("default", Some("A typical book"), json!({"age": 3, "author": "llc"}))
                .response::<Book>(201),
            move |req: Validated<(), (), (), (), (), BookData>| {
                let store = create_store.clone();
                async move { (StatusCode::CREATED, Json(store.create(req.body))) }
            },
        )?
        .route(
            Route::get("/book")
                .tag(book_tag())
                .summary("List books")
                .query::<BookQuery>()
                .response::<Vec<Book>>(200),
            move |req: Validated<(), (), (), BookQuery>| {
                let store = list_store.clone();
                async move { Json(store.list(req.query.age)) }
            },
        )?
        .route(
            Route::get("/book/<int:bid>")
                .tag(book_tag())
                .summary("Get a book")
                .path::<BookPath>()
                .response::<Book>(200)
                .response_example(404, json!({"error": "book 7 not found"})),
            move |req: Validated<(), (), BookPath>| {
                let store = get_store.clone();
                async move {
                    let bid = req.path.bid;
                    store
                        .get(bid)
                        .map(Json)
                        .ok_or_else(|| HttpError::NotFound(format!("book {bid} not found")))
                }
            },
        )?
        .route(
            Route::put("/book/<int:bid>")
                .tag(book_tag())
                .summary("Update a book")
                .path::<BookPath>()
                .body::<BookData>()
                .response::<Book>(200)
                .response_example(404, json!({"error": "book 7 not found"})),
            move |req: Validated<(), (), BookPath, (), (), BookData>| {
                let store = update_store.clone();
                async move {
                    let bid = req.path.bid;
                    store
                        .update(bid, req.body)
                        .map(Json)
                        .ok_or_else(|| HttpError::NotFound(format!("book {bid} not found")))
                }
            },
        )
}

/// Assemble the application from configuration.
pub fn build_app(config: &AppConfig, store: BookStore) -> Result<App, BoxError> {
    let openapi = OpenApiConfig::from_config(config)?
        .with_security_scheme("jwt", SecurityScheme::bearer("JWT"))
        .with_tag(book_tag());

    let app = App::from_config(config)?
        .with(OpenApiPlugin::new(openapi))
        .register_api(book_blueprint(store)?)?;
    Ok(app)
}
