use garde::Validate;
use openroute_core::http::StatusCode;
use openroute_core::{App, Blueprint, RegistrationError, Route, Tag, Validated};
use openroute_openapi::{build_spec, OpenApiConfig, SecurityScheme};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};

async fn created<B>(_: Validated<(), (), (), (), (), B>) -> StatusCode {
    StatusCode::CREATED
}

async fn ok(_: Validated) -> StatusCode {
    StatusCode::OK
}

fn config() -> OpenApiConfig {
    OpenApiConfig::new("Book API", "1.0.0")
}

fn spec(app: &App) -> Value {
    build_spec(&config(), app.routes()).unwrap()
}

mod v1 {
    use super::*;

    #[derive(Deserialize, JsonSchema, Validate)]
    pub struct Book {
        #[garde(skip)]
        pub title: String,
    }
}

mod v2 {
    use super::*;

    #[derive(Deserialize, JsonSchema, Validate)]
    pub struct Book {
        #[garde(skip)]
        pub isbn: String,
        #[garde(skip)]
        pub pages: i64,
    }
}

fn body_ref(doc: &Value, path: &str, method: &str) -> Value {
    doc["paths"][path][method]["requestBody"]["content"]["application/json"]["schema"]["$ref"]
        .clone()
}

// ── Components registry ─────────────────────────────────────────────────

#[test]
fn same_short_name_different_types_get_distinct_components() {
    let app = App::new()
        .route(Route::post("/v1/book").body::<v1::Book>(), created::<v1::Book>)
        .unwrap()
        .route(Route::post("/v2/book").body::<v2::Book>(), created::<v2::Book>)
        .unwrap();
    let doc = spec(&app);
    let schemas = &doc["components"]["schemas"];

    assert!(schemas["Book"]["properties"].get("title").is_some());
    assert!(schemas["post_v2_book.Book"]["properties"].get("isbn").is_some());
    assert_eq!(body_ref(&doc, "/v1/book", "post"), "#/components/schemas/Book");
    assert_eq!(
        body_ref(&doc, "/v2/book", "post"),
        "#/components/schemas/post_v2_book.Book"
    );
}

#[test]
fn reused_type_is_registered_once() {
    let app = App::new()
        .route(Route::post("/a").body::<v1::Book>(), created::<v1::Book>)
        .unwrap()
        .route(Route::put("/b").body::<v1::Book>(), created::<v1::Book>)
        .unwrap();
    let doc = spec(&app);
    let names: Vec<&String> = doc["components"]["schemas"].as_object().unwrap().keys().collect();
    assert!(names.contains(&&"Book".to_string()));
    assert!(!names.iter().any(|n| n.ends_with(".Book")));
    assert_eq!(body_ref(&doc, "/b", "put"), "#/components/schemas/Book");
}

#[derive(Deserialize, JsonSchema, Validate)]
struct Item {
    #[garde(skip)]
    sku: String,
}

#[derive(Deserialize, JsonSchema, Validate)]
struct Order {
    #[garde(skip)]
    items: Vec<Item>,
}

#[test]
fn nested_types_are_promoted_to_components() {
    let app = App::new()
        .route(Route::post("/order").body::<Order>(), created::<Order>)
        .unwrap();
    let doc = spec(&app);
    let schemas = &doc["components"]["schemas"];
    assert!(schemas["Item"]["properties"].get("sku").is_some());
    assert_eq!(
        schemas["Order"]["properties"]["items"]["items"]["$ref"],
        "#/components/schemas/Item"
    );
}

#[derive(Deserialize, JsonSchema, Validate)]
struct Node {
    #[garde(length(min = 1))]
    name: String,
    #[garde(skip)]
    children: Vec<Node>,
}

#[test]
fn recursive_types_refer_to_their_own_component() {
    let app = App::new()
        .route(Route::post("/tree").body::<Node>(), created::<Node>)
        .unwrap();
    let doc = spec(&app);
    let node = &doc["components"]["schemas"]["Node"];
    assert_eq!(node["properties"]["children"]["items"]["$ref"], "#/components/schemas/Node");
    assert_eq!(body_ref(&doc, "/tree", "post"), "#/components/schemas/Node");
}

// ── Operations ──────────────────────────────────────────────────────────

#[derive(Deserialize, JsonSchema, Validate)]
struct BookPath {
    #[garde(skip)]
    bid: u32,
}

#[derive(Deserialize, JsonSchema, Validate)]
struct Paging {
    #[garde(skip)]
    page: Option<u32>,
}

#[derive(Deserialize, JsonSchema, Validate)]
struct ApiKey {
    #[garde(skip)]
    x_api_key: String,
}

#[derive(Deserialize, JsonSchema, Validate)]
struct Session {
    #[garde(skip)]
    session: String,
}

#[test]
fn parameter_parts_become_parameters() {
    let app = App::new()
        .route(
            Route::get("/book/<int:bid>")
                .path::<BookPath>()
                .query::<Paging>()
                .header::<ApiKey>()
                .cookie::<Session>(),
            |_: Validated<ApiKey, Session, BookPath, Paging>| async { StatusCode::OK },
        )
        .unwrap();
    let doc = spec(&app);
    let params = doc["paths"]["/book/{bid}"]["get"]["parameters"].as_array().unwrap().clone();

    let find = |name: &str| params.iter().find(|p| p["name"] == name).cloned().unwrap();
    let bid = find("bid");
    assert_eq!(bid["in"], "path");
    assert_eq!(bid["required"], true);
    assert_eq!(bid["schema"]["type"], "integer");

    let page = find("page");
    assert_eq!(page["in"], "query");
    assert_eq!(page["required"], false);

    let key = find("x-api-key");
    assert_eq!(key["in"], "header");
    assert_eq!(key["required"], true);

    assert_eq!(find("session")["in"], "cookie");
    assert_eq!(params.len(), 4);
    assert!(doc["paths"]["/book/{bid}"]["get"].get("requestBody").is_none());
}

#[derive(Deserialize, JsonSchema, Validate)]
struct Login {
    #[garde(length(min = 2))]
    user: String,
}

#[test]
fn form_and_body_examples_are_documented() {
    let app = App::new()
        .route(
            Route::post("/login")
                .form::<Login>()
                .form_example("valid", Some("A valid login"), json!({"user": "ab"})),
            |_: Validated<(), (), (), (), Login>| async { StatusCode::OK },
        )
        .unwrap()
        .route(
            Route::post("/book")
                .body::<v1::Book>()
                .body_example("simple", None, json!({"title": "Dune"})),
            created::<v1::Book>,
        )
        .unwrap();
    let doc = spec(&app);

    let form = &doc["paths"]["/login"]["post"]["requestBody"];
    assert_eq!(form["required"], true);
    let urlencoded = &form["content"]["application/x-www-form-urlencoded"];
    assert_eq!(urlencoded["schema"]["$ref"], "#/components/schemas/Login");
    assert_eq!(
        urlencoded["examples"]["valid"],
        json!({"summary": "A valid login", "value": {"user": "ab"}})
    );
    assert!(form["content"].get("multipart/form-data").is_some());

    let body = &doc["paths"]["/book"]["post"]["requestBody"]["content"]["application/json"];
    assert_eq!(body["examples"]["simple"], json!({"value": {"title": "Dune"}}));
}

#[derive(serde::Serialize, JsonSchema)]
struct BookOut {
    id: u32,
    title: String,
}

#[test]
fn responses_are_documented_by_kind() {
    let app = App::new()
        .route(
            Route::post("/book")
                .body::<v1::Book>()
                .response::<BookOut>(201)
                .response_example(409, json!({"error": "exists"}))
                .response_empty(204),
            created::<v1::Book>,
        )
        .unwrap();
    let doc = spec(&app);
    let responses = &doc["paths"]["/book"]["post"]["responses"];

    assert_eq!(responses["201"]["description"], "Created");
    assert_eq!(
        responses["201"]["content"]["application/json"]["schema"]["$ref"],
        "#/components/schemas/BookOut"
    );
    assert_eq!(
        responses["409"]["content"]["application/json"]["example"],
        json!({"error": "exists"})
    );
    assert_eq!(responses["204"], json!({"description": "No Content"}));
    assert!(responses.get("200").is_none());
}

#[test]
fn routes_with_parts_document_validation_errors() {
    let app = App::new()
        .route(Route::post("/book").body::<v1::Book>(), created::<v1::Book>)
        .unwrap()
        .route(Route::get("/ping"), ok)
        .unwrap();
    let doc = spec(&app);

    let unprocessable = &doc["paths"]["/book"]["post"]["responses"]["422"];
    assert_eq!(
        unprocessable["content"]["application/json"]["schema"]["$ref"],
        "#/components/schemas/ValidationError"
    );
    let component = &doc["components"]["schemas"]["ValidationError"];
    assert!(component["properties"].get("error").is_some());
    assert!(component["properties"].get("details").is_some());

    let ping = &doc["paths"]["/ping"]["get"]["responses"];
    assert_eq!(ping, &json!({"200": {"description": "Successful response"}}));
}

#[test]
fn declared_422_is_kept() {
    let app = App::new()
        .route(
            Route::post("/book")
                .body::<v1::Book>()
                .response_example(422, json!({"error": "nope"})),
            created::<v1::Book>,
        )
        .unwrap();
    let doc = spec(&app);
    let unprocessable = &doc["paths"]["/book"]["post"]["responses"]["422"];
    assert_eq!(unprocessable["content"]["application/json"]["example"], json!({"error": "nope"}));
}

#[test]
fn operation_metadata_is_copied() {
    let app = App::new()
        .route(
            Route::get("/legacy")
                .operation_id("legacyList")
                .summary("Old listing")
                .description("Use /books instead")
                .deprecated()
                .external_docs(openroute_core::ExternalDocs::new("https://example.com/migrate")),
            ok,
        )
        .unwrap();
    let doc = spec(&app);
    let op = &doc["paths"]["/legacy"]["get"];
    assert_eq!(op["operationId"], "legacyList");
    assert_eq!(op["summary"], "Old listing");
    assert_eq!(op["description"], "Use /books instead");
    assert_eq!(op["deprecated"], true);
    assert_eq!(op["externalDocs"]["url"], "https://example.com/migrate");
}

#[test]
fn hidden_routes_are_left_out() {
    let app = App::new()
        .route(Route::get("/internal").hidden(), ok)
        .unwrap()
        .route(Route::get("/public"), ok)
        .unwrap();
    let doc = spec(&app);
    assert!(doc["paths"].get("/internal").is_none());
    assert!(doc["paths"].get("/public").is_some());
}

// ── Tags and metadata ───────────────────────────────────────────────────

#[test]
fn tags_are_merged_first_description_wins() {
    let app = App::new()
        .route(
            Route::get("/books")
                .tag(Tag::new("book").with_description("Route books"))
                .tag(Tag::new("admin")),
            ok,
        )
        .unwrap()
        .route(Route::get("/authors").tag(Tag::new("author").with_description("Authors")), ok)
        .unwrap()
        .route(Route::get("/more").tag(Tag::new("author").with_description("Other")), ok)
        .unwrap();

    let config = config().with_tag(Tag::new("book").with_description("Config books"));
    let doc = build_spec(&config, app.routes()).unwrap();
    assert_eq!(
        doc["tags"],
        json!([
            {"name": "book", "description": "Config books"},
            {"name": "admin"},
            {"name": "author", "description": "Authors"},
        ])
    );
    assert_eq!(doc["paths"]["/books"]["get"]["tags"], json!(["book", "admin"]));
}

#[test]
fn global_metadata_is_attached() {
    let config = config()
        .with_description("Books and authors")
        .with_server(openroute_openapi::Server::new("https://api.example.com"))
        .with_security_scheme("jwt", SecurityScheme::bearer("JWT"));
    let doc = build_spec(&config, &[]).unwrap();
    assert_eq!(doc["openapi"], "3.1.0");
    assert_eq!(
        doc["info"],
        json!({"title": "Book API", "version": "1.0.0", "description": "Books and authors"})
    );
    assert_eq!(doc["servers"], json!([{"url": "https://api.example.com"}]));
    assert_eq!(
        doc["components"]["securitySchemes"]["jwt"],
        json!({"type": "http", "scheme": "bearer", "bearerFormat": "JWT"})
    );
    assert_eq!(doc["paths"], json!({}));
}

// ── Security ────────────────────────────────────────────────────────────

#[test]
fn blueprint_security_reaches_the_document() {
    let books = Blueprint::new("book", "/api")
        .with_security("jwt", &[])
        .route(Route::post("/book").body::<v1::Book>(), created::<v1::Book>)
        .unwrap()
        .route(Route::get("/book/health").no_security(), ok)
        .unwrap();
    let app = App::new().register_api(books).unwrap();

    let config = config().with_security_scheme("jwt", SecurityScheme::bearer("JWT"));
    let doc = build_spec(&config, app.routes()).unwrap();
    assert_eq!(doc["paths"]["/api/book"]["post"]["security"], json!([{"jwt": []}]));
    assert_eq!(doc["paths"]["/api/book/health"]["get"]["security"], json!([]));
}

// ── Build errors ────────────────────────────────────────────────────────

#[test]
fn unknown_security_scheme_fails_the_build() {
    let app = App::new()
        .route(Route::get("/secret").security("oauth", &["read"]), ok)
        .unwrap();
    let err = build_spec(&config(), app.routes()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "operation 'get_secret' requires unknown security scheme 'oauth'"
    );
}

#[test]
fn duplicate_operation_id_fails_the_build() {
    let app = App::new()
        .route(Route::get("/a").operation_id("list"), ok)
        .unwrap()
        .route(Route::get("/b").operation_id("list"), ok)
        .unwrap();
    let err = build_spec(&config(), app.routes()).unwrap_err();
    assert_eq!(err, openroute_openapi::DocumentError::DuplicateOperationId("list".into()));
}

#[test]
fn document_errors_stop_app_build() {
    let app = App::new()
        .with(openroute_openapi::OpenApiPlugin::new(config()))
        .route(Route::get("/secret").security("oauth", &[]), ok)
        .unwrap();
    match app.build() {
        Ok(_) => panic!("build should fail"),
        Err(err) => assert_eq!(
            err,
            RegistrationError::Document(
                "operation 'get_secret' requires unknown security scheme 'oauth'".into()
            )
        ),
    }
}
