use axum::body::Body;
use axum::http::{Request, StatusCode};
use garde::Validate;
use http_body_util::BodyExt;
use openroute_core::http::{Json, Router};
use openroute_core::{
    App, Blueprint, HttpError, HttpMethod, Plugin, RegistrationError, Route, Validated,
};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use tower::ServiceExt;

async fn send_get(router: Router, path: &str) -> (StatusCode, String) {
    let req = Request::builder().uri(path).body(Body::empty()).unwrap();
    let resp = router.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8_lossy(&body).to_string())
}

#[derive(Debug, Deserialize, JsonSchema, Validate)]
struct BookPath {
    #[garde(range(min = 1))]
    bid: i64,
}

#[derive(Debug, Deserialize, JsonSchema, Validate)]
struct WrongPath {
    #[garde(skip)]
    id: i64,
}

async fn ok(_: Validated) -> &'static str {
    "ok"
}

// ── Duplicates ──────────────────────────────────────────────────────────

#[test]
fn duplicate_rule_and_method_fails_at_registration() {
    let err = App::new()
        .route(Route::get("/book"), ok)
        .unwrap()
        .route(Route::get("/book"), ok)
        .err()
        .unwrap();
    assert_eq!(
        err,
        RegistrationError::DuplicateRoute {
            rule: "/book".into(),
            method: HttpMethod::Get,
        }
    );
}

#[test]
fn same_rule_different_method_is_fine() {
    let app = App::new()
        .route(Route::get("/book"), ok)
        .unwrap()
        .route(Route::post("/book"), ok)
        .unwrap();
    assert_eq!(app.routes().len(), 2);
}

#[test]
fn placeholder_names_do_not_distinguish_rules() {
    let err = App::new()
        .route(
            Route::get("/book/<int:bid>").path::<BookPath>(),
            |_: Validated<(), (), BookPath>| async {},
        )
        .unwrap()
        .route(
            Route::get("/book/{id}").path::<WrongPath>(),
            |_: Validated<(), (), WrongPath>| async {},
        )
        .err()
        .unwrap();
    assert!(matches!(err, RegistrationError::DuplicateRoute { .. }));
}

#[test]
fn differing_placeholder_names_on_one_path_are_rejected() {
    let err = App::new()
        .route(
            Route::get("/book/<int:bid>").path::<BookPath>(),
            |_: Validated<(), (), BookPath>| async {},
        )
        .unwrap()
        .route(
            Route::delete("/book/{id}").path::<WrongPath>(),
            |_: Validated<(), (), WrongPath>| async {},
        )
        .err()
        .unwrap();
    assert!(matches!(err, RegistrationError::InvalidRule { .. }));
}

// ── Path schema vs rule ─────────────────────────────────────────────────

#[test]
fn placeholder_without_field_is_an_error() {
    let err = App::new()
        .route(
            Route::get("/book/<int:bid>").path::<WrongPath>(),
            |_: Validated<(), (), WrongPath>| async {},
        )
        .err()
        .unwrap();
    assert_eq!(
        err,
        RegistrationError::PathMismatch {
            rule: "/book/<int:bid>".into(),
            missing_fields: vec!["bid".into()],
            unknown_fields: vec!["id".into()],
        }
    );
    assert!(err.to_string().contains("placeholders without a field: bid"));
}

#[test]
fn placeholder_without_path_schema_is_an_error() {
    let err = App::new().route(Route::get("/book/<bid>"), ok).err().unwrap();
    assert!(matches!(
        err,
        RegistrationError::PathMismatch { ref missing_fields, .. } if missing_fields == &["bid".to_string()]
    ));
}

#[test]
fn malformed_rule_is_an_error() {
    let err = App::new().route(Route::get("/book/<bad:bid>"), ok).err().unwrap();
    assert!(matches!(err, RegistrationError::InvalidRule { .. }));
}

// ── Operation ids ───────────────────────────────────────────────────────

#[test]
fn default_operation_id_derives_from_method_and_path() {
    let app = App::new()
        .route(
            Route::put("/book/<int:bid>").path::<BookPath>(),
            |_: Validated<(), (), BookPath>| async {},
        )
        .unwrap()
        .route(Route::get("/book").operation_id("list_books"), ok)
        .unwrap();
    assert_eq!(app.routes()[0].operation_id(), "put_book_bid");
    assert_eq!(app.routes()[1].operation_id(), "list_books");
}

// ── Blueprints ──────────────────────────────────────────────────────────

#[tokio::test]
async fn blueprint_routes_are_prefixed_and_served() {
    let books = Blueprint::new("book", "/api/book")
        .route(Route::get("/"), ok)
        .unwrap()
        .route(
            Route::get("/<int:bid>").path::<BookPath>(),
            |req: Validated<(), (), BookPath>| async move { Json(json!({ "bid": req.path.bid })) },
        )
        .unwrap();
    let app = App::new().register_api(books).unwrap();

    let rules: Vec<&str> = app.routes().iter().map(|r| r.rule.as_str()).collect();
    assert_eq!(rules, ["/api/book/", "/api/book/<int:bid>"]);

    let router = app.build().unwrap();
    let (status, body) = send_get(router.clone(), "/api/book/3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"bid":3}"#);
    let (status, body) = send_get(router, "/api/book/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[test]
fn blueprint_security_is_inherited_unless_overridden() {
    let books = Blueprint::new("book", "/book")
        .with_security("jwt", &[])
        .route(Route::get("/"), ok)
        .unwrap()
        .route(Route::post("/").security("api_key", &["write"]), ok)
        .unwrap()
        .route(Route::get("/public").no_security(), ok)
        .unwrap();
    let app = App::new().register_api(books).unwrap();
    let routes = app.routes();

    assert_eq!(routes[0].effective_security()[0]["jwt"], Vec::<String>::new());
    assert!(!routes[1].effective_security()[0].contains_key("jwt"));
    assert_eq!(routes[1].effective_security()[0]["api_key"], vec!["write".to_string()]);
    assert!(routes[2].effective_security().is_empty());
}

#[test]
fn nested_blueprints_stack_prefixes() {
    let v1 = Blueprint::new("v1", "/v1")
        .with_security("jwt", &[])
        .route(Route::get("/ping"), ok)
        .unwrap();
    let api = Blueprint::new("api", "/api")
        .with_security("basic", &[])
        .register_api(v1)
        .unwrap();
    let app = App::new().register_api(api).unwrap();

    assert_eq!(app.routes()[0].rule.as_str(), "/api/v1/ping");
    assert!(app.routes()[0].effective_security()[0].contains_key("jwt"));
}

#[derive(Debug, Deserialize, JsonSchema, Validate)]
struct OrgPath {
    #[garde(length(min = 2))]
    org: String,
}

#[derive(Debug, Deserialize, JsonSchema, Validate)]
struct MemberPath {
    #[garde(length(min = 2))]
    org: String,
    #[garde(skip)]
    uid: u32,
}

#[tokio::test]
async fn blueprint_prefix_placeholders_are_bound() {
    let orgs = Blueprint::new("orgs", "/org/<org>")
        .route(
            Route::get("/members").path::<OrgPath>(),
            |req: Validated<(), (), OrgPath>| async move { req.path.org },
        )
        .unwrap()
        .route(
            Route::get("/members/<int:uid>").path::<MemberPath>(),
            |req: Validated<(), (), MemberPath>| async move {
                Json(json!({ "org": req.path.org, "uid": req.path.uid }))
            },
        )
        .unwrap();
    let router = App::new().register_api(orgs).unwrap().build().unwrap();

    let (status, body) = send_get(router.clone(), "/org/acme/members").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "acme");
    let (status, body) = send_get(router.clone(), "/org/acme/members/7").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"org":"acme","uid":7}"#);
    let (status, _) = send_get(router, "/org/a/members").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[test]
fn blueprint_prefix_placeholder_without_field_fails_at_attach() {
    let orgs = Blueprint::new("orgs", "/org/<org>")
        .route(Route::get("/members"), ok)
        .unwrap();
    let err = App::new().register_api(orgs).err().unwrap();
    assert_eq!(
        err,
        RegistrationError::PathMismatch {
            rule: "/org/<org>/members".into(),
            missing_fields: vec!["org".into()],
            unknown_fields: vec![],
        }
    );
}

#[test]
fn nested_blueprint_fields_are_checked_against_the_full_prefix() {
    let members = Blueprint::new("members", "/members")
        .route(
            Route::get("/").path::<OrgPath>(),
            |_: Validated<(), (), OrgPath>| async {},
        )
        .unwrap();
    let orgs = Blueprint::new("orgs", "/org/<org>").register_api(members).unwrap();
    let app = App::new().register_api(orgs).unwrap();
    assert_eq!(app.routes()[0].rule.as_str(), "/org/<org>/members/");
}

#[test]
fn registering_a_blueprint_name_twice_fails() {
    let first = Blueprint::new("book", "/book").route(Route::get("/"), ok).unwrap();
    let second = Blueprint::new("book", "/books").route(Route::get("/"), ok).unwrap();
    let err = App::new()
        .register_api(first)
        .unwrap()
        .register_api(second)
        .err()
        .unwrap();
    assert_eq!(err, RegistrationError::DuplicateBlueprint("book".into()));
}

#[test]
fn blueprint_route_clashing_with_app_route_fails() {
    let books = Blueprint::new("book", "/book").route(Route::get("/"), ok).unwrap();
    let err = App::new()
        .route(Route::get("/book/"), ok)
        .unwrap()
        .register_api(books)
        .err()
        .unwrap();
    assert!(matches!(err, RegistrationError::DuplicateRoute { .. }));
}

// ── Plugins and meta consumers ──────────────────────────────────────────

struct RouteCount;

impl Plugin for RouteCount {
    fn install(self, app: App) -> App {
        app.with_meta_consumer(|routes| {
            let count = routes.len();
            Ok(Router::new().route(
                "/routes/count",
                axum::routing::get(move || async move { count.to_string() }),
            ))
        })
    }
}

#[tokio::test]
async fn meta_consumer_sees_every_route() {
    let router = App::new()
        .with(RouteCount)
        .route(Route::get("/a"), ok)
        .unwrap()
        .route(Route::get("/b"), ok)
        .unwrap()
        .build()
        .unwrap();
    let (status, body) = send_get(router, "/routes/count").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "2");
}

#[test]
fn meta_consumer_error_aborts_build() {
    let err = App::new()
        .with_meta_consumer(|_| Err(RegistrationError::Document("broken".into())))
        .build()
        .err()
        .unwrap();
    assert_eq!(err, RegistrationError::Document("broken".into()));
}

// ── Reply normalization ─────────────────────────────────────────────────

#[tokio::test]
async fn handler_results_are_normalized() {
    let router = App::new()
        .route(Route::get("/created"), |_: Validated| async {
            (StatusCode::CREATED, Json(json!({ "id": 1 })))
        })
        .unwrap()
        .route(Route::get("/missing"), |_: Validated| async {
            Err::<Json<()>, _>(HttpError::NotFound("no such book".into()))
        })
        .unwrap()
        .route(Route::get("/value"), |_: Validated| async { json!([1, 2]) })
        .unwrap()
        .build()
        .unwrap();

    let (status, body) = send_get(router.clone(), "/created").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, r#"{"id":1}"#);

    let (status, body) = send_get(router.clone(), "/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"no such book"}"#);

    let (status, body) = send_get(router, "/value").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[1,2]");
}

#[tokio::test]
async fn unregistered_method_is_405() {
    let router = App::new().route(Route::get("/a"), ok).unwrap().build().unwrap();
    let req = Request::builder()
        .method("DELETE")
        .uri("/a")
        .body(Body::empty())
        .unwrap();
    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}
