pub use axum::http::header::{
    HeaderName, HeaderValue,
    // Common header constants
    ACCEPT, CONTENT_TYPE, COOKIE, SET_COOKIE, USER_AGENT,
};
pub use axum::http::request::Parts;
pub use axum::http::{HeaderMap, Method, StatusCode};

/// Whether a `Content-Type` value denotes a JSON payload (`application/json`
/// or any `+json` suffix).
pub fn is_json(content_type: &str) -> bool {
    let mime = essence(content_type);
    mime == "application/json" || mime.ends_with("+json")
}

/// Whether a `Content-Type` value denotes an HTML-form payload.
pub fn is_form(content_type: &str) -> bool {
    let mime = essence(content_type);
    mime == "application/x-www-form-urlencoded" || mime == "multipart/form-data"
}

/// Whether a `Content-Type` value denotes a `multipart/form-data` payload.
pub fn is_multipart(content_type: &str) -> bool {
    essence(content_type) == "multipart/form-data"
}

fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
