pub mod header;

pub use axum::{serve, Json, Router};
pub use axum::body::{Body, Bytes};
pub use axum::extract::{DefaultBodyLimit, RawPathParams, Request};
pub use axum::http::Uri;
pub use axum::response::{Html, IntoResponse, Response};
pub use axum::routing::{MethodFilter, MethodRouter};
pub use self::header::{
    HeaderMap, HeaderName, HeaderValue, Method, Parts, StatusCode,
    // Common header constants
    ACCEPT, CONTENT_TYPE, COOKIE, SET_COOKIE, USER_AGENT,
};
