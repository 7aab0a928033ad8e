use serde::Serialize;
use serde_json::Value;

use crate::error::HttpError;
use crate::http::{Html, IntoResponse, Json, Response, StatusCode};
use crate::validation::ValidationFailure;

/// Conversion of a handler's return value into a transport response.
///
/// Responses pass through untouched; JSON values are sent with `200 OK`.
pub trait Reply {
    fn into_reply(self) -> Response;
}

impl Reply for Response {
    fn into_reply(self) -> Response {
        self
    }
}

impl Reply for Value {
    fn into_reply(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

impl<T: Serialize> Reply for Json<T> {
    fn into_reply(self) -> Response {
        self.into_response()
    }
}

impl<T: IntoResponse> Reply for Html<T> {
    fn into_reply(self) -> Response {
        self.into_response()
    }
}

impl Reply for String {
    fn into_reply(self) -> Response {
        self.into_response()
    }
}

impl Reply for &'static str {
    fn into_reply(self) -> Response {
        self.into_response()
    }
}

impl Reply for () {
    fn into_reply(self) -> Response {
        self.into_response()
    }
}

impl Reply for StatusCode {
    fn into_reply(self) -> Response {
        self.into_response()
    }
}

impl Reply for HttpError {
    fn into_reply(self) -> Response {
        self.into_response()
    }
}

impl Reply for ValidationFailure {
    fn into_reply(self) -> Response {
        self.into_response()
    }
}

/// Override the status of any reply.
impl<R: Reply> Reply for (StatusCode, R) {
    fn into_reply(self) -> Response {
        let (status, reply) = self;
        let mut response = reply.into_reply();
        *response.status_mut() = status;
        response
    }
}

/// Either side is forwarded unchanged; handler errors are never masked.
impl<R: Reply, E: Reply> Reply for Result<R, E> {
    fn into_reply(self) -> Response {
        match self {
            Ok(reply) => reply.into_reply(),
            Err(err) => err.into_reply(),
        }
    }
}
