use crate::http::{IntoResponse, Json, Response, StatusCode};
use crate::meta::HttpMethod;
use crate::validation::ValidationFailure;

/// Helper to create a JSON error response with a standard `{ "error": message }` body.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = serde_json::json!({ "error": message.into() });
    (status, Json(body)).into_response()
}

/// Request-time errors with a JSON rendering.
pub enum HttpError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
    Validation(ValidationFailure),
    Custom {
        status: StatusCode,
        body: serde_json::Value,
    },
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        match self {
            HttpError::Validation(failure) => failure.into_response(),
            HttpError::Custom { status, body } => (status, Json(body)).into_response(),
            HttpError::NotFound(msg) => error_response(StatusCode::NOT_FOUND, msg),
            HttpError::BadRequest(msg) => error_response(StatusCode::BAD_REQUEST, msg),
            HttpError::Internal(msg) => error_response(StatusCode::INTERNAL_SERVER_ERROR, msg),
        }
    }
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpError::NotFound(msg) => write!(f, "Not Found: {msg}"),
            HttpError::BadRequest(msg) => write!(f, "Bad Request: {msg}"),
            HttpError::Internal(msg) => write!(f, "Internal Error: {msg}"),
            HttpError::Validation(failure) => {
                write!(f, "Validation Error: {} errors", failure.violations.len())
            }
            HttpError::Custom { status, body } => write!(f, "Custom Error ({status}): {body}"),
        }
    }
}

impl std::fmt::Debug for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <Self as std::fmt::Display>::fmt(self, f)
    }
}

impl std::error::Error for HttpError {}

impl From<ValidationFailure> for HttpError {
    fn from(failure: ValidationFailure) -> Self {
        HttpError::Validation(failure)
    }
}

/// Startup-time errors. Any of these means the route declarations are wrong
/// and the application must not serve traffic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// The URL rule could not be parsed.
    InvalidRule { rule: String, reason: String },
    /// Two routes share a rule and method.
    DuplicateRoute { rule: String, method: HttpMethod },
    /// Placeholders of the rule and fields of the path schema disagree.
    PathMismatch {
        rule: String,
        missing_fields: Vec<String>,
        unknown_fields: Vec<String>,
    },
    /// A blueprint with this name is already attached to the parent.
    DuplicateBlueprint(String),
    /// The generated document is inconsistent.
    Document(String),
}

impl std::fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrationError::InvalidRule { rule, reason } => {
                write!(f, "invalid URL rule '{rule}': {reason}")
            }
            RegistrationError::DuplicateRoute { rule, method } => {
                write!(f, "route {method} '{rule}' is already registered")
            }
            RegistrationError::PathMismatch {
                rule,
                missing_fields,
                unknown_fields,
            } => {
                write!(f, "path schema does not match rule '{rule}'")?;
                if !missing_fields.is_empty() {
                    write!(f, "; placeholders without a field: {}", missing_fields.join(", "))?;
                }
                if !unknown_fields.is_empty() {
                    write!(f, "; fields without a placeholder: {}", unknown_fields.join(", "))?;
                }
                Ok(())
            }
            RegistrationError::DuplicateBlueprint(name) => {
                write!(f, "blueprint '{name}' is already registered")
            }
            RegistrationError::Document(msg) => write!(f, "API document error: {msg}"),
        }
    }
}

impl std::error::Error for RegistrationError {}
