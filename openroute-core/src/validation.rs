use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value;

use crate::http::{IntoResponse, Json, Response, StatusCode};
use crate::part::PartKind;

// ── Error types ────────────────────────────────────────────

/// A field-level validation error.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct Violation {
    /// Request part the field belongs to.
    pub location: PartKind,
    /// Dotted field path; `$` for the part as a whole.
    pub field: String,
    /// Machine-readable category: `missing`, `type_error`, `invalid_json`,
    /// `invalid_structure` or `constraint`.
    pub code: String,
    pub message: String,
    /// Offending raw value (`null` when absent).
    pub value: Value,
}

impl Violation {
    pub fn new(
        location: PartKind,
        field: impl Into<String>,
        code: &str,
        message: impl Into<String>,
        value: Value,
    ) -> Self {
        Self {
            location,
            field: field.into(),
            code: code.to_string(),
            message: message.into(),
            value,
        }
    }

    pub(crate) fn missing(location: PartKind, field: &str) -> Self {
        Self::new(location, field, "missing", "field required", Value::Null)
    }
}

/// Every violation collected while binding one request.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct ValidationFailure {
    pub violations: Vec<Violation>,
}

impl ValidationFailure {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    /// Parts that contributed at least one violation, in bind order.
    pub fn locations(&self) -> Vec<PartKind> {
        let mut kinds: Vec<PartKind> = self.violations.iter().map(|v| v.location).collect();
        kinds.sort();
        kinds.dedup();
        kinds
    }

    /// Whether a violation names `field` in part `location`.
    pub fn names(&self, location: PartKind, field: &str) -> bool {
        self.violations
            .iter()
            .any(|v| v.location == location && v.field == field)
    }
}

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "request validation failed:")?;
        for v in &self.violations {
            write!(f, "\n  - {}.{}: {}", v.location, v.field, v.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationFailure {}

/// Body shape of a 422 response; also published as the `ValidationError`
/// component of the generated document.
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[schemars(rename = "ValidationError")]
pub struct ValidationErrorBody {
    pub error: String,
    pub details: Vec<Violation>,
}

impl From<ValidationFailure> for ValidationErrorBody {
    fn from(failure: ValidationFailure) -> Self {
        Self {
            error: "Validation failed".to_string(),
            details: failure.violations,
        }
    }
}

impl IntoResponse for ValidationFailure {
    fn into_response(self) -> Response {
        let body = ValidationErrorBody::from(self);
        (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
    }
}

/// Map a `garde` report onto violations of one part, looking up each
/// offending value in the coerced input.
pub(crate) fn convert_garde_report(
    location: PartKind,
    report: &garde::Report,
    input: &Value,
) -> Vec<Violation> {
    report
        .iter()
        .map(|(path, error)| {
            let field = {
                let s = path.to_string();
                if s.is_empty() { "$".to_string() } else { s }
            };
            let value = lookup_path(input, &field).cloned().unwrap_or(Value::Null);
            Violation::new(location, field, "constraint", error.message(), value)
        })
        .collect()
}

/// Resolve a `garde` path such as `items[0].name` against a JSON value.
fn lookup_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    if path == "$" {
        return Some(root);
    }
    let mut current = root;
    for segment in path.split('.') {
        let (name, indices) = match segment.find('[') {
            Some(pos) => (&segment[..pos], &segment[pos..]),
            None => (segment, ""),
        };
        if !name.is_empty() {
            current = current.get(name)?;
        }
        for index in indices
            .split(['[', ']'])
            .filter(|s| !s.is_empty())
        {
            current = match index.parse::<usize>() {
                Ok(i) => current.get(i)?,
                Err(_) => current.get(index)?,
            };
        }
    }
    Some(current)
}
