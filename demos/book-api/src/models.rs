use garde::Validate;
use schemars::{JsonSchema, Schema};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `age` must be sent, but may be `null`.
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
#[schemars(transform = require_age)]
pub struct BookData {
    /// Reader age
    #[garde(range(min = 2, max = 4))]
    pub age: Option<i64>,
    /// Author name
    #[garde(length(min = 2, max = 4))]
    pub author: Option<String>,
}

fn require_age(schema: &mut Schema) {
    let required = schema
        .ensure_object()
        .entry("required")
        .or_insert_with(|| Value::Array(Vec::new()));
    if let Value::Array(names) = required {
        if !names.iter().any(|n| n == "age") {
            names.insert(0, Value::from("age"));
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema, Validate)]
pub struct BookPath {
    /// Book id
    #[garde(skip)]
    pub bid: u32,
}

#[derive(Debug, Deserialize, JsonSchema, Validate)]
pub struct BookQuery {
    /// Only books for this age
    #[garde(range(min = 2, max = 4))]
    pub age: Option<i64>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct Book {
    pub id: u32,
    pub age: Option<i64>,
    pub author: Option<String>,
}
