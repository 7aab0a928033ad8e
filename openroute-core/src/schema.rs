//! Schema descriptors: the declarative shape of one request part or response.
//!
//! A [`SchemaDescriptor`] is derived once, at registration time, from a type's
//! `schemars` JSON Schema. The binder uses its field list to pull and coerce raw
//! request values; the document assembler uses its schema and definitions to
//! populate the components registry.

use schemars::JsonSchema;
use serde::Serialize;
use serde_json::{Map, Value};

/// Semantic type of a single field, as far as request coercion is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    Array(Box<FieldType>),
    Object,
    /// No `type` keyword; values pass through uncoerced.
    Any,
}

impl FieldType {
    /// Human-readable description used in type-coercion violations.
    pub fn expected(&self) -> &'static str {
        match self {
            FieldType::String => "a valid string",
            FieldType::Integer => "a valid integer",
            FieldType::Number => "a valid number",
            FieldType::Boolean => "a valid boolean",
            FieldType::Array(_) => "a valid array",
            FieldType::Object => "a valid object",
            FieldType::Any => "any value",
        }
    }

    fn from_keyword(keyword: &str, schema: &Value, defs: &Map<String, Value>) -> Self {
        match keyword {
            "string" => FieldType::String,
            "integer" => FieldType::Integer,
            "number" => FieldType::Number,
            "boolean" => FieldType::Boolean,
            "object" => FieldType::Object,
            "array" => {
                let item = schema
                    .get("items")
                    .map(|items| resolve_type(items, defs).0)
                    .unwrap_or(FieldType::Any);
                FieldType::Array(Box::new(item))
            }
            _ => FieldType::Any,
        }
    }
}

/// Validation keywords lifted from a field's schema, for documentation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Constraints {
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<f64>,
    pub exclusive_maximum: Option<f64>,
    pub pattern: Option<String>,
    pub allowed: Option<Vec<Value>>,
}

impl Constraints {
    fn from_schema(schema: &Value) -> Self {
        Self {
            min_length: schema.get("minLength").and_then(Value::as_u64),
            max_length: schema.get("maxLength").and_then(Value::as_u64),
            minimum: schema.get("minimum").and_then(Value::as_f64),
            maximum: schema.get("maximum").and_then(Value::as_f64),
            exclusive_minimum: schema.get("exclusiveMinimum").and_then(Value::as_f64),
            exclusive_maximum: schema.get("exclusiveMaximum").and_then(Value::as_f64),
            pattern: schema.get("pattern").and_then(Value::as_str).map(str::to_string),
            allowed: schema.get("enum").and_then(Value::as_array).cloned(),
        }
    }

    /// True when no keyword is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One named field of a [`SchemaDescriptor`].
#[derive(Debug, Clone, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub field_type: FieldType,
    pub required: bool,
    pub nullable: bool,
    pub default: Option<Value>,
    pub constraints: Constraints,
    pub description: Option<String>,
    pub example: Option<Value>,
    /// The property schema exactly as generated (may contain `$ref`s).
    pub schema: Value,
}

/// Immutable description of a part group or response payload.
///
/// Identity is the qualified name: two types sharing a short name but declared
/// in different modules are different descriptors.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaDescriptor {
    name: String,
    qualified_name: String,
    schema: Value,
    definitions: Map<String, Value>,
    fields: Vec<FieldDescriptor>,
}

impl SchemaDescriptor {
    /// Derive the descriptor of `T` from its `schemars` schema.
    pub fn of<T: JsonSchema>() -> Self {
        let schema = schemars::schema_for!(T).to_value();
        Self::from_schema(T::schema_name(), T::schema_id(), schema)
    }

    /// Build a descriptor from a hand-written JSON Schema object.
    ///
    /// Nested definitions are read from `$defs` (or legacy `definitions`).
    pub fn from_schema(
        name: impl Into<String>,
        qualified_name: impl Into<String>,
        schema: Value,
    ) -> Self {
        let mut schema = schema;
        let mut definitions = Map::new();
        if let Some(obj) = schema.as_object_mut() {
            obj.remove("$schema");
            for key in ["$defs", "definitions"] {
                if let Some(Value::Object(defs)) = obj.remove(key) {
                    definitions.extend(defs);
                }
            }
        }
        let fields = collect_fields(&schema, &definitions);
        Self {
            name: name.into(),
            qualified_name: qualified_name.into(),
            schema,
            definitions,
            fields,
        }
    }

    /// Short name (`BookData`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Module-qualified name (`my_app::models::BookData`).
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// Root schema with `$schema` and `$defs` stripped.
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Nested type definitions referenced from [`schema`](Self::schema) via `#/$defs/<name>`.
    pub fn definitions(&self) -> &Map<String, Value> {
        &self.definitions
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Look up a field by its serialized name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether any field must be present in the request.
    pub fn has_required(&self) -> bool {
        self.fields.iter().any(|f| f.required)
    }
}

fn collect_fields(schema: &Value, defs: &Map<String, Value>) -> Vec<FieldDescriptor> {
    let root = resolve(schema, defs);
    let required: Vec<&str> = root
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let Some(properties) = root.get("properties").and_then(Value::as_object) else {
        return Vec::new();
    };

    properties
        .iter()
        .map(|(name, property)| {
            let (field_type, nullable) = resolve_type(property, defs);
            let resolved = resolve(property, defs);
            let default = property.get("default").cloned();
            FieldDescriptor {
                name: name.clone(),
                field_type,
                required: required.contains(&name.as_str()) && default.is_none(),
                nullable,
                default,
                constraints: Constraints::from_schema(resolved),
                description: lookup_str(property, resolved, "description"),
                example: property
                    .get("examples")
                    .and_then(Value::as_array)
                    .and_then(|examples| examples.first())
                    .or_else(|| property.get("example"))
                    .cloned(),
                schema: property.clone(),
            }
        })
        .collect()
}

fn lookup_str(property: &Value, resolved: &Value, key: &str) -> Option<String> {
    property
        .get(key)
        .or_else(|| resolved.get(key))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Follow a local `$ref` into the definitions table.
fn resolve<'a>(schema: &'a Value, defs: &'a Map<String, Value>) -> &'a Value {
    schema
        .get("$ref")
        .and_then(Value::as_str)
        .and_then(|reference| {
            reference
                .strip_prefix("#/$defs/")
                .or_else(|| reference.strip_prefix("#/definitions/"))
        })
        .and_then(|name| defs.get(name))
        .unwrap_or(schema)
}

/// Determine the coercion type of a property and whether it admits `null`.
fn resolve_type(schema: &Value, defs: &Map<String, Value>) -> (FieldType, bool) {
    let schema = resolve(schema, defs);

    for combinator in ["anyOf", "oneOf"] {
        if let Some(variants) = schema.get(combinator).and_then(Value::as_array) {
            let nullable = variants.iter().any(is_null_schema);
            let concrete: Vec<&Value> = variants.iter().filter(|v| !is_null_schema(v)).collect();
            return match concrete.as_slice() {
                [single] => (resolve_type(single, defs).0, nullable),
                _ => (FieldType::Any, nullable),
            };
        }
    }

    match schema.get("type") {
        Some(Value::String(keyword)) => (FieldType::from_keyword(keyword, schema, defs), false),
        Some(Value::Array(keywords)) => {
            let nullable = keywords.iter().any(|k| k == "null");
            let concrete: Vec<&str> = keywords
                .iter()
                .filter_map(Value::as_str)
                .filter(|k| *k != "null")
                .collect();
            match concrete.as_slice() {
                [single] => (FieldType::from_keyword(single, schema, defs), nullable),
                _ => (FieldType::Any, nullable),
            }
        }
        _ => match schema.get("enum").and_then(Value::as_array).and_then(|v| v.first()) {
            Some(Value::String(_)) => (FieldType::String, false),
            Some(Value::Number(n)) if n.is_i64() || n.is_u64() => (FieldType::Integer, false),
            Some(Value::Number(_)) => (FieldType::Number, false),
            Some(Value::Bool(_)) => (FieldType::Boolean, false),
            _ => (FieldType::Any, false),
        },
    }
}

fn is_null_schema(schema: &Value) -> bool {
    schema.get("type").and_then(Value::as_str) == Some("null")
}
