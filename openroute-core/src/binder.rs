//! Request binding: extract each declared part from a live request, coerce it
//! against the part's descriptor, and delegate structure and constraint checks
//! to `serde` and `garde`.

use serde_json::{Map, Number, Value};

use crate::http::header::{is_form, is_json, is_multipart};
use crate::http::{Bytes, HeaderMap, COOKIE};
use crate::part::{Model, PartKind, PartSchemas, PartSlot, Validated};
use crate::schema::{FieldDescriptor, FieldType, SchemaDescriptor};
use crate::validation::{convert_garde_report, ValidationFailure, Violation};

/// The request body as the binder sees it.
#[derive(Debug, Clone, PartialEq)]
pub enum RawBody {
    /// No bytes, or a form payload that is not JSON.
    Empty,
    Json(Value),
    /// Bytes that failed to parse as JSON, with the parser message.
    Malformed(String),
}

/// Raw, uncoerced values of every request part.
#[derive(Debug, Clone)]
pub struct RawRequest {
    pub path: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    /// Names of headers whose values are not valid UTF-8.
    pub opaque_headers: Vec<String>,
    pub cookies: Vec<(String, String)>,
    pub form: Vec<(String, String)>,
    pub body: RawBody,
}

impl Default for RawRequest {
    fn default() -> Self {
        Self {
            path: Vec::new(),
            query: Vec::new(),
            headers: Vec::new(),
            opaque_headers: Vec::new(),
            cookies: Vec::new(),
            form: Vec::new(),
            body: RawBody::Empty,
        }
    }
}

impl RawRequest {
    /// Collect raw parts from an HTTP request head.
    ///
    /// `path` holds the router's matched captures; `body` is `None` when no
    /// form or body schema needs it.
    pub fn from_head(
        path: Vec<(String, String)>,
        query: Option<&str>,
        headers: &HeaderMap,
        body: Option<&Bytes>,
    ) -> Self {
        let content_type = headers
            .get(crate::http::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        let (form, body) = match body {
            Some(bytes) if !bytes.is_empty() => {
                if is_multipart(content_type) {
                    // Fields are read by the caller with the streaming parser.
                    (Vec::new(), RawBody::Empty)
                } else if is_form(content_type) {
                    (parse_pairs(Some(bytes.as_ref())), RawBody::Empty)
                } else if content_type.is_empty() || is_json(content_type) {
                    let body = match serde_json::from_slice::<Value>(bytes) {
                        Ok(value) => RawBody::Json(value),
                        Err(err) => RawBody::Malformed(err.to_string()),
                    };
                    (Vec::new(), body)
                } else {
                    (
                        Vec::new(),
                        RawBody::Malformed(format!("unsupported content type `{content_type}`")),
                    )
                }
            }
            _ => (Vec::new(), RawBody::Empty),
        };

        let mut readable = Vec::new();
        let mut opaque_headers = Vec::new();
        for (name, value) in headers {
            match value.to_str() {
                Ok(v) => readable.push((name.as_str().to_string(), v.to_string())),
                Err(_) => opaque_headers.push(name.as_str().to_string()),
            }
        }

        Self {
            path,
            query: parse_pairs(query.map(str::as_bytes)),
            headers: readable,
            opaque_headers,
            cookies: parse_cookies(headers),
            form,
            body,
        }
    }

    fn pairs(&self, kind: PartKind) -> &[(String, String)] {
        match kind {
            PartKind::Path => &self.path,
            PartKind::Query => &self.query,
            PartKind::Header => &self.headers,
            PartKind::Cookie => &self.cookies,
            PartKind::Form => &self.form,
            PartKind::Body => &[],
        }
    }

    fn opaque(&self, kind: PartKind) -> &[String] {
        match kind {
            PartKind::Header => &self.opaque_headers,
            _ => &[],
        }
    }
}

/// Parse an `application/x-www-form-urlencoded` payload into key-value pairs.
pub fn parse_pairs(input: Option<&[u8]>) -> Vec<(String, String)> {
    match input {
        Some(q) => form_urlencoded::parse(q)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect(),
        None => Vec::new(),
    }
}

/// Split every `Cookie` header into name-value pairs.
pub fn parse_cookies(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|line| line.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            Some((name.trim().to_string(), value.trim().trim_matches('"').to_string()))
        })
        .collect()
}

/// Bind all six parts, aggregating every violation before failing.
pub fn bind<H, C, P, Q, F, B>(
    schemas: &PartSchemas,
    raw: &RawRequest,
) -> Result<Validated<H::Output, C::Output, P::Output, Q::Output, F::Output, B::Output>, ValidationFailure>
where
    H: PartSlot,
    C: PartSlot,
    P: PartSlot,
    Q: PartSlot,
    F: PartSlot,
    B: PartSlot,
{
    let path = P::bind(PartKind::Path, schemas.get(PartKind::Path), raw);
    let query = Q::bind(PartKind::Query, schemas.get(PartKind::Query), raw);
    let header = H::bind(PartKind::Header, schemas.get(PartKind::Header), raw);
    let cookie = C::bind(PartKind::Cookie, schemas.get(PartKind::Cookie), raw);
    let form = F::bind(PartKind::Form, schemas.get(PartKind::Form), raw);
    let body = B::bind(PartKind::Body, schemas.get(PartKind::Body), raw);

    match (path, query, header, cookie, form, body) {
        (Ok(path), Ok(query), Ok(header), Ok(cookie), Ok(form), Ok(body)) => Ok(Validated {
            header,
            cookie,
            path,
            query,
            form,
            body,
        }),
        (path, query, header, cookie, form, body) => {
            let mut violations = Vec::new();
            violations.extend(path.err().unwrap_or_default());
            violations.extend(query.err().unwrap_or_default());
            violations.extend(header.err().unwrap_or_default());
            violations.extend(cookie.err().unwrap_or_default());
            violations.extend(form.err().unwrap_or_default());
            violations.extend(body.err().unwrap_or_default());
            Err(ValidationFailure::new(violations))
        }
    }
}

/// Extract, coerce, deserialize and validate one part.
pub fn bind_part<T>(
    kind: PartKind,
    descriptor: &SchemaDescriptor,
    raw: &RawRequest,
) -> Result<T, Vec<Violation>>
where
    T: Model,
    T::Context: Default,
{
    let input = match kind {
        PartKind::Body => collect_body(descriptor, &raw.body)?,
        _ => collect_pairs(kind, descriptor, raw.pairs(kind), raw.opaque(kind))?,
    };

    let value: T = serde_json::from_value(input.clone()).map_err(|err| {
        vec![Violation::new(kind, "$", "invalid_structure", err.to_string(), input.clone())]
    })?;

    value
        .validate()
        .map_err(|report| convert_garde_report(kind, &report, &input))?;

    Ok(value)
}

/// Build the input object of a string-sourced part from its declared fields only.
fn collect_pairs(
    kind: PartKind,
    descriptor: &SchemaDescriptor,
    pairs: &[(String, String)],
    opaque: &[String],
) -> Result<Value, Vec<Violation>> {
    let mut object = Map::new();
    let mut violations = Vec::new();

    for field in descriptor.fields() {
        let values: Vec<&str> = pairs
            .iter()
            .filter(|(name, _)| matches_name(kind, name, &field.name))
            .map(|(_, value)| value.as_str())
            .collect();

        let raw = match (&field.field_type, values.as_slice()) {
            (_, []) => {
                if opaque.iter().any(|name| matches_name(kind, name, &field.name)) {
                    violations.push(Violation::new(
                        kind,
                        &field.name,
                        "type_error",
                        "value is not valid UTF-8",
                        Value::String("<opaque bytes>".to_string()),
                    ));
                } else if field.required {
                    violations.push(Violation::missing(kind, &field.name));
                }
                continue;
            }
            (FieldType::Array(_), many) => {
                Value::Array(many.iter().map(|v| Value::String(v.to_string())).collect())
            }
            (_, [first, ..]) => Value::String(first.to_string()),
        };

        match coerce(kind, field, raw) {
            Ok(value) => {
                object.insert(field.name.clone(), value);
            }
            Err(violation) => violations.push(violation),
        }
    }

    if violations.is_empty() {
        Ok(Value::Object(object))
    } else {
        Err(violations)
    }
}

/// Coerce the declared members of a JSON body; undeclared members pass through.
fn collect_body(descriptor: &SchemaDescriptor, body: &RawBody) -> Result<Value, Vec<Violation>> {
    let kind = PartKind::Body;
    let mut object = match body {
        RawBody::Empty => Map::new(),
        RawBody::Malformed(message) => {
            return Err(vec![Violation::new(kind, "$", "invalid_json", message.clone(), Value::Null)]);
        }
        RawBody::Json(Value::Object(object)) => object.clone(),
        // Non-object payloads (arrays, scalars) are left to the model to accept.
        RawBody::Json(other) if descriptor.fields().is_empty() => return Ok(other.clone()),
        RawBody::Json(other) => {
            return Err(vec![Violation::new(
                kind,
                "$",
                "type_error",
                "expected a JSON object",
                other.clone(),
            )]);
        }
    };

    let mut violations = Vec::new();
    for field in descriptor.fields() {
        match object.remove(&field.name) {
            None => {
                if field.required {
                    violations.push(Violation::missing(kind, &field.name));
                }
            }
            Some(raw) => match coerce(kind, field, raw) {
                Ok(value) => {
                    object.insert(field.name.clone(), value);
                }
                Err(violation) => violations.push(violation),
            },
        }
    }

    if violations.is_empty() {
        Ok(Value::Object(object))
    } else {
        Err(violations)
    }
}

/// Header names compare case-insensitively with `_` and `-` treated alike.
fn matches_name(kind: PartKind, raw: &str, field: &str) -> bool {
    match kind {
        PartKind::Header => {
            raw.len() == field.len()
                && raw
                    .bytes()
                    .zip(field.bytes())
                    .all(|(a, b)| normalize_header_byte(a) == normalize_header_byte(b))
        }
        _ => raw == field,
    }
}

fn normalize_header_byte(b: u8) -> u8 {
    if b == b'_' { b'-' } else { b.to_ascii_lowercase() }
}

fn coerce(kind: PartKind, field: &FieldDescriptor, raw: Value) -> Result<Value, Violation> {
    if raw.is_null() {
        return if field.nullable || matches!(field.field_type, FieldType::Any) {
            Ok(Value::Null)
        } else {
            Err(type_error(kind, &field.name, &field.field_type, raw))
        };
    }
    let value = coerce_value(&field.field_type, raw.clone())
        .ok_or_else(|| type_error(kind, &field.name, &field.field_type, raw.clone()))?;
    match out_of_range(&field.schema, &value) {
        Some(format) => Err(Violation::new(
            kind,
            &field.name,
            "type_error",
            format!("value is not a valid {format} integer"),
            raw,
        )),
        None => Ok(value),
    }
}

/// Inclusive bounds of a `schemars` integer format.
fn format_bounds(format: &str) -> Option<(i128, i128)> {
    let bounds = match format {
        "int8" => (i8::MIN.into(), i8::MAX.into()),
        "int16" => (i16::MIN.into(), i16::MAX.into()),
        "int32" => (i32::MIN.into(), i32::MAX.into()),
        "int64" => (i64::MIN.into(), i64::MAX.into()),
        "uint8" => (0, u8::MAX.into()),
        "uint16" => (0, u16::MAX.into()),
        "uint32" => (0, u32::MAX.into()),
        "uint" | "uint64" => (0, u64::MAX.into()),
        _ => return None,
    };
    Some(bounds)
}

/// The declared format a coerced integer (or array item) does not fit in.
fn out_of_range<'a>(schema: &'a Value, value: &Value) -> Option<&'a str> {
    match value {
        Value::Number(n) => {
            let format = schema.get("format").and_then(Value::as_str)?;
            let (min, max) = format_bounds(format)?;
            let n = n
                .as_i64()
                .map(i128::from)
                .or_else(|| n.as_u64().map(i128::from))?;
            (n < min || n > max).then_some(format)
        }
        Value::Array(items) => {
            let item = schema.get("items")?;
            items.iter().find_map(|v| out_of_range(item, v))
        }
        _ => None,
    }
}

fn type_error(kind: PartKind, field: &str, expected: &FieldType, raw: Value) -> Violation {
    Violation::new(
        kind,
        field,
        "type_error",
        format!("value is not {}", expected.expected()),
        raw,
    )
}

fn coerce_value(ty: &FieldType, value: Value) -> Option<Value> {
    match (ty, value) {
        (FieldType::Any | FieldType::Object, value) => Some(value),
        (FieldType::Integer, Value::Number(n)) if n.is_i64() || n.is_u64() => Some(Value::Number(n)),
        (FieldType::Integer, Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .map(Number::from)
                .or_else(|_| s.parse::<u64>().map(Number::from))
                .ok()
                .map(Value::Number)
        }
        (FieldType::Number, Value::Number(n)) => Some(Value::Number(n)),
        (FieldType::Number, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        (FieldType::Boolean, Value::Bool(b)) => Some(Value::Bool(b)),
        (FieldType::Boolean, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(Value::Bool(true)),
            "false" | "0" | "no" | "off" => Some(Value::Bool(false)),
            _ => None,
        },
        (FieldType::String, Value::String(s)) => Some(Value::String(s)),
        (FieldType::Array(item), Value::Array(items)) => items
            .into_iter()
            .map(|v| coerce_value(item, v))
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        (FieldType::Array(item), scalar) => coerce_value(item, scalar).map(|v| Value::Array(vec![v])),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HeaderValue;
    use serde_json::json;

    fn field(name: &str, field_type: FieldType) -> FieldDescriptor {
        FieldDescriptor {
            name: name.to_string(),
            field_type,
            required: true,
            nullable: false,
            default: None,
            constraints: Default::default(),
            description: None,
            example: None,
            schema: json!({}),
        }
    }

    #[test]
    fn coerces_strings_to_declared_types() {
        assert_eq!(coerce_value(&FieldType::Integer, json!("42")), Some(json!(42)));
        assert_eq!(coerce_value(&FieldType::Integer, json!("4.2")), None);
        assert_eq!(coerce_value(&FieldType::Number, json!("4.5")), Some(json!(4.5)));
        assert_eq!(coerce_value(&FieldType::Boolean, json!("on")), Some(json!(true)));
        assert_eq!(coerce_value(&FieldType::Boolean, json!("maybe")), None);
        assert_eq!(coerce_value(&FieldType::String, json!(3)), None);
        assert_eq!(
            coerce_value(&FieldType::Array(Box::new(FieldType::Integer)), json!(["1", "2"])),
            Some(json!([1, 2]))
        );
        assert_eq!(
            coerce_value(&FieldType::Array(Box::new(FieldType::Integer)), json!("7")),
            Some(json!([7]))
        );
    }

    #[test]
    fn null_only_for_nullable_fields() {
        let mut f = field("age", FieldType::Integer);
        assert!(coerce(PartKind::Body, &f, Value::Null).is_err());
        f.nullable = true;
        assert_eq!(coerce(PartKind::Body, &f, Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn type_error_carries_raw_value() {
        let err = coerce(PartKind::Path, &field("bid", FieldType::Integer), json!("abc")).unwrap_err();
        assert_eq!(err.location, PartKind::Path);
        assert_eq!(err.field, "bid");
        assert_eq!(err.code, "type_error");
        assert_eq!(err.value, json!("abc"));
    }

    #[test]
    fn narrow_integer_formats_are_enforced() {
        let mut f = field("bid", FieldType::Integer);
        f.schema = json!({"type": "integer", "format": "uint32", "minimum": 0});
        let err = coerce(PartKind::Path, &f, json!("-1")).unwrap_err();
        assert_eq!(err.field, "bid");
        assert_eq!(err.code, "type_error");
        assert_eq!(err.value, json!("-1"));
        assert_eq!(coerce(PartKind::Path, &f, json!("4294967295")).unwrap(), json!(4294967295u64));

        let mut f = field("ids", FieldType::Array(Box::new(FieldType::Integer)));
        f.schema = json!({"type": "array", "items": {"type": "integer", "format": "int8"}});
        assert!(coerce(PartKind::Query, &f, json!(["1", "300"])).is_err());
        assert_eq!(coerce(PartKind::Query, &f, json!(["1", "-128"])).unwrap(), json!([1, -128]));
    }

    #[test]
    fn unreadable_header_is_a_type_error() {
        let mut headers = HeaderMap::new();
        headers.insert("x-token", HeaderValue::from_bytes(&[0xFF, 0xFE]).unwrap());
        let raw = RawRequest::from_head(vec![], None, &headers, None);
        assert!(raw.headers.is_empty());
        assert_eq!(raw.opaque_headers, vec!["x-token".to_string()]);

        let desc = SchemaDescriptor::from_schema(
            "Token",
            "Token",
            json!({
                "type": "object",
                "properties": {"x_token": {"type": "string"}},
                "required": ["x_token"]
            }),
        );
        let violations =
            collect_pairs(PartKind::Header, &desc, raw.pairs(PartKind::Header), raw.opaque(PartKind::Header))
                .unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "x_token");
        assert_eq!(violations[0].code, "type_error");
        assert_eq!(violations[0].value, json!("<opaque bytes>"));
    }

    #[test]
    fn header_names_match_loosely() {
        assert!(matches_name(PartKind::Header, "x-api-key", "X_Api_Key"));
        assert!(!matches_name(PartKind::Header, "x-api-keys", "x_api_key"));
        assert!(!matches_name(PartKind::Query, "X_Api_Key", "x_api_key"));
    }

    #[test]
    fn cookies_from_all_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("a=1; b=\"two\""));
        headers.append(COOKIE, HeaderValue::from_static("c=3"));
        let cookies = parse_cookies(&headers);
        assert_eq!(
            cookies,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "two".to_string()),
                ("c".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn raw_body_from_content_type() {
        let mut headers = HeaderMap::new();
        headers.insert(crate::http::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let raw = RawRequest::from_head(vec![], Some("a=1&a=2"), &headers, Some(&Bytes::from("{\"x\":1}")));
        assert_eq!(raw.body, RawBody::Json(json!({"x": 1})));
        assert_eq!(raw.query.len(), 2);

        let raw = RawRequest::from_head(vec![], None, &headers, Some(&Bytes::from("{oops")));
        assert!(matches!(raw.body, RawBody::Malformed(_)));

        headers.insert(
            crate::http::CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        let raw = RawRequest::from_head(vec![], None, &headers, Some(&Bytes::from("name=bob&age=3")));
        assert_eq!(raw.body, RawBody::Empty);
        assert_eq!(raw.form[1], ("age".to_string(), "3".to_string()));
    }
}
