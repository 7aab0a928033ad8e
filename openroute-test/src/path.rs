use serde_json::Value;

static NULL: Value = Value::Null;

/// One step of a JSON path such as `details[0].field` or `paths.len()`.
#[derive(Debug, Clone, PartialEq)]
pub enum PathToken {
    Field(String),
    Index(usize),
    Len,
}

/// Split a dotted JSON path into tokens.
///
/// Keys containing dots or slashes (OpenAPI paths, media types) can be
/// written in quotes: `paths."/book/{bid}".put`.
pub fn tokenize_path(path: &str) -> Vec<PathToken> {
    let mut tokens = Vec::new();
    for segment in split_segments(path) {
        if segment.is_empty() {
            continue;
        }
        if let Some(quoted) = segment.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
            tokens.push(PathToken::Field(quoted.to_string()));
            continue;
        }
        if segment == "len()" {
            tokens.push(PathToken::Len);
            continue;
        }
        match segment.find('[') {
            Some(bracket) => {
                if bracket > 0 {
                    tokens.push(PathToken::Field(segment[..bracket].to_string()));
                }
                let mut rest = &segment[bracket..];
                while let Some(start) = rest.find('[') {
                    let end = rest.find(']').expect("unclosed bracket in JSON path");
                    let index = rest[start + 1..end]
                        .parse()
                        .expect("non-numeric array index in JSON path");
                    tokens.push(PathToken::Index(index));
                    rest = &rest[end + 1..];
                }
            }
            None => tokens.push(PathToken::Field(segment.to_string())),
        }
    }
    tokens
}

fn split_segments(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for c in path.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                current.push(c);
            }
            '.' if !quoted => segments.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    segments.push(current);
    segments
}

/// Resolve `path` against `root`; missing keys resolve to `null`.
pub fn resolve_path(root: &Value, path: &str) -> Value {
    let mut current = root;
    let mut len_holder;
    for token in tokenize_path(path) {
        current = match token {
            PathToken::Field(name) => current.get(&name).unwrap_or(&NULL),
            PathToken::Index(index) => current.get(index).unwrap_or(&NULL),
            PathToken::Len => {
                let len = match current {
                    Value::Array(items) => items.len(),
                    Value::Object(map) => map.len(),
                    Value::String(s) => s.len(),
                    other => panic!("len() applied to a non-collection in \"{path}\": {other}"),
                };
                len_holder = Value::from(len);
                &len_holder
            }
        };
    }
    current.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn quoted_keys_keep_dots_and_slashes() {
        assert_eq!(
            tokenize_path(r#"paths."/api/book".post.requestBody"#),
            vec![
                PathToken::Field("paths".into()),
                PathToken::Field("/api/book".into()),
                PathToken::Field("post".into()),
                PathToken::Field("requestBody".into()),
            ]
        );
    }

    #[test]
    fn resolves_indices_and_len() {
        let value = json!({"details": [{"field": "age"}, {"field": "author"}]});
        assert_eq!(resolve_path(&value, "details[1].field"), json!("author"));
        assert_eq!(resolve_path(&value, "details.len()"), json!(2));
        assert_eq!(resolve_path(&value, "missing.key"), Value::Null);
    }
}
