use std::collections::HashMap;
use std::path::Path;

use super::value::ConfigValue;
use super::ConfigError;

/// Load and parse a YAML file, flattening it into the values map. A missing
/// file is not an error.
pub(crate) fn load_yaml_file(
    path: &Path,
    values: &mut HashMap<String, ConfigValue>,
) -> Result<(), ConfigError> {
    if !path.exists() {
        return Ok(());
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))?;
    load_yaml_str(&content, values)
        .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))
}

/// Parse a YAML string and flatten it into the values map.
pub(crate) fn load_yaml_str(
    content: &str,
    values: &mut HashMap<String, ConfigValue>,
) -> Result<(), ConfigError> {
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|e| ConfigError::Load(e.to_string()))?;
    flatten_yaml("", &yaml, values);
    Ok(())
}

/// Flatten a YAML tree into dot-separated keys.
///
/// Sequences are stored whole under their key and element by element under
/// `key.0`, `key.1`, ...
pub(crate) fn flatten_yaml(
    prefix: &str,
    value: &serde_yaml::Value,
    out: &mut HashMap<String, ConfigValue>,
) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    other => ConfigValue::from_yaml(other).to_string(),
                };
                let full_key = if prefix.is_empty() {
                    key
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_yaml(&full_key, v, out);
            }
        }
        serde_yaml::Value::Sequence(seq) if !prefix.is_empty() => {
            out.insert(
                prefix.to_string(),
                ConfigValue::List(seq.iter().map(ConfigValue::from_yaml).collect()),
            );
            for (i, item) in seq.iter().enumerate() {
                flatten_yaml(&format!("{prefix}.{i}"), item, out);
            }
        }
        serde_yaml::Value::Sequence(_) => {}
        leaf => {
            if !prefix.is_empty() {
                out.insert(prefix.to_string(), ConfigValue::from_yaml(leaf));
            }
        }
    }
}

/// Overlay environment variables onto the values map.
///
/// `OPENAPI_TITLE` overrides `openapi.title`. A variable whose dotted form
/// matches an existing key with underscores (`OPENAPI_DOC_PREFIX` and
/// `openapi.doc_prefix`) overrides that key.
pub(crate) fn overlay_env(
    vars: impl IntoIterator<Item = (String, String)>,
    values: &mut HashMap<String, ConfigValue>,
) {
    let known: HashMap<String, String> = values
        .keys()
        .map(|k| (k.replace('_', "."), k.clone()))
        .collect();

    for (env_key, env_val) in vars {
        let dotted = env_key.to_lowercase().replace('_', ".");
        let key = known.get(&dotted).cloned().unwrap_or(dotted);
        values.insert(key, ConfigValue::String(env_val));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_nested_maps_and_lists() {
        let mut values = HashMap::new();
        load_yaml_str(
            "openapi:\n  title: Books\n  servers:\n    - http://a\n    - http://b\n",
            &mut values,
        )
        .unwrap();

        assert!(matches!(values.get("openapi.title"), Some(ConfigValue::String(s)) if s == "Books"));
        assert!(matches!(values.get("openapi.servers"), Some(ConfigValue::List(l)) if l.len() == 2));
        assert!(matches!(values.get("openapi.servers.1"), Some(ConfigValue::String(s)) if s == "http://b"));
    }

    #[test]
    fn env_matches_underscored_keys() {
        let mut values = HashMap::new();
        load_yaml_str("openapi:\n  doc_prefix: /docs\n", &mut values).unwrap();
        overlay_env(
            [
                ("OPENAPI_DOC_PREFIX".to_string(), "/api-docs".to_string()),
                ("APP_BODY_LIMIT".to_string(), "1024".to_string()),
            ],
            &mut values,
        );

        assert!(matches!(values.get("openapi.doc_prefix"), Some(ConfigValue::String(s)) if s == "/api-docs"));
        assert!(matches!(values.get("app.body.limit"), Some(ConfigValue::String(s)) if s == "1024"));
    }
}
