//! The components registry.
//!
//! Every schema referenced by an operation lives under
//! `#/components/schemas/<name>`. The first schema registered under a short
//! name keeps it; a later, different schema with the same name is stored as
//! `<operationId>.<Name>` and only that operation links to the renamed entry.

use std::collections::HashMap;

use openroute_core::SchemaDescriptor;
use serde_json::{Map, Value};

use crate::error::DocumentError;

const COMPONENTS: &str = "#/components/schemas/";

#[derive(Debug, Default)]
pub struct ComponentRegistry {
    schemas: Map<String, Value>,
    /// Qualified type name of each root entry; nested definitions have none.
    owners: HashMap<String, Option<String>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `descriptor` and its nested definitions, returning the
    /// component name the operation must reference.
    ///
    /// Self references (`#`) of recursive types point at the claimed name.
    pub fn register(
        &mut self,
        descriptor: &SchemaDescriptor,
        operation_id: &str,
    ) -> Result<String, DocumentError> {
        let short = descriptor.name();
        let qualified = Some(descriptor.qualified_name());

        let renames = self.plan(descriptor, operation_id, short);
        let name = if self.accepts(short, qualified, &root_content(descriptor, &renames, short)) {
            short.to_string()
        } else {
            qualify(operation_id, short)
        };

        let renames = self.plan(descriptor, operation_id, &name);
        self.insert_definitions(descriptor, &renames, &name)?;
        let schema = root_content(descriptor, &renames, &name);
        if name != short {
            tracing::warn!(
                schema = %short,
                qualified = qualified.unwrap_or_default(),
                renamed = %name,
                "Schema name collides with a different schema; renamed"
            );
        }
        self.claim(&name, qualified, schema)
    }

    /// Register only the nested definitions of `descriptor` and return
    /// `value` (a fragment of it) with references rewritten.
    ///
    /// A fragment referring back to the root type registers the root too.
    pub fn link(
        &mut self,
        descriptor: &SchemaDescriptor,
        value: &Value,
        operation_id: &str,
    ) -> Result<Value, DocumentError> {
        let refers_to_root = component_refs(value)
            .iter()
            .any(|(reference, _)| is_root_ref(reference));
        let root = if refers_to_root {
            self.register(descriptor, operation_id)?
        } else {
            descriptor.name().to_string()
        };

        let renames = self.plan(descriptor, operation_id, &root);
        self.insert_definitions(descriptor, &renames, &root)?;
        let mut value = value.clone();
        rewrite_refs(&mut value, &renames, Some(&root));
        Ok(value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schemas.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn into_schemas(self) -> Map<String, Value> {
        self.schemas
    }

    /// Decide the component name of every nested definition, given the
    /// name the root type will be stored under.
    fn plan(
        &self,
        descriptor: &SchemaDescriptor,
        operation_id: &str,
        root: &str,
    ) -> HashMap<String, String> {
        let defs = descriptor.definitions();
        let mut renames: HashMap<String, String> =
            defs.keys().map(|k| (k.clone(), k.clone())).collect();

        // Renaming one definition changes the content of those referencing
        // it, so repeat until no new collision appears.
        loop {
            let mut changed = false;
            for (name, def) in defs {
                if renames.get(name) != Some(name) {
                    continue;
                }
                let mut content = def.clone();
                rewrite_refs(&mut content, &renames, Some(root));
                if self.schemas.get(name).is_some_and(|existing| *existing != content) {
                    renames.insert(name.clone(), qualify(operation_id, name));
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        renames
    }

    fn insert_definitions(
        &mut self,
        descriptor: &SchemaDescriptor,
        renames: &HashMap<String, String>,
        root: &str,
    ) -> Result<(), DocumentError> {
        for (name, def) in descriptor.definitions() {
            let target = renames.get(name).cloned().unwrap_or_else(|| name.clone());
            let mut content = def.clone();
            rewrite_refs(&mut content, renames, Some(root));
            match self.schemas.get(&target) {
                Some(existing) if *existing == content => {}
                Some(_) => return Err(DocumentError::SchemaConflict { name: target }),
                None => {
                    if target != *name {
                        tracing::warn!(
                            schema = %name,
                            renamed = %target,
                            "Nested schema name collides with a different schema; renamed"
                        );
                    }
                    self.schemas.insert(target.clone(), content);
                    self.owners.insert(target, None);
                }
            }
        }
        Ok(())
    }

    /// Whether a root type may be stored under `name`.
    ///
    /// An entry first seen as a nested definition is adopted by the first
    /// root type with identical content.
    fn accepts(&self, name: &str, qualified: Option<&str>, content: &Value) -> bool {
        let owner = self.owners.get(name).cloned().flatten();
        match self.schemas.get(name) {
            None => true,
            Some(existing) => {
                *existing == *content && (owner.is_none() || owner.as_deref() == qualified)
            }
        }
    }

    fn claim(
        &mut self,
        name: &str,
        qualified: Option<&str>,
        content: Value,
    ) -> Result<String, DocumentError> {
        if !self.accepts(name, qualified, &content) {
            return Err(DocumentError::SchemaConflict { name: name.to_string() });
        }
        self.schemas.insert(name.to_string(), content);
        if self.owners.get(name).cloned().flatten().is_none() {
            self.owners.insert(name.to_string(), qualified.map(str::to_string));
        }
        Ok(name.to_string())
    }
}

fn root_content(descriptor: &SchemaDescriptor, renames: &HashMap<String, String>, root: &str) -> Value {
    let mut schema = descriptor.schema().clone();
    rewrite_refs(&mut schema, renames, Some(root));
    schema
}

/// `$ref` value for the component `name`.
pub fn component_ref(name: &str) -> String {
    format!("{COMPONENTS}{name}")
}

fn qualify(operation_id: &str, name: &str) -> String {
    let prefix: String = operation_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{prefix}.{name}")
}

/// Rewrite `#/$defs/X` (and legacy `#/definitions/X`) references to
/// `#/components/schemas/<renamed X>`. With a `root` name, references into
/// the root schema (`#`, `#/properties/..`) are rebased onto its component.
pub(crate) fn rewrite_refs(value: &mut Value, renames: &HashMap<String, String>, root: Option<&str>) {
    match value {
        Value::Object(obj) => {
            if let Some(Value::String(reference)) = obj.get_mut("$ref") {
                if let Some(target) = retarget(reference, renames, root) {
                    *reference = target;
                }
            }
            for (_, v) in obj.iter_mut() {
                rewrite_refs(v, renames, root);
            }
        }
        Value::Array(items) => {
            for v in items.iter_mut() {
                rewrite_refs(v, renames, root);
            }
        }
        _ => {}
    }
}

fn retarget(reference: &str, renames: &HashMap<String, String>, root: Option<&str>) -> Option<String> {
    let local = reference
        .strip_prefix("#/$defs/")
        .or_else(|| reference.strip_prefix("#/definitions/"));
    if let Some(local) = local {
        let (name, tail) = match local.find('/') {
            Some(pos) => local.split_at(pos),
            None => (local, ""),
        };
        let target = renames.get(name).map(String::as_str).unwrap_or(name);
        return Some(format!("{COMPONENTS}{target}{tail}"));
    }
    match root {
        Some(root) if is_root_ref(reference) => Some(format!("{COMPONENTS}{root}{}", &reference[1..])),
        _ => None,
    }
}

/// `#` or a pointer into the root schema itself.
fn is_root_ref(reference: &str) -> bool {
    reference == "#"
        || (reference.starts_with("#/")
            && !reference.starts_with("#/$defs/")
            && !reference.starts_with("#/definitions/")
            && !reference.starts_with("#/components/"))
}

/// Every local (`#`-prefixed) reference in `value` with its JSON pointer.
pub(crate) fn component_refs(value: &Value) -> Vec<(String, String)> {
    fn walk(value: &Value, pointer: &mut String, out: &mut Vec<(String, String)>) {
        match value {
            Value::Object(obj) => {
                if let Some(reference) = obj.get("$ref").and_then(Value::as_str) {
                    if reference.starts_with('#') {
                        out.push((reference.to_string(), pointer.clone()));
                    }
                }
                for (key, v) in obj {
                    let len = pointer.len();
                    pointer.push('/');
                    pointer.push_str(&key.replace('~', "~0").replace('/', "~1"));
                    walk(v, pointer, out);
                    pointer.truncate(len);
                }
            }
            Value::Array(items) => {
                for (i, v) in items.iter().enumerate() {
                    let len = pointer.len();
                    pointer.push_str(&format!("/{i}"));
                    walk(v, pointer, out);
                    pointer.truncate(len);
                }
            }
            _ => {}
        }
    }

    let mut out = Vec::new();
    walk(value, &mut String::new(), &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor(name: &str, qualified: &str, schema: Value) -> SchemaDescriptor {
        SchemaDescriptor::from_schema(name, qualified, schema)
    }

    #[test]
    fn same_type_registers_once() {
        let mut registry = ComponentRegistry::new();
        let book = descriptor("Book", "app::Book", json!({"type": "object"}));
        assert_eq!(registry.register(&book, "a").unwrap(), "Book");
        assert_eq!(registry.register(&book, "b").unwrap(), "Book");
        assert_eq!(registry.into_schemas().len(), 1);
    }

    #[test]
    fn same_name_different_type_is_qualified() {
        let mut registry = ComponentRegistry::new();
        let a = descriptor("Book", "v1::Book", json!({"type": "object", "properties": {"a": {}}}));
        let b = descriptor("Book", "v2::Book", json!({"type": "object", "properties": {"b": {}}}));
        assert_eq!(registry.register(&a, "get_v1_book").unwrap(), "Book");
        assert_eq!(registry.register(&b, "get_v2_book").unwrap(), "get_v2_book.Book");
        assert!(registry.contains("Book"));
        assert!(registry.contains("get_v2_book.Book"));
    }

    #[test]
    fn nested_definition_is_adopted_by_its_root_type() {
        let mut registry = ComponentRegistry::new();
        let list = descriptor(
            "Array_of_Book",
            "Vec<app::Book>",
            json!({"type": "array", "items": {"$ref": "#/$defs/Book"}, "$defs": {"Book": {"type": "object"}}}),
        );
        let book = descriptor("Book", "app::Book", json!({"type": "object"}));
        registry.register(&list, "list_books").unwrap();
        assert_eq!(registry.register(&book, "get_book").unwrap(), "Book");
        assert!(!registry.contains("get_book.Book"));
    }

    #[test]
    fn colliding_definitions_are_renamed_and_relinked() {
        let mut registry = ComponentRegistry::new();
        let a = descriptor(
            "Order",
            "a::Order",
            json!({
                "type": "object",
                "properties": {"item": {"$ref": "#/$defs/Item"}},
                "$defs": {"Item": {"type": "string"}}
            }),
        );
        let b = descriptor(
            "Cart",
            "b::Cart",
            json!({
                "type": "object",
                "properties": {"item": {"$ref": "#/$defs/Item"}},
                "$defs": {"Item": {"type": "integer"}}
            }),
        );
        registry.register(&a, "create_order").unwrap();
        registry.register(&b, "create_cart").unwrap();

        assert_eq!(registry.get("Item"), Some(&json!({"type": "string"})));
        assert_eq!(registry.get("create_cart.Item"), Some(&json!({"type": "integer"})));
        assert_eq!(
            registry.get("Cart").unwrap()["properties"]["item"]["$ref"],
            "#/components/schemas/create_cart.Item"
        );
        assert_eq!(
            registry.get("Order").unwrap()["properties"]["item"]["$ref"],
            "#/components/schemas/Item"
        );
    }

    #[test]
    fn recursive_root_refers_to_its_component() {
        let mut registry = ComponentRegistry::new();
        let node = descriptor(
            "Node",
            "tree::Node",
            json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string"},
                    "children": {"type": "array", "items": {"$ref": "#"}}
                }
            }),
        );
        assert_eq!(registry.register(&node, "get_tree").unwrap(), "Node");
        assert_eq!(
            registry.get("Node").unwrap()["properties"]["children"]["items"]["$ref"],
            "#/components/schemas/Node"
        );
    }

    #[test]
    fn renamed_recursive_root_refers_to_its_renamed_component() {
        let mut registry = ComponentRegistry::new();
        let other = descriptor("Node", "graph::Node", json!({"type": "string"}));
        let node = descriptor(
            "Node",
            "tree::Node",
            json!({
                "type": "object",
                "properties": {
                    "parent": {"$ref": "#/$defs/Parent"}
                },
                "$defs": {"Parent": {"type": "object", "properties": {"node": {"$ref": "#"}}}}
            }),
        );
        registry.register(&other, "get_graph").unwrap();
        assert_eq!(registry.register(&node, "get_tree").unwrap(), "get_tree.Node");
        assert_eq!(
            registry.get("Parent").unwrap()["properties"]["node"]["$ref"],
            "#/components/schemas/get_tree.Node"
        );
    }

    #[test]
    fn refs_are_collected_with_pointers() {
        let value = json!({"a": [{"$ref": "#/components/schemas/X"}], "b/c": {"$ref": "#/x"}});
        let refs = component_refs(&value);
        assert_eq!(
            refs,
            vec![
                ("#/components/schemas/X".to_string(), "/a/0".to_string()),
                ("#/x".to_string(), "/b~1c".to_string()),
            ]
        );
    }
}
