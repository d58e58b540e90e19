//! Configuration merge logic
//!
//! Trees are `serde_json::Value` objects. A missing key and an explicit
//! `null` both mean "unset".
//!
//! Merge semantics:
//! - Objects: deep-merge by key
//! - Arrays: CONCATENATE (base then overlay)
//! - Scalars: override (last wins)
//! - Null: skipped (never erases a base value)

use serde_json::{Map, Value};

/// Deep merge two trees, `overlay` taking precedence.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        // Both objects: deep merge
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                if overlay_value.is_null() {
                    continue;
                }
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }

        // Arrays: extend, never replace
        (Value::Array(mut base_items), Value::Array(overlay_items)) => {
            base_items.extend(overlay_items);
            Value::Array(base_items)
        }

        (base, Value::Null) => base,

        // Scalars and mismatched shapes: overlay wins
        (_, overlay) => overlay,
    }
}

/// Merge multiple layers in order (first is base, last has highest precedence)
pub fn merge_layers(layers: Vec<Value>) -> Value {
    layers
        .into_iter()
        .fold(Value::Object(Map::new()), deep_merge)
}

/// Recursively drop every `null`-valued key.
///
/// Descends into objects and into objects held in arrays. Array elements
/// themselves are never removed.
pub fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}

/// Read a nested value by path.
pub fn get_path<'a>(tree: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(tree, |node, key| node.get(*key))
}

/// Write a nested value, replacing whatever is there.
///
/// Intermediate keys that are missing or not objects become empty objects.
pub fn set_path(tree: &mut Value, path: &[&str], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };
    let mut node = tree;
    for key in parents {
        node = object_mut(node)
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    object_mut(node).insert(last.to_string(), value);
}

/// Write a nested value only when it is missing or `null`.
///
/// Returns whether the value was written.
pub fn set_path_if_absent(tree: &mut Value, path: &[&str], value: Value) -> bool {
    match get_path(tree, path) {
        Some(existing) if !existing.is_null() => false,
        _ => {
            set_path(tree, path, value);
            true
        }
    }
}

/// Append items to the array at `path`, creating it when absent.
pub fn extend_path(tree: &mut Value, path: &[&str], items: impl IntoIterator<Item = Value>) {
    let mut current = match get_path(tree, path) {
        Some(Value::Array(existing)) => existing.clone(),
        _ => Vec::new(),
    };
    current.extend(items);
    set_path(tree, path, Value::Array(current));
}

fn object_mut(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just made an object"),
    }
}

/// Convert a TOML value into the untyped tree representation.
pub fn toml_to_json(toml: toml::Value) -> Value {
    match toml {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(arr) => Value::Array(arr.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_override() {
        let base = json!({"line_length": 100});
        let overlay = json!({"line_length": 88});
        let result = deep_merge(base, overlay);
        assert_eq!(result["line_length"], 88);
    }

    #[test]
    fn test_object_deep_merge() {
        let base = json!({
            "formatting": {
                "tool": "ruff",
                "line_length": 100
            }
        });
        let overlay = json!({
            "formatting": {
                "tool": "black"
            }
        });
        let result = deep_merge(base, overlay);

        assert_eq!(result["formatting"]["tool"], "black");
        assert_eq!(result["formatting"]["line_length"], 100);
    }

    #[test]
    fn test_array_concatenate() {
        let result = deep_merge(json!({"items": [1, 2, 3]}), json!({"items": [4, 5]}));
        assert_eq!(result, json!({"items": [1, 2, 3, 4, 5]}));
    }

    #[test]
    fn test_array_concatenate_keeps_duplicates() {
        let result = deep_merge(json!({"dev": ["pytest"]}), json!({"dev": ["pytest", "ruff"]}));
        assert_eq!(result["dev"], json!(["pytest", "pytest", "ruff"]));
    }

    #[test]
    fn test_null_is_skipped() {
        let result = deep_merge(json!({"a": 1}), json!({"a": null}));
        assert_eq!(result, json!({"a": 1}));

        // A null for a key the base lacks is skipped too
        let result = deep_merge(json!({"a": 1}), json!({"b": null}));
        assert_eq!(result, json!({"a": 1}));
    }

    #[test]
    fn test_disjoint_keys_union() {
        let a = json!({"x": 1, "nested": {"p": true}});
        let b = json!({"y": [2], "other": {"q": "s"}});
        let ab = deep_merge(a.clone(), b.clone());
        let ba = deep_merge(b, a);
        assert_eq!(ab, ba);
        assert_eq!(ab.as_object().unwrap().len(), 4);
    }

    #[test]
    fn test_merge_layers() {
        let builtin = json!({
            "testing": {"enabled": true},
            "dependencies": {"dev": ["pytest"]}
        });
        let parent = json!({
            "layout": "src"
        });
        let child = json!({
            "dependencies": {"dev": ["ruff"]},
            "layout": "flat"
        });

        let result = merge_layers(vec![builtin, parent, child]);

        assert_eq!(result["layout"], "flat");
        assert_eq!(result["testing"]["enabled"], true);
        assert_eq!(result["dependencies"]["dev"], json!(["pytest", "ruff"]));
    }

    #[test]
    fn test_strip_nulls_recursive_and_idempotent() {
        let tree = json!({
            "a": null,
            "b": {"c": null, "d": 1},
            "e": [{"name": "x", "module": null}, null]
        });
        let stripped = strip_nulls(tree);
        assert_eq!(
            stripped,
            json!({"b": {"d": 1}, "e": [{"name": "x"}, null]})
        );
        assert_eq!(strip_nulls(stripped.clone()), stripped);
    }

    #[test]
    fn test_set_path_creates_parents() {
        let mut tree = json!({"testing": null});
        set_path(&mut tree, &["testing", "coverage_config", "enabled"], json!(true));
        assert_eq!(tree, json!({"testing": {"coverage_config": {"enabled": true}}}));
    }

    #[test]
    fn test_set_path_if_absent() {
        let mut tree = json!({"formatting": {"tool": "black", "line_length": null}});
        assert!(!set_path_if_absent(&mut tree, &["formatting", "tool"], json!("ruff")));
        assert!(set_path_if_absent(&mut tree, &["formatting", "line_length"], json!(79)));
        assert!(set_path_if_absent(&mut tree, &["layout"], json!("flat")));
        assert_eq!(tree["formatting"]["tool"], "black");
        assert_eq!(tree["formatting"]["line_length"], 79);
        assert_eq!(tree["layout"], "flat");
    }

    #[test]
    fn test_extend_path() {
        let mut tree = json!({"dependencies": {"main": ["httpx"]}});
        extend_path(&mut tree, &["dependencies", "main"], vec![json!("rich")]);
        extend_path(&mut tree, &["dependencies", "dev"], vec![json!("pytest")]);
        assert_eq!(tree["dependencies"]["main"], json!(["httpx", "rich"]));
        assert_eq!(tree["dependencies"]["dev"], json!(["pytest"]));
    }

    #[test]
    fn test_toml_to_json() {
        let toml: toml::Value = toml::from_str(
            "name = \"x\"\n[testing]\nenabled = true\n[[entry_points]]\nname = \"cli\"\n",
        )
        .unwrap();
        let json = toml_to_json(toml);
        assert_eq!(json["testing"]["enabled"], true);
        assert_eq!(json["entry_points"][0]["name"], "cli");
    }
}
