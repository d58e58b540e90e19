//! User defaults layer
//!
//! A flat TOML file of personal preferences. Values only fill gaps: a key
//! already set by the preset chain is never replaced.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use super::effective::ResolveError;
use super::merge::{set_path_if_absent, toml_to_json};
use crate::model::{
    CreationPackageManager, FormattingTool, LayoutStyle, TestingFramework, TypeChecker,
    TypingLevel,
};

/// Values a user default key accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultKind {
    /// Any string
    Text,
    /// Integer in `1..=u32::MAX`
    Length,
    /// One of the listed strings
    OneOf(&'static [&'static str]),
}

impl DefaultKind {
    pub fn accepts(&self, value: &toml::Value) -> bool {
        match (self, value) {
            (Self::Text, toml::Value::String(_)) => true,
            (Self::Length, toml::Value::Integer(n)) => *n > 0 && u32::try_from(*n).is_ok(),
            (Self::OneOf(allowed), toml::Value::String(s)) => allowed.contains(&s.as_str()),
            _ => false,
        }
    }

    fn expected(&self) -> String {
        match self {
            Self::Text => "a string".to_string(),
            Self::Length => "a positive integer".to_string(),
            Self::OneOf(allowed) => allowed.join(", "),
        }
    }
}

/// A recognised flat key and where it lands in the tree
#[derive(Debug, Clone, Copy)]
pub struct UserDefaultKey {
    pub key: &'static str,
    pub path: &'static [&'static str],
    pub kind: DefaultKind,
}

pub const USER_DEFAULT_KEYS: &[UserDefaultKey] = &[
    UserDefaultKey {
        key: "python_version",
        path: &["metadata", "python_version"],
        kind: DefaultKind::Text,
    },
    UserDefaultKey {
        key: "layout",
        path: &["layout"],
        kind: DefaultKind::OneOf(LayoutStyle::VALUES),
    },
    UserDefaultKey {
        key: "typing_level",
        path: &["typing_level"],
        kind: DefaultKind::OneOf(TypingLevel::VALUES),
    },
    UserDefaultKey {
        key: "formatter",
        path: &["formatting", "tool"],
        kind: DefaultKind::OneOf(FormattingTool::VALUES),
    },
    UserDefaultKey {
        key: "line_length",
        path: &["formatting", "line_length"],
        kind: DefaultKind::Length,
    },
    UserDefaultKey {
        key: "testing_framework",
        path: &["testing", "framework"],
        kind: DefaultKind::OneOf(TestingFramework::VALUES),
    },
    UserDefaultKey {
        key: "type_checker",
        path: &["formatting", "type_checker"],
        kind: DefaultKind::OneOf(TypeChecker::VALUES),
    },
    UserDefaultKey {
        key: "package_manager",
        path: &["package_manager"],
        kind: DefaultKind::OneOf(CreationPackageManager::VALUES),
    },
];

const TEMPLATE: &str = r#"# presetkit user defaults
#
# Each value fills in a setting that the selected preset leaves unset.
# Presets and command-line flags always take precedence.

# python_version = "3.12"
# layout = "src"                # src | flat
# typing_level = "strict"       # none | basic | strict
# formatter = "ruff"            # ruff | black | none
# line_length = 100
# testing_framework = "pytest"  # pytest | unittest | none
# type_checker = "mypy"         # mypy | pyright | ty | none
# package_manager = "poetry"    # poetry | uv
"#;

/// Personal defaults loaded from the user config file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserDefaults {
    values: toml::Table,
}

impl UserDefaults {
    /// Load defaults from `path`.
    ///
    /// Never fails: a missing or unparseable file yields empty defaults, and
    /// recognised keys holding invalid values are dropped.
    pub fn load(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %e, "could not read user defaults");
                }
                return Self::default();
            }
        };

        match Self::parse(&contents) {
            Ok(defaults) => defaults,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring malformed user defaults");
                Self::default()
            }
        }
    }

    /// Parse defaults from TOML text, dropping invalid recognised keys.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        let mut values: toml::Table = toml::from_str(content)?;
        for entry in USER_DEFAULT_KEYS {
            let valid = match values.get(entry.key) {
                None => continue,
                Some(value) => entry.kind.accepts(value),
            };
            if !valid {
                if let Some(value) = values.remove(entry.key) {
                    warn!(
                        key = entry.key,
                        value = %value,
                        expected = %entry.kind.expected(),
                        "dropping invalid user default"
                    );
                }
            }
        }
        Ok(Self { values })
    }

    pub fn get(&self, key: &str) -> Option<&toml::Value> {
        self.values.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: toml::Value) {
        self.values.insert(key.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All stored keys, including ones `apply` ignores
    pub fn values(&self) -> &toml::Table {
        &self.values
    }

    /// Fill unset paths in `tree` from the recognised keys.
    pub fn apply(&self, mut tree: Value) -> Value {
        for entry in USER_DEFAULT_KEYS {
            let Some(value) = self.values.get(entry.key) else {
                continue;
            };
            if set_path_if_absent(&mut tree, entry.path, toml_to_json(value.clone())) {
                debug!(key = entry.key, "applied user default");
            }
        }
        tree
    }

    /// Write the defaults as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ResolveError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(&self.values)
            .map_err(|e| ResolveError::Serialize(e.to_string()))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Commented starter file
    pub fn template() -> &'static str {
        TEMPLATE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let defaults = UserDefaults::load(&dir.path().join("config.toml"));
        assert!(defaults.is_empty());
    }

    #[test]
    fn test_malformed_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "layout = [unclosed").unwrap();
        assert!(UserDefaults::load(&path).is_empty());
    }

    #[test]
    fn test_invalid_enum_values_are_dropped() {
        let defaults = UserDefaults::parse(
            "layout = \"nested\"\nformatter = 3\ntype_checker = \"pyright\"\nauthor = \"me\"\n",
        )
        .unwrap();

        assert!(defaults.get("layout").is_none());
        assert!(defaults.get("formatter").is_none());
        assert_eq!(defaults.get("type_checker").and_then(|v| v.as_str()), Some("pyright"));
        // Unknown keys survive but are never applied
        assert!(defaults.get("author").is_some());
        let tree = defaults.apply(json!({}));
        assert!(tree.get("author").is_none());
    }

    #[test]
    fn test_wrongly_typed_values_are_dropped() {
        let defaults = UserDefaults::parse(
            "line_length = \"wide\"\npython_version = 3.12\ntyping_level = \"basic\"\n",
        )
        .unwrap();
        assert!(defaults.get("line_length").is_none());
        assert!(defaults.get("python_version").is_none());
        assert!(defaults.get("typing_level").is_some());

        for bad in ["line_length = 0", "line_length = -5", "line_length = 5000000000"] {
            assert!(UserDefaults::parse(bad).unwrap().is_empty(), "{bad}");
        }
        let tree = UserDefaults::parse("line_length = 79").unwrap().apply(json!({}));
        assert_eq!(tree["formatting"]["line_length"], 79);
    }

    #[test]
    fn test_apply_fills_only_gaps() {
        let defaults = UserDefaults::parse(concat!(
            "python_version = \"3.12\"\n",
            "layout = \"flat\"\n",
            "line_length = 88\n",
            "formatter = \"black\"\n",
        ))
        .unwrap();

        let tree = json!({
            "layout": "src",
            "formatting": {"tool": "ruff", "line_length": null}
        });
        let tree = defaults.apply(tree);

        assert_eq!(tree["layout"], "src");
        assert_eq!(tree["formatting"]["tool"], "ruff");
        assert_eq!(tree["formatting"]["line_length"], 88);
        assert_eq!(tree["metadata"]["python_version"], "3.12");
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/config.toml");

        let mut defaults = UserDefaults::default();
        defaults.set("package_manager", toml::Value::String("uv".to_string()));
        defaults.set("line_length", toml::Value::Integer(120));
        defaults.save(&path).unwrap();

        assert_eq!(UserDefaults::load(&path), defaults);
    }

    #[test]
    fn test_template_parses_empty() {
        assert!(UserDefaults::parse(UserDefaults::template()).unwrap().is_empty());
    }
}
