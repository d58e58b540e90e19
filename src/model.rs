//! Resolved project configuration
//!
//! The strongly-typed configuration handed to the generator. Every field
//! except `metadata.name` carries a built-in default, so a partial tree
//! materializes into a fully-populated value.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{get_path, strip_nulls};
use crate::ResolveError;

/// Placeholder replaced with the literal project name
pub const PROJECT_NAME_PLACEHOLDER: &str = "__PROJECT_NAME__";

/// Placeholder replaced with the derived package name
pub const PACKAGE_NAME_PLACEHOLDER: &str = "__PACKAGE_NAME__";

/// A string did not name any variant of a configuration enum
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} '{value}', expected one of: {}", expected.join(", "))]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static [&'static str],
}

/// Declares a lowercase string enum with `VALUES`, `as_str`, `Display` and `FromStr`.
macro_rules! config_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal, default = $default:ident {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Accepted spellings, in declaration order
            pub const VALUES: &'static [&'static str] = &[$($text),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err(ParseEnumError {
                        kind: $kind,
                        value: s.to_string(),
                        expected: Self::VALUES,
                    }),
                }
            }
        }
    };
}

config_enum! {
    /// Project directory layout
    LayoutStyle, "layout", default = Src {
        Src => "src",
        Flat => "flat",
    }
}

config_enum! {
    /// Typing strictness
    TypingLevel, "typing level", default = Strict {
        None => "none",
        Basic => "basic",
        Strict => "strict",
    }
}

config_enum! {
    TestingFramework, "testing framework", default = Pytest {
        Pytest => "pytest",
        Unittest => "unittest",
        None => "none",
    }
}

config_enum! {
    /// Formatting/linting tool
    FormattingTool, "formatter", default = Ruff {
        Ruff => "ruff",
        Black => "black",
        None => "none",
    }
}

config_enum! {
    TypeChecker, "type checker", default = Mypy {
        Mypy => "mypy",
        Pyright => "pyright",
        Ty => "ty",
        None => "none",
    }
}

config_enum! {
    /// Package manager used for new projects
    CreationPackageManager, "package manager", default = Poetry {
        Poetry => "poetry",
        Uv => "uv",
    }
}

config_enum! {
    ContainerRuntime, "container runtime", default = Docker {
        Docker => "docker",
        Podman => "podman",
    }
}

config_enum! {
    DocumentationTool, "documentation tool", default = None {
        Sphinx => "sphinx",
        Mkdocs => "mkdocs",
        None => "none",
    }
}

config_enum! {
    /// Coverage reporting service
    CoverageTool, "coverage tool", default = None {
        Codecov => "codecov",
        None => "none",
    }
}

config_enum! {
    DependabotSchedule, "dependabot schedule", default = Weekly {
        Daily => "daily",
        Weekly => "weekly",
        Monthly => "monthly",
    }
}

/// Project metadata (mirrors `pyproject.toml`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Metadata {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default = "default_readme")]
    pub readme: String,
    /// Minimum Python version
    #[serde(default = "default_python_version")]
    pub python_version: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub classifiers: Vec<String>,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

fn default_readme() -> String {
    "README.md".to_string()
}

fn default_python_version() -> String {
    "3.11".to_string()
}

/// A file to create in the new project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FileTemplate {
    /// Relative path within the project
    pub path: String,
    /// Template name to render
    #[serde(default)]
    pub template: Option<String>,
    /// Inline content, used when no template is named
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub executable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DirectoryStructure {
    pub directories: Vec<String>,
    pub files: Vec<FileTemplate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Dependencies {
    pub main: Vec<String>,
    pub dev: Vec<String>,
    /// Optional dependency groups
    pub optional: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CoverageConfig {
    pub enabled: bool,
    pub tool: CoverageTool,
    /// Minimum coverage percentage
    pub threshold: Option<u32>,
    pub ignore_patterns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct TestingConfig {
    pub enabled: bool,
    pub framework: TestingFramework,
    pub coverage_config: CoverageConfig,
}

impl Default for TestingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            framework: TestingFramework::default(),
            coverage_config: CoverageConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct FormattingConfig {
    pub enabled: bool,
    pub tool: FormattingTool,
    pub line_length: u32,
    /// Radon complexity checking
    pub radon: bool,
    pub pre_commit: bool,
    /// bump-my-version integration
    pub version_bumping: bool,
    pub type_checker: TypeChecker,
}

impl Default for FormattingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tool: FormattingTool::default(),
            line_length: 100,
            radon: false,
            pre_commit: false,
            version_bumping: false,
            type_checker: TypeChecker::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DependabotConfig {
    pub enabled: bool,
    pub schedule: DependabotSchedule,
    pub open_pull_requests_limit: u32,
}

impl Default for DependabotConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            schedule: DependabotSchedule::default(),
            open_pull_requests_limit: 5,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DockerConfig {
    pub enabled: bool,
    /// Explicit base image; derived from the Python version when unset
    pub base_image: Option<String>,
    pub devcontainer: bool,
    pub container_runtime: ContainerRuntime,
}

impl DockerConfig {
    /// The configured base image, or the slim image for `python_version`.
    pub fn resolved_base_image(&self, python_version: &str) -> String {
        match &self.base_image {
            Some(image) if !image.is_empty() => image.clone(),
            _ => format!("python:{}-slim", python_version),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DocumentationConfig {
    pub enabled: bool,
    pub tool: DocumentationTool,
    /// Publish docs to GitHub Pages from CI
    pub deploy_gh_pages: bool,
}

/// Multi-environment test matrix
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ToxConfig {
    pub enabled: bool,
}

/// Console script entry point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EntryPoint {
    pub name: String,
    /// Module path, e.g. `mypackage.cli:app`
    pub module: String,
}

/// Fully materialized project configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ResolvedConfig {
    pub metadata: Metadata,
    #[serde(default)]
    pub structure: DirectoryStructure,
    #[serde(default)]
    pub dependencies: Dependencies,
    #[serde(default)]
    pub testing: TestingConfig,
    #[serde(default)]
    pub formatting: FormattingConfig,
    #[serde(default)]
    pub dependabot: DependabotConfig,
    #[serde(default)]
    pub docker: DockerConfig,
    #[serde(default)]
    pub documentation: DocumentationConfig,
    #[serde(default)]
    pub tox: ToxConfig,
    #[serde(default)]
    pub typing_level: TypingLevel,
    #[serde(default)]
    pub layout: LayoutStyle,
    #[serde(default)]
    pub package_manager: CreationPackageManager,
    #[serde(default)]
    pub entry_points: Vec<EntryPoint>,
    /// Free-form settings passed through to templates
    #[serde(default)]
    pub extras: BTreeMap<String, Value>,
}

impl ResolvedConfig {
    /// Materialize a merged tree.
    ///
    /// Strips `null` keys, checks required fields, then fills every absent
    /// field with its built-in default.
    pub fn from_tree(tree: Value) -> Result<Self, ResolveError> {
        let tree = strip_nulls(tree);

        let has_name = get_path(&tree, &["metadata", "name"])
            .and_then(Value::as_str)
            .is_some_and(|name| !name.is_empty());
        if !has_name {
            return Err(ResolveError::MissingRequiredField("metadata.name".to_string()));
        }

        serde_json::from_value(tree).map_err(ResolveError::InvalidConfig)
    }

    /// Serialize back into an untyped tree.
    pub fn to_tree(&self) -> Result<Value, ResolveError> {
        serde_json::to_value(self).map_err(|e| ResolveError::Serialize(e.to_string()))
    }

    /// Importable package name derived from the project name.
    pub fn package_name(&self) -> String {
        package_name_for(&self.metadata.name)
    }
}

/// Derive the importable package name: `my-tool` -> `my_tool`.
pub fn package_name_for(project_name: &str) -> String {
    project_name.replace('-', "_")
}

/// Substitute name placeholders in every string field of every entry point.
pub fn replace_placeholders(mut tree: Value, project_name: &str, package_name: &str) -> Value {
    if let Some(Value::Array(entry_points)) = tree.get_mut("entry_points") {
        for entry in entry_points.iter_mut() {
            let Value::Object(fields) = entry else {
                continue;
            };
            for value in fields.values_mut() {
                if let Value::String(s) = value {
                    *s = s
                        .replace(PROJECT_NAME_PLACEHOLDER, project_name)
                        .replace(PACKAGE_NAME_PLACEHOLDER, package_name);
                }
            }
        }
    }
    tree
}

/// Draft-07 JSON Schema for [`ResolvedConfig`], for preset authoring tools.
pub fn resolved_config_schema() -> Value {
    let schema = schemars::schema_for!(ResolvedConfig);
    let mut value = serde_json::to_value(schema).unwrap_or(Value::Null);
    if let Value::Object(map) = &mut value {
        map.insert(
            "$schema".to_string(),
            Value::String("http://json-schema.org/draft-07/schema#".to_string()),
        );
        map.insert(
            "title".to_string(),
            Value::String("presetkit resolved configuration".to_string()),
        );
        map.insert(
            "description".to_string(),
            Value::String("Shape of a fully resolved project configuration".to_string()),
        );
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_tree_gets_defaults() {
        let config = ResolvedConfig::from_tree(json!({"metadata": {"name": "demo"}})).unwrap();

        assert_eq!(config.metadata.version, "0.1.0");
        assert_eq!(config.metadata.python_version, "3.11");
        assert!(config.testing.enabled);
        assert_eq!(config.testing.framework, TestingFramework::Pytest);
        assert_eq!(config.formatting.line_length, 100);
        assert_eq!(config.formatting.type_checker, TypeChecker::Mypy);
        assert_eq!(config.dependabot.open_pull_requests_limit, 5);
        assert!(!config.docker.enabled);
        assert_eq!(config.documentation.tool, DocumentationTool::None);
        assert_eq!(config.typing_level, TypingLevel::Strict);
        assert_eq!(config.layout, LayoutStyle::Src);
        assert_eq!(config.package_manager, CreationPackageManager::Poetry);
    }

    #[test]
    fn test_nulls_are_stripped_before_defaults() {
        let config = ResolvedConfig::from_tree(json!({
            "metadata": {"name": "demo", "version": null},
            "testing": {"enabled": null, "framework": "unittest"},
            "layout": null
        }))
        .unwrap();

        assert_eq!(config.metadata.version, "0.1.0");
        assert!(config.testing.enabled);
        assert_eq!(config.testing.framework, TestingFramework::Unittest);
        assert_eq!(config.layout, LayoutStyle::Src);
    }

    #[test]
    fn test_missing_name_is_rejected() {
        let err = ResolvedConfig::from_tree(json!({"metadata": {"version": "1.0"}})).unwrap_err();
        assert!(matches!(err, ResolveError::MissingRequiredField(ref f) if f == "metadata.name"));

        let err = ResolvedConfig::from_tree(json!({"metadata": {"name": ""}})).unwrap_err();
        assert!(matches!(err, ResolveError::MissingRequiredField(_)));
    }

    #[test]
    fn test_invalid_enum_value_is_rejected() {
        let err = ResolvedConfig::from_tree(json!({
            "metadata": {"name": "demo"},
            "layout": "nested"
        }))
        .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidConfig(_)));
    }

    #[test]
    fn test_rematerialize_is_identity() {
        let config = ResolvedConfig::from_tree(json!({
            "metadata": {"name": "demo", "license": "MIT"},
            "entry_points": [{"name": "demo", "module": "demo.cli:main"}],
            "extras": {"badge": true}
        }))
        .unwrap();

        let again = ResolvedConfig::from_tree(config.to_tree().unwrap()).unwrap();
        assert_eq!(again, config);
    }

    #[test]
    fn test_replace_placeholders_only_in_entry_points() {
        let tree = json!({
            "metadata": {"description": "__PROJECT_NAME__ tool"},
            "entry_points": [
                {"name": "__PROJECT_NAME__", "module": "__PACKAGE_NAME__.cli:app"}
            ]
        });
        let tree = replace_placeholders(tree, "my-tool", "my_tool");

        assert_eq!(tree["entry_points"][0]["name"], "my-tool");
        assert_eq!(tree["entry_points"][0]["module"], "my_tool.cli:app");
        assert_eq!(tree["metadata"]["description"], "__PROJECT_NAME__ tool");
    }

    #[test]
    fn test_enum_from_str() {
        assert_eq!("flat".parse::<LayoutStyle>(), Ok(LayoutStyle::Flat));
        let err = "conda".parse::<CreationPackageManager>().unwrap_err();
        assert_eq!(err.expected, &["poetry", "uv"]);
        assert!(err.to_string().contains("conda"));
    }

    #[test]
    fn test_docker_base_image() {
        let docker = DockerConfig::default();
        assert_eq!(docker.resolved_base_image("3.12"), "python:3.12-slim");

        let docker = DockerConfig {
            base_image: Some("ghcr.io/acme/python:3.12".to_string()),
            ..Default::default()
        };
        assert_eq!(docker.resolved_base_image("3.12"), "ghcr.io/acme/python:3.12");
    }

    #[test]
    fn test_schema_is_draft_07() {
        let schema = resolved_config_schema();
        assert_eq!(schema["$schema"], "http://json-schema.org/draft-07/schema#");
        assert!(schema["properties"]["metadata"].is_object());
        let required = schema["required"].as_array().unwrap();
        assert!(required.contains(&json!("metadata")));
    }
}
