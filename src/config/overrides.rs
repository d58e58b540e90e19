//! Explicit overrides (highest-precedence layer)

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::merge::{extend_path, set_path};
use crate::model::{
    ContainerRuntime, CoverageTool, CreationPackageManager, DocumentationTool, LayoutStyle,
    TypeChecker, TypingLevel,
};

/// Override field name to tree path, in write order
pub const OVERRIDE_PATHS: &[(&str, &[&str])] = &[
    ("testing_enabled", &["testing", "enabled"]),
    ("formatting_enabled", &["formatting", "enabled"]),
    ("radon_enabled", &["formatting", "radon"]),
    ("pre_commit_enabled", &["formatting", "pre_commit"]),
    ("version_bumping_enabled", &["formatting", "version_bumping"]),
    ("python_version", &["metadata", "python_version"]),
    ("type_checker", &["formatting", "type_checker"]),
    ("typing_level", &["typing_level"]),
    ("layout", &["layout"]),
    ("package_manager", &["package_manager"]),
    ("docker_enabled", &["docker", "enabled"]),
    ("devcontainer_enabled", &["docker", "devcontainer"]),
    ("container_runtime", &["docker", "container_runtime"]),
    ("coverage_enabled", &["testing", "coverage_config", "enabled"]),
    ("coverage_tool", &["testing", "coverage_config", "tool"]),
    ("coverage_threshold", &["testing", "coverage_config", "threshold"]),
    ("docs_enabled", &["documentation", "enabled"]),
    ("docs_tool", &["documentation", "tool"]),
    ("docs_deploy_gh_pages", &["documentation", "deploy_gh_pages"]),
    ("tox_enabled", &["tox", "enabled"]),
];

/// Caller-supplied settings; `None` leaves the resolved value alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverrideSet {
    pub testing_enabled: Option<bool>,
    pub formatting_enabled: Option<bool>,
    pub radon_enabled: Option<bool>,
    pub pre_commit_enabled: Option<bool>,
    pub version_bumping_enabled: Option<bool>,
    pub python_version: Option<String>,
    pub type_checker: Option<TypeChecker>,
    pub typing_level: Option<TypingLevel>,
    pub layout: Option<LayoutStyle>,
    pub package_manager: Option<CreationPackageManager>,
    pub docker_enabled: Option<bool>,
    pub devcontainer_enabled: Option<bool>,
    pub container_runtime: Option<ContainerRuntime>,
    pub coverage_enabled: Option<bool>,
    pub coverage_tool: Option<CoverageTool>,
    pub coverage_threshold: Option<u32>,
    pub docs_enabled: Option<bool>,
    pub docs_tool: Option<DocumentationTool>,
    pub docs_deploy_gh_pages: Option<bool>,
    pub tox_enabled: Option<bool>,

    /// Appended to `dependencies.main`
    pub extra_packages: Vec<String>,
    /// Appended to `dependencies.dev`
    pub extra_dev_packages: Vec<String>,
}

impl OverrideSet {
    /// Tree value for a field named in [`OVERRIDE_PATHS`]
    pub fn field_value(&self, field: &str) -> Option<Value> {
        match field {
            "testing_enabled" => self.testing_enabled.map(Value::Bool),
            "formatting_enabled" => self.formatting_enabled.map(Value::Bool),
            "radon_enabled" => self.radon_enabled.map(Value::Bool),
            "pre_commit_enabled" => self.pre_commit_enabled.map(Value::Bool),
            "version_bumping_enabled" => self.version_bumping_enabled.map(Value::Bool),
            "python_version" => self.python_version.clone().map(Value::String),
            "type_checker" => text(self.type_checker),
            "typing_level" => text(self.typing_level),
            "layout" => text(self.layout),
            "package_manager" => text(self.package_manager),
            "docker_enabled" => self.docker_enabled.map(Value::Bool),
            "devcontainer_enabled" => self.devcontainer_enabled.map(Value::Bool),
            "container_runtime" => text(self.container_runtime),
            "coverage_enabled" => self.coverage_enabled.map(Value::Bool),
            "coverage_tool" => text(self.coverage_tool),
            "coverage_threshold" => self.coverage_threshold.map(Value::from),
            "docs_enabled" => self.docs_enabled.map(Value::Bool),
            "docs_tool" => text(self.docs_tool),
            "docs_deploy_gh_pages" => self.docs_deploy_gh_pages.map(Value::Bool),
            "tox_enabled" => self.tox_enabled.map(Value::Bool),
            _ => None,
        }
    }

    /// True when applying this set would leave any tree unchanged
    pub fn is_empty(&self) -> bool {
        self.extra_packages.is_empty()
            && self.extra_dev_packages.is_empty()
            && OVERRIDE_PATHS
                .iter()
                .all(|(field, _)| self.field_value(field).is_none())
    }
}

fn text<T: Display>(value: Option<T>) -> Option<Value> {
    value.map(|v| Value::String(v.to_string()))
}

/// Write every set override into `tree`.
pub fn apply_overrides(mut tree: Value, overrides: &OverrideSet) -> Value {
    for (field, path) in OVERRIDE_PATHS {
        if let Some(value) = overrides.field_value(field) {
            debug!(field, "applying override");
            set_path(&mut tree, path, value);
        }
    }

    if !overrides.extra_packages.is_empty() {
        extend_path(
            &mut tree,
            &["dependencies", "main"],
            overrides.extra_packages.iter().cloned().map(Value::String),
        );
    }
    if !overrides.extra_dev_packages.is_empty() {
        extend_path(
            &mut tree,
            &["dependencies", "dev"],
            overrides.extra_dev_packages.iter().cloned().map(Value::String),
        );
    }

    tree
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_set_is_identity() {
        let tree = json!({"layout": "src", "dependencies": {"main": ["httpx"]}});
        assert!(OverrideSet::default().is_empty());
        assert_eq!(apply_overrides(tree.clone(), &OverrideSet::default()), tree);
    }

    #[test]
    fn test_scalars_overwrite_nested_paths() {
        let overrides = OverrideSet {
            testing_enabled: Some(false),
            layout: Some(LayoutStyle::Flat),
            coverage_tool: Some(CoverageTool::Codecov),
            coverage_threshold: Some(85),
            container_runtime: Some(ContainerRuntime::Podman),
            python_version: Some("3.13".to_string()),
            ..Default::default()
        };
        let tree = json!({
            "testing": {"enabled": true, "framework": "pytest"},
            "layout": "src"
        });

        let tree = apply_overrides(tree, &overrides);

        assert_eq!(tree["testing"]["enabled"], false);
        assert_eq!(tree["testing"]["framework"], "pytest");
        assert_eq!(tree["layout"], "flat");
        assert_eq!(tree["testing"]["coverage_config"]["tool"], "codecov");
        assert_eq!(tree["testing"]["coverage_config"]["threshold"], 85);
        assert_eq!(tree["docker"]["container_runtime"], "podman");
        assert_eq!(tree["metadata"]["python_version"], "3.13");
    }

    #[test]
    fn test_extra_packages_append() {
        let overrides = OverrideSet {
            extra_packages: vec!["rich".to_string()],
            extra_dev_packages: vec!["hypothesis".to_string()],
            ..Default::default()
        };
        let tree = apply_overrides(json!({"dependencies": {"main": ["typer"]}}), &overrides);

        assert_eq!(tree["dependencies"]["main"], json!(["typer", "rich"]));
        assert_eq!(tree["dependencies"]["dev"], json!(["hypothesis"]));
    }

    #[test]
    fn test_every_field_has_a_value() {
        let overrides = OverrideSet {
            testing_enabled: Some(true),
            formatting_enabled: Some(true),
            radon_enabled: Some(true),
            pre_commit_enabled: Some(true),
            version_bumping_enabled: Some(true),
            python_version: Some("3.12".to_string()),
            type_checker: Some(TypeChecker::Ty),
            typing_level: Some(TypingLevel::Basic),
            layout: Some(LayoutStyle::Src),
            package_manager: Some(CreationPackageManager::Uv),
            docker_enabled: Some(true),
            devcontainer_enabled: Some(true),
            container_runtime: Some(ContainerRuntime::Docker),
            coverage_enabled: Some(true),
            coverage_tool: Some(CoverageTool::None),
            coverage_threshold: Some(90),
            docs_enabled: Some(true),
            docs_tool: Some(DocumentationTool::Mkdocs),
            docs_deploy_gh_pages: Some(true),
            tox_enabled: Some(true),
            ..Default::default()
        };

        for (field, _) in OVERRIDE_PATHS {
            assert!(overrides.field_value(field).is_some(), "{field}");
        }
        let tree = apply_overrides(json!({}), &overrides);
        assert_eq!(tree["formatting"]["type_checker"], "ty");
        assert_eq!(tree["documentation"]["tool"], "mkdocs");
        assert_eq!(tree["package_manager"], "uv");
    }
}
