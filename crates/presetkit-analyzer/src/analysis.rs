//! Analysis result types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::detected::{DetectedValue, MissingField};

/// Package manager detected in an existing project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    Poetry,
    Pdm,
    Uv,
    Setuptools,
    Hatch,
    Flit,
    Unknown,
}

impl PackageManager {
    pub const ALL: &'static [PackageManager] = &[
        PackageManager::Poetry,
        PackageManager::Pdm,
        PackageManager::Uv,
        PackageManager::Setuptools,
        PackageManager::Hatch,
        PackageManager::Flit,
        PackageManager::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PackageManager::Poetry => "poetry",
            PackageManager::Pdm => "pdm",
            PackageManager::Uv => "uv",
            PackageManager::Setuptools => "setuptools",
            PackageManager::Hatch => "hatch",
            PackageManager::Flit => "flit",
            PackageManager::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|pm| pm.as_str() == s)
    }
}

/// Linting/formatting tool detected in an existing project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectedLinter {
    Ruff,
    Black,
    Flake8,
    Isort,
    None,
}

impl DetectedLinter {
    pub const ALL: &'static [DetectedLinter] = &[
        DetectedLinter::Ruff,
        DetectedLinter::Black,
        DetectedLinter::Flake8,
        DetectedLinter::Isort,
        DetectedLinter::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DetectedLinter::Ruff => "ruff",
            DetectedLinter::Black => "black",
            DetectedLinter::Flake8 => "flake8",
            DetectedLinter::Isort => "isort",
            DetectedLinter::None => "none",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|l| l.as_str() == s)
    }
}

/// Test framework detected in an existing project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectedTestFramework {
    Pytest,
    Unittest,
    None,
}

impl DetectedTestFramework {
    pub const ALL: &'static [DetectedTestFramework] = &[
        DetectedTestFramework::Pytest,
        DetectedTestFramework::Unittest,
        DetectedTestFramework::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DetectedTestFramework::Pytest => "pytest",
            DetectedTestFramework::Unittest => "unittest",
            DetectedTestFramework::None => "none",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == s)
    }
}

/// Type checker detected in an existing project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectedTypeChecker {
    Mypy,
    Pyright,
    None,
}

impl DetectedTypeChecker {
    pub const ALL: &'static [DetectedTypeChecker] = &[
        DetectedTypeChecker::Mypy,
        DetectedTypeChecker::Pyright,
        DetectedTypeChecker::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DetectedTypeChecker::Mypy => "mypy",
            DetectedTypeChecker::Pyright => "pyright",
            DetectedTypeChecker::None => "none",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == s)
    }
}

macro_rules! impl_display {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

impl_display!(PackageManager, DetectedLinter, DetectedTestFramework, DetectedTypeChecker);

/// Complete analysis of an existing project
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectAnalysis {
    /// Absolute path of the analyzed directory
    pub project_dir: PathBuf,

    // Project identification
    pub project_name: Option<DetectedValue<String>>,
    pub package_name: Option<DetectedValue<String>>,
    pub version: Option<DetectedValue<String>>,
    pub description: Option<DetectedValue<String>>,
    pub python_version: Option<DetectedValue<String>>,

    pub package_manager: Option<DetectedValue<PackageManager>>,

    // Testing
    pub test_framework: Option<DetectedValue<DetectedTestFramework>>,
    pub has_tests_dir: bool,
    pub existing_tests: Vec<PathBuf>,

    // Linting/formatting
    pub linter: Option<DetectedValue<DetectedLinter>>,
    pub type_checker: Option<DetectedValue<DetectedTypeChecker>>,
    pub line_length: Option<DetectedValue<i64>>,

    // CI
    pub has_github_dir: bool,
    pub existing_workflows: Vec<PathBuf>,
    pub has_dependabot: bool,

    pub has_gitignore: bool,

    // Layout
    pub has_src_layout: bool,
    pub source_dirs: Vec<String>,

    pub main_dependencies: Vec<String>,
    pub dev_dependencies: Vec<String>,

    /// Fields that need user input or a default
    pub missing_fields: Vec<MissingField>,
}

impl ProjectAnalysis {
    /// Every detection, type-erased and keyed by field name, in a fixed order.
    pub fn detections(&self) -> Vec<(&'static str, Option<DetectedValue<serde_json::Value>>)> {
        vec![
            ("project_name", self.project_name.as_ref().map(|d| d.to_json())),
            ("package_name", self.package_name.as_ref().map(|d| d.to_json())),
            ("version", self.version.as_ref().map(|d| d.to_json())),
            ("description", self.description.as_ref().map(|d| d.to_json())),
            ("python_version", self.python_version.as_ref().map(|d| d.to_json())),
            ("package_manager", self.package_manager.as_ref().map(|d| d.to_json())),
            ("test_framework", self.test_framework.as_ref().map(|d| d.to_json())),
            ("linter", self.linter.as_ref().map(|d| d.to_json())),
            ("type_checker", self.type_checker.as_ref().map(|d| d.to_json())),
            ("line_length", self.line_length.as_ref().map(|d| d.to_json())),
        ]
    }

    /// Values that can be used without confirmation.
    pub fn reliable_values(&self) -> BTreeMap<&'static str, serde_json::Value> {
        self.detections()
            .into_iter()
            .filter_map(|(name, d)| d.filter(|d| d.is_reliable()).map(|d| (name, d.value)))
            .collect()
    }

    /// Values that were detected but should be confirmed.
    pub fn uncertain_values(&self) -> BTreeMap<&'static str, DetectedValue<serde_json::Value>> {
        self.detections()
            .into_iter()
            .filter_map(|(name, d)| d.filter(|d| !d.is_reliable()).map(|d| (name, d)))
            .collect()
    }

    pub fn missing_field(&self, name: &str) -> Option<&MissingField> {
        self.missing_fields.iter().find(|f| f.name == name)
    }

    /// Whether an existing workflow looks like a test/CI workflow.
    pub fn has_test_workflow(&self) -> bool {
        self.workflow_names()
            .any(|n| n.contains("test") || n.contains("ci"))
    }

    pub fn has_lint_workflow(&self) -> bool {
        self.workflow_names().any(|n| n.contains("lint"))
    }

    fn workflow_names(&self) -> impl Iterator<Item = String> + '_ {
        self.existing_workflows.iter().filter_map(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy().to_lowercase())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detected::Confidence;

    fn sample() -> ProjectAnalysis {
        ProjectAnalysis {
            project_name: Some(DetectedValue::high("demo".to_string(), "pyproject.toml")),
            python_version: Some(DetectedValue::low("3.11".to_string(), "default value")),
            linter: Some(DetectedValue::medium(DetectedLinter::None, "no linter detected")),
            ..Default::default()
        }
    }

    #[test]
    fn test_reliable_and_uncertain_split() {
        let analysis = sample();

        let reliable = analysis.reliable_values();
        assert_eq!(reliable.len(), 1);
        assert_eq!(reliable["project_name"], "demo");

        let uncertain = analysis.uncertain_values();
        assert_eq!(uncertain.len(), 2);
        assert_eq!(uncertain["python_version"].confidence, Confidence::Low);
        assert_eq!(uncertain["linter"].value, "none");
    }

    #[test]
    fn test_workflow_classification() {
        let analysis = ProjectAnalysis {
            existing_workflows: vec![
                PathBuf::from(".github/workflows/CI.yml"),
                PathBuf::from(".github/workflows/release.yaml"),
            ],
            ..Default::default()
        };
        assert!(analysis.has_test_workflow());
        assert!(!analysis.has_lint_workflow());
    }

    #[test]
    fn test_enum_parse_roundtrip() {
        for pm in PackageManager::ALL {
            assert_eq!(PackageManager::parse(pm.as_str()), Some(*pm));
        }
        assert_eq!(DetectedLinter::parse("flake8"), Some(DetectedLinter::Flake8));
        assert_eq!(DetectedTestFramework::parse("nose"), None);
        assert_eq!(
            DetectedTypeChecker::parse("pyright").map(|t| t.to_string()),
            Some("pyright".into())
        );
    }
}
