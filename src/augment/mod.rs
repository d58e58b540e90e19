//! Configuration for adding tooling to an existing project
//!
//! Combines what the analyzer detected with caller-supplied values and
//! explicit corrections. Precedence, highest first: correction, supplied
//! value, detected value, missing-field default, built-in default.

mod prompt;

use std::collections::BTreeMap;
use std::str::FromStr;

use presetkit_analyzer::{
    DetectedLinter, DetectedTestFramework, DetectedTypeChecker, PackageManager, ProjectAnalysis,
    DEFAULT_PYTHON_VERSION,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

pub use prompt::{Prompter, TerminalPrompter};

use crate::model::{package_name_for, DependabotSchedule};

/// Dependabot pull request limit when none is given
pub const DEFAULT_PR_LIMIT: u32 = 5;

const DEFAULT_LINE_LENGTH: u32 = 100;

/// Keys accepted by [`AugmentConfigBuilder::supplied`] and [`AugmentConfigBuilder::correct`]
pub const AUGMENT_KEYS: &[&str] = &[
    "project_name",
    "package_name",
    "python_version",
    "description",
    "package_manager",
    "test_framework",
    "has_coverage",
    "linter",
    "type_checker",
    "line_length",
    "generate_test_workflow",
    "generate_lint_workflow",
    "generate_dependabot",
    "generate_tests_dir",
    "generate_gitignore",
    "generate_pypi_publish",
    "dependabot_schedule",
    "dependabot_pr_limit",
];

/// Settings for augmenting an existing project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AugmentConfig {
    pub project_name: String,
    pub package_name: String,
    pub python_version: String,
    pub description: String,

    pub package_manager: PackageManager,
    pub test_framework: DetectedTestFramework,
    pub has_coverage: bool,
    pub linter: DetectedLinter,
    pub type_checker: DetectedTypeChecker,
    pub line_length: u32,

    pub source_dirs: Vec<String>,
    pub has_src_layout: bool,

    pub generate_test_workflow: bool,
    pub generate_lint_workflow: bool,
    pub generate_dependabot: bool,
    pub generate_tests_dir: bool,
    pub generate_gitignore: bool,
    pub generate_pypi_publish: bool,

    pub dependabot_schedule: DependabotSchedule,
    pub dependabot_pr_limit: u32,
}

impl AugmentConfig {
    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Generated artifact toggle: key, question, and whether the artifact exists
struct Toggle {
    key: &'static str,
    question: &'static str,
    exists: bool,
    default: bool,
}

/// Builds an [`AugmentConfig`] from an analysis.
pub struct AugmentConfigBuilder<'a> {
    analysis: &'a ProjectAnalysis,
    supplied: BTreeMap<String, String>,
    corrections: BTreeMap<String, String>,
}

impl<'a> AugmentConfigBuilder<'a> {
    pub fn new(analysis: &'a ProjectAnalysis) -> Self {
        Self {
            analysis,
            supplied: BTreeMap::new(),
            corrections: BTreeMap::new(),
        }
    }

    /// Value supplied by the caller (CLI flag or API argument)
    pub fn supplied(mut self, key: &str, value: impl Into<String>) -> Self {
        warn_unknown_key(key);
        self.supplied.insert(key.to_string(), value.into());
        self
    }

    /// Explicit correction of a detected value
    pub fn correct(mut self, key: &str, value: impl Into<String>) -> Self {
        warn_unknown_key(key);
        self.corrections.insert(key.to_string(), value.into());
        self
    }

    /// Resolve without asking any questions.
    pub fn build(&self) -> AugmentConfig {
        let analysis = self.analysis;

        let project_name = self.resolve(
            "project_name",
            parse_text,
            analysis.project_name.as_ref().map(|d| d.value.clone()),
            || directory_name(analysis),
        );
        let package_name = self.resolve(
            "package_name",
            parse_text,
            analysis.package_name.as_ref().map(|d| d.value.clone()),
            || package_name_for(&project_name),
        );
        let python_version = self.resolve(
            "python_version",
            parse_text,
            analysis.python_version.as_ref().map(|d| d.value.clone()),
            || DEFAULT_PYTHON_VERSION.to_string(),
        );
        let description = self.resolve(
            "description",
            |s| Some(s.to_string()),
            analysis.description.as_ref().map(|d| d.value.clone()),
            String::new,
        );

        let package_manager = self.resolve(
            "package_manager",
            PackageManager::parse,
            analysis.package_manager.as_ref().map(|d| d.value),
            || PackageManager::Poetry,
        );
        let test_framework = self.resolve(
            "test_framework",
            DetectedTestFramework::parse,
            analysis.test_framework.as_ref().map(|d| d.value),
            || DetectedTestFramework::Pytest,
        );
        let linter = self.resolve(
            "linter",
            DetectedLinter::parse,
            analysis.linter.as_ref().map(|d| d.value),
            || DetectedLinter::Ruff,
        );
        let type_checker = self.resolve(
            "type_checker",
            DetectedTypeChecker::parse,
            analysis.type_checker.as_ref().map(|d| d.value),
            || DetectedTypeChecker::Mypy,
        );
        let line_length = self.resolve(
            "line_length",
            parse_from_str::<u32>,
            analysis
                .line_length
                .as_ref()
                .and_then(|d| u32::try_from(d.value).ok()),
            || DEFAULT_LINE_LENGTH,
        );

        let detected_coverage = analysis
            .dev_dependencies
            .iter()
            .any(|dep| dep == "pytest-cov" || dep == "coverage");
        let has_coverage = self.resolve(
            "has_coverage",
            parse_bool,
            Some(detected_coverage),
            || false,
        );

        let source_dirs = if analysis.source_dirs.is_empty() {
            vec!["src".to_string()]
        } else {
            analysis.source_dirs.clone()
        };

        let toggle = |key: &str| {
            let fallback = self
                .toggles()
                .into_iter()
                .find(|t| t.key == key)
                .map(|t| !t.exists)
                .unwrap_or(false);
            self.resolve(key, parse_bool, None, || fallback)
        };

        AugmentConfig {
            project_name,
            package_name,
            python_version,
            description,
            package_manager,
            test_framework,
            has_coverage,
            linter,
            type_checker,
            line_length,
            source_dirs,
            has_src_layout: analysis.has_src_layout,
            generate_test_workflow: toggle("generate_test_workflow"),
            generate_lint_workflow: toggle("generate_lint_workflow"),
            generate_dependabot: toggle("generate_dependabot"),
            generate_tests_dir: toggle("generate_tests_dir"),
            generate_gitignore: toggle("generate_gitignore"),
            generate_pypi_publish: toggle("generate_pypi_publish"),
            dependabot_schedule: self.resolve(
                "dependabot_schedule",
                parse_from_str::<DependabotSchedule>,
                None,
                DependabotSchedule::default,
            ),
            dependabot_pr_limit: self.resolve(
                "dependabot_pr_limit",
                parse_from_str::<u32>,
                None,
                || DEFAULT_PR_LIMIT,
            ),
        }
    }

    /// Resolve, asking `prompter` about gaps and uncertain detections.
    ///
    /// Every answer is recorded as a correction.
    pub fn build_interactive(mut self, prompter: &mut dyn Prompter) -> AugmentConfig {
        prompter.show(&self.summary());

        // Missing fields
        let missing: Vec<_> = self
            .analysis
            .missing_fields
            .iter()
            .filter(|field| AUGMENT_KEYS.contains(&field.name.as_str()))
            .filter(|field| !self.is_settled(&field.name))
            .cloned()
            .collect();
        for field in missing {
            let default = field.default.clone().unwrap_or_default();
            let choices = field.choices.clone().unwrap_or_default();
            let answer = prompter.ask(&field.description, &default, &choices);
            if !answer.is_empty() {
                self.corrections.insert(field.name, answer);
            }
        }

        // Uncertain detections
        for (name, detected) in self.analysis.detections() {
            let Some(detected) = detected else {
                continue;
            };
            if detected.is_reliable() || !AUGMENT_KEYS.contains(&name) || self.is_settled(name) {
                continue;
            }
            let shown = display_value(&detected.value);
            let question = format!(
                "{}: detected '{}' from {} ({} confidence). Use it?",
                name, shown, detected.source, detected.confidence
            );
            if !prompter.confirm(&question, true) {
                let answer = prompter.ask(name, &shown, &choices_for(name));
                if !answer.is_empty() {
                    self.corrections.insert(name.to_string(), answer);
                }
            }
        }

        // Generated artifacts
        for toggle in self.toggles() {
            if self.is_settled(toggle.key) {
                continue;
            }
            let answer = prompter.confirm(toggle.question, toggle.default);
            self.corrections
                .insert(toggle.key.to_string(), answer.to_string());
        }

        // Dependabot settings
        let dependabot = self
            .pick("generate_dependabot")
            .and_then(parse_bool)
            .unwrap_or(false);
        if dependabot {
            if !self.is_settled("dependabot_schedule") {
                let schedule = prompter.ask(
                    "Dependabot update schedule",
                    DependabotSchedule::default().as_str(),
                    &choices_for("dependabot_schedule"),
                );
                self.corrections
                    .insert("dependabot_schedule".to_string(), schedule);
            }
            if !self.is_settled("dependabot_pr_limit") {
                let answer = prompter.ask(
                    "Maximum open Dependabot pull requests",
                    &DEFAULT_PR_LIMIT.to_string(),
                    &[],
                );
                let limit = match answer.parse::<u32>() {
                    Ok(limit) => limit,
                    Err(_) => {
                        prompter.show(&format!(
                            "Invalid number '{}', using {}",
                            answer, DEFAULT_PR_LIMIT
                        ));
                        DEFAULT_PR_LIMIT
                    }
                };
                self.corrections
                    .insert("dependabot_pr_limit".to_string(), limit.to_string());
            }
        }

        self.build()
    }

    /// Human-readable summary of the analysis
    pub fn summary(&self) -> String {
        let analysis = self.analysis;
        let mut lines = vec![format!(
            "Analyzed project at {}",
            analysis.project_dir.display()
        )];
        for (name, detected) in analysis.detections() {
            if let Some(detected) = detected {
                lines.push(format!(
                    "  {:<16} {} ({}, {})",
                    name,
                    display_value(&detected.value),
                    detected.confidence,
                    detected.source
                ));
            }
        }
        if !analysis.missing_fields.is_empty() {
            lines.push("Missing:".to_string());
            for field in &analysis.missing_fields {
                let marker = if field.required { "required" } else { "optional" };
                lines.push(format!("  {:<16} {} ({})", field.name, field.description, marker));
            }
        }
        lines.join("\n")
    }

    fn toggles(&self) -> Vec<Toggle> {
        let analysis = self.analysis;
        let tests_exist = analysis.has_tests_dir;
        vec![
            Toggle {
                key: "generate_test_workflow",
                question: "Generate a GitHub Actions test workflow?",
                exists: analysis.has_test_workflow(),
                default: !analysis.has_test_workflow(),
            },
            Toggle {
                key: "generate_lint_workflow",
                question: "Generate a GitHub Actions lint workflow?",
                exists: analysis.has_lint_workflow(),
                default: !analysis.has_lint_workflow(),
            },
            Toggle {
                key: "generate_dependabot",
                question: "Generate a Dependabot configuration?",
                exists: analysis.has_dependabot,
                default: !analysis.has_dependabot,
            },
            Toggle {
                key: "generate_tests_dir",
                question: "Create a tests directory with a sample test?",
                exists: tests_exist,
                default: !tests_exist || analysis.existing_tests.is_empty(),
            },
            Toggle {
                key: "generate_gitignore",
                question: "Generate a .gitignore?",
                exists: analysis.has_gitignore,
                default: !analysis.has_gitignore,
            },
            Toggle {
                key: "generate_pypi_publish",
                question: "Generate a PyPI publish workflow?",
                // Publishing is opt-in
                exists: true,
                default: false,
            },
        ]
    }

    fn pick(&self, key: &str) -> Option<&str> {
        self.corrections
            .get(key)
            .or_else(|| self.supplied.get(key))
            .map(String::as_str)
    }

    fn is_settled(&self, key: &str) -> bool {
        self.pick(key).is_some()
    }

    fn resolve<T>(
        &self,
        key: &str,
        parse: impl Fn(&str) -> Option<T>,
        detected: Option<T>,
        builtin: impl FnOnce() -> T,
    ) -> T {
        for (layer, raw) in [
            ("correction", self.corrections.get(key)),
            ("supplied", self.supplied.get(key)),
        ] {
            if let Some(raw) = raw {
                match parse(raw.as_str()) {
                    Some(value) => return value,
                    None => warn!(key, value = %raw, layer, "ignoring invalid value"),
                }
            }
        }
        if let Some(value) = detected {
            return value;
        }
        self.analysis
            .missing_field(key)
            .and_then(|field| field.default.as_deref())
            .and_then(parse)
            .unwrap_or_else(builtin)
    }
}

fn warn_unknown_key(key: &str) {
    if !AUGMENT_KEYS.contains(&key) {
        warn!(key, "unknown augment setting");
    }
}

fn parse_text(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "on" => Some(true),
        "false" | "no" | "n" | "0" | "off" => Some(false),
        _ => None,
    }
}

fn parse_from_str<T: FromStr>(s: &str) -> Option<T> {
    s.trim().parse().ok()
}

fn directory_name(analysis: &ProjectAnalysis) -> String {
    analysis
        .project_dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn choices_for(key: &str) -> Vec<String> {
    let names: Vec<&str> = match key {
        "package_manager" => PackageManager::ALL.iter().map(|v| v.as_str()).collect(),
        "test_framework" => DetectedTestFramework::ALL.iter().map(|v| v.as_str()).collect(),
        "linter" => DetectedLinter::ALL.iter().map(|v| v.as_str()).collect(),
        "type_checker" => DetectedTypeChecker::ALL.iter().map(|v| v.as_str()).collect(),
        "dependabot_schedule" => DependabotSchedule::VALUES.to_vec(),
        _ => Vec::new(),
    };
    names.into_iter().map(str::to_string).collect()
}
