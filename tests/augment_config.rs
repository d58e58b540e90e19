//! Augment configuration built from real analyses of on-disk projects.

use std::collections::VecDeque;
use std::fs;
use std::io::Cursor;
use std::path::Path;

use presetkit::analyzer::{DetectedLinter, DetectedTestFramework, PackageManager};
use presetkit::model::DependabotSchedule;
use presetkit::{analyze_project, AugmentConfigBuilder, Prompter, TerminalPrompter};
use tempfile::TempDir;

fn write(dir: &Path, relative: &str, contents: &str) {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// Answers confirmations from a queue, accepting defaults once it runs dry
struct QueuedPrompter {
    confirms: VecDeque<bool>,
    answers: VecDeque<&'static str>,
    questions: Vec<String>,
}

impl Prompter for QueuedPrompter {
    fn show(&mut self, _message: &str) {}

    fn confirm(&mut self, question: &str, default: bool) -> bool {
        self.questions.push(question.to_string());
        self.confirms.pop_front().unwrap_or(default)
    }

    fn ask(&mut self, question: &str, default: &str, _choices: &[String]) -> String {
        self.questions.push(question.to_string());
        self.answers
            .pop_front()
            .map(str::to_string)
            .unwrap_or_else(|| default.to_string())
    }
}

#[test]
fn test_poetry_project_without_tooling() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "pyproject.toml",
        "[tool.poetry]\nname = \"old-lib\"\n\n[tool.poetry.dependencies]\npython = \"^3.10\"\n",
    );

    let analysis = analyze_project(dir.path());
    let config = AugmentConfigBuilder::new(&analysis).build();

    assert_eq!(config.project_name, "old-lib");
    assert_eq!(config.package_name, "old_lib");
    assert_eq!(config.python_version, "3.10");
    assert_eq!(config.package_manager, PackageManager::Poetry);
    assert_eq!(config.linter, DetectedLinter::None);
    assert!(!config.has_coverage);
    assert!(config.generate_test_workflow);
    assert!(config.generate_lint_workflow);
    assert!(config.generate_dependabot);
    assert!(config.generate_tests_dir);
    assert!(config.generate_gitignore);
    assert!(!config.generate_pypi_publish);
    assert_eq!(config.source_dirs, vec!["src"]);
}

#[test]
fn test_existing_artifacts_are_not_regenerated() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "pyproject.toml",
        r#"
[project]
name = "svc"
requires-python = ">=3.12"

[dependency-groups]
dev = ["pytest", "coverage", "ruff"]
"#,
    );
    write(dir.path(), "svc/__init__.py", "");
    write(dir.path(), "tests/test_svc.py", "");
    write(dir.path(), ".github/workflows/test.yml", "");
    write(dir.path(), ".github/workflows/lint.yaml", "");
    write(dir.path(), ".github/dependabot.yml", "");
    write(dir.path(), ".gitignore", "");

    let analysis = analyze_project(dir.path());
    let config = AugmentConfigBuilder::new(&analysis).build();

    assert_eq!(config.test_framework, DetectedTestFramework::Pytest);
    assert_eq!(config.linter, DetectedLinter::Ruff);
    assert!(config.has_coverage);
    assert_eq!(config.source_dirs, vec!["svc"]);
    assert!(!config.has_src_layout);
    assert!(!config.generate_test_workflow);
    assert!(!config.generate_lint_workflow);
    assert!(!config.generate_dependabot);
    assert!(!config.generate_tests_dir);
    assert!(!config.generate_gitignore);
}

#[test]
fn test_supplied_values_override_detection() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "pyproject.toml",
        "[project]\nname = \"app\"\n\n[tool.black]\nline-length = 79\n",
    );

    let analysis = analyze_project(dir.path());
    let config = AugmentConfigBuilder::new(&analysis)
        .supplied("linter", "ruff")
        .supplied("line_length", "110")
        .supplied("dependabot_schedule", "daily")
        .supplied("generate_pypi_publish", "yes")
        .build();

    assert_eq!(config.linter, DetectedLinter::Ruff);
    assert_eq!(config.line_length, 110);
    assert_eq!(config.dependabot_schedule, DependabotSchedule::Daily);
    assert!(config.generate_pypi_publish);
}

#[test]
fn test_interactive_fills_missing_project_name() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "app/__init__.py", "");

    let analysis = analyze_project(dir.path());
    let mut prompter = QueuedPrompter {
        confirms: VecDeque::new(),
        // project name, python version, test framework, linter, schedule, pr limit
        answers: VecDeque::from(vec!["named-app", "3.13", "unittest", "black", "", "3"]),
        questions: Vec::new(),
    };

    let config = AugmentConfigBuilder::new(&analysis).build_interactive(&mut prompter);

    assert_eq!(config.project_name, "named-app");
    assert_eq!(config.package_name, "named_app");
    assert_eq!(config.python_version, "3.13");
    assert_eq!(config.test_framework, DetectedTestFramework::Unittest);
    assert_eq!(config.linter, DetectedLinter::Black);
    assert_eq!(config.dependabot_pr_limit, 3);
    assert!(prompter
        .questions
        .iter()
        .any(|q| q.contains("Dependabot update schedule")));
}

#[test]
fn test_terminal_prompter_accepts_all_defaults() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "pyproject.toml",
        "[tool.pdm]\n\n[project]\nname = \"pdm-app\"\nrequires-python = \">=3.11\"\n",
    );

    let analysis = analyze_project(dir.path());
    // Empty input: every question takes its default
    let mut prompter = TerminalPrompter::new(Cursor::new(Vec::new()), Vec::new());
    let interactive = AugmentConfigBuilder::new(&analysis).build_interactive(&mut prompter);
    let batch = AugmentConfigBuilder::new(&analysis).build();

    assert_eq!(interactive.package_manager, PackageManager::Pdm);
    assert_eq!(interactive.project_name, batch.project_name);
    assert_eq!(interactive.generate_gitignore, batch.generate_gitignore);
    assert_eq!(interactive.dependabot_pr_limit, 5);

    let transcript = String::from_utf8(prompter.into_output()).unwrap();
    assert!(transcript.contains("package_manager: detected 'pdm'"));
}
