//! Project analyzer
//!
//! Runs a sequence of independent probes over an existing project's
//! `pyproject.toml` and directory layout. Each probe returns a
//! confidence-tagged value (or `None`) and never fails: unreadable or
//! absent information degrades to a low-confidence default or an entry in
//! `missing_fields`.

use std::fs;
use std::path::{Path, PathBuf};

use toml::{Table, Value};
use tracing::{debug, warn};

use crate::analysis::{
    DetectedLinter, DetectedTestFramework, DetectedTypeChecker, PackageManager, ProjectAnalysis,
};
use crate::detected::{Confidence, DetectedValue, MissingField};
use crate::specifier::{parse_python_version_spec, parse_ruff_target_version, requirement_name};

/// Manifest file name
pub const MANIFEST_FILE: &str = "pyproject.toml";

/// Python version assumed when nothing better is known
pub const DEFAULT_PYTHON_VERSION: &str = "3.11";

/// Python versions offered when the version must be chosen
pub const PYTHON_VERSION_CHOICES: &[&str] = &["3.10", "3.11", "3.12", "3.13"];

/// Line length assumed when no formatter configures one
pub const DEFAULT_LINE_LENGTH: i64 = 100;

/// Suggested test framework for projects without one
pub const DEFAULT_TEST_FRAMEWORK: &str = "pytest";

/// Suggested linter for projects without one
pub const DEFAULT_LINTER: &str = "ruff";

/// Package managers identified by a `[tool.<name>]` table plus a lock file.
const LOCKED_MANAGERS: &[(&str, &str, PackageManager)] = &[
    ("poetry", "poetry.lock", PackageManager::Poetry),
    ("pdm", "pdm.lock", PackageManager::Pdm),
    ("uv", "uv.lock", PackageManager::Uv),
];

/// Package managers identified by a `[tool.<name>]` table alone.
const TABLE_ONLY_MANAGERS: &[(&str, PackageManager)] = &[
    ("hatch", PackageManager::Hatch),
    ("flit", PackageManager::Flit),
];

/// Build-backend substrings, checked in order.
const BUILD_BACKENDS: &[(&str, PackageManager)] = &[
    ("poetry", PackageManager::Poetry),
    ("pdm", PackageManager::Pdm),
    ("hatchling", PackageManager::Hatch),
    ("flit", PackageManager::Flit),
    ("uv_build", PackageManager::Uv),
    ("setuptools", PackageManager::Setuptools),
];

/// PEP 621 optional-dependency groups treated as development dependencies.
const DEV_OPTIONAL_GROUPS: &[&str] = &["dev", "test", "development"];

/// Analyzes an existing Python project.
pub struct ProjectAnalyzer {
    project_dir: PathBuf,
    pyproject: Table,
    /// Manifest came from the caller; `analyze` does not read it from disk
    manifest_supplied: bool,
}

impl ProjectAnalyzer {
    pub fn new(project_dir: &Path) -> Self {
        let project_dir = if project_dir.is_absolute() {
            project_dir.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(project_dir))
                .unwrap_or_else(|_| project_dir.to_path_buf())
        };
        Self {
            project_dir,
            pyproject: Table::new(),
            manifest_supplied: false,
        }
    }

    /// Build an analyzer over already-parsed manifest data.
    ///
    /// `analyze` uses this table in place of any `pyproject.toml` on disk.
    pub fn with_manifest(project_dir: &Path, pyproject: Table) -> Self {
        Self {
            pyproject,
            manifest_supplied: true,
            ..Self::new(project_dir)
        }
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Run every probe and compute missing fields.
    pub fn analyze(mut self) -> ProjectAnalysis {
        let mut analysis = ProjectAnalysis {
            project_dir: self.project_dir.clone(),
            ..Default::default()
        };

        let manifest_path = self.project_dir.join(MANIFEST_FILE);
        let has_manifest = self.manifest_supplied || manifest_path.is_file();
        if has_manifest {
            if !self.manifest_supplied {
                self.pyproject = load_manifest(&manifest_path);
            }

            analysis.package_manager = Some(self.detect_package_manager());
            analysis.project_name = Some(self.extract_project_name());
            analysis.package_name = self.extract_package_name(analysis.project_name.as_ref());
            analysis.version = Some(self.extract_version());
            analysis.description = self.extract_description();
            analysis.python_version = Some(self.extract_python_version());

            let (main, dev) = self.extract_dependencies();
            analysis.main_dependencies = main;
            analysis.dev_dependencies = dev;

            analysis.test_framework = Some(self.detect_test_framework(&analysis.dev_dependencies));
            analysis.linter = Some(self.detect_linter(&analysis.dev_dependencies));
            analysis.type_checker = Some(self.detect_type_checker(&analysis.dev_dependencies));
            analysis.line_length = Some(self.detect_line_length());
        } else {
            debug!(
                dir = %self.project_dir.display(),
                "no {} found, skipping metadata probes",
                MANIFEST_FILE
            );
        }

        self.probe_structure(&mut analysis);

        let mut missing = Vec::new();
        if !has_manifest {
            missing.push(MissingField::required(
                MANIFEST_FILE,
                "No pyproject.toml found - project metadata cannot be detected",
            ));
        }
        missing.extend(determine_missing_fields(&analysis));
        analysis.missing_fields = missing;

        analysis
    }

    fn tool(&self, name: &str) -> Option<&Table> {
        self.pyproject
            .get("tool")
            .and_then(Value::as_table)
            .and_then(|tool| tool.get(name))
            .and_then(Value::as_table)
    }

    fn has_tool(&self, name: &str) -> bool {
        self.tool(name).is_some()
    }

    fn project_table(&self) -> Option<&Table> {
        self.pyproject.get("project").and_then(Value::as_table)
    }

    fn exists(&self, relative: &str) -> bool {
        self.project_dir.join(relative).exists()
    }

    /// First string found at `tool.poetry.<key>` then `project.<key>`.
    fn declared_string(&self, key: &str) -> Option<(String, String)> {
        if let Some(v) = self.tool("poetry").and_then(|p| p.get(key)).and_then(Value::as_str) {
            return Some((v.to_string(), format!("pyproject.toml [tool.poetry.{}]", key)));
        }
        self.project_table()
            .and_then(|p| p.get(key))
            .and_then(Value::as_str)
            .map(|v| (v.to_string(), format!("pyproject.toml [project.{}]", key)))
    }

    pub fn detect_package_manager(&self) -> DetectedValue<PackageManager> {
        for (table, lock, manager) in LOCKED_MANAGERS {
            if self.has_tool(table) {
                if self.exists(lock) {
                    return DetectedValue::high(
                        *manager,
                        format!("pyproject.toml [tool.{}] + {}", table, lock),
                    );
                }
                return DetectedValue::medium(*manager, format!("pyproject.toml [tool.{}]", table));
            }
        }

        for (table, manager) in TABLE_ONLY_MANAGERS {
            if self.has_tool(table) {
                return DetectedValue::medium(*manager, format!("pyproject.toml [tool.{}]", table));
            }
        }

        let backend = self
            .pyproject
            .get("build-system")
            .and_then(Value::as_table)
            .and_then(|b| b.get("build-backend"))
            .and_then(Value::as_str)
            .unwrap_or("");
        if let Some((_, manager)) = BUILD_BACKENDS.iter().find(|(m, _)| backend.contains(m)) {
            return DetectedValue::medium(*manager, "build-backend");
        }

        if self.exists("uv.lock") {
            return DetectedValue::medium(PackageManager::Uv, "uv.lock");
        }

        DetectedValue::low(PackageManager::Unknown, "no specific markers found")
    }

    pub fn extract_project_name(&self) -> DetectedValue<String> {
        match self.declared_string("name") {
            Some((name, source)) => DetectedValue::high(name, source),
            None => DetectedValue::low(self.directory_name(), "directory name"),
        }
    }

    pub fn extract_package_name(
        &self,
        project_name: Option<&DetectedValue<String>>,
    ) -> Option<DetectedValue<String>> {
        let explicit = self
            .tool("poetry")
            .and_then(|p| p.get("packages"))
            .and_then(Value::as_array)
            .and_then(|pkgs| pkgs.first())
            .and_then(Value::as_table)
            .and_then(|first| first.get("include"))
            .and_then(Value::as_str);
        if let Some(include) = explicit {
            return Some(DetectedValue::high(
                include.to_string(),
                "pyproject.toml [tool.poetry.packages]",
            ));
        }

        let candidates = list_dirs(&self.project_dir.join("src"))
            .into_iter()
            .filter(|name| !name.starts_with('.') && !name.starts_with("__"))
            .collect::<Vec<_>>();
        match candidates.as_slice() {
            [only] => return Some(DetectedValue::high(only.clone(), "src directory structure")),
            [first, ..] => {
                return Some(DetectedValue::medium(
                    first.clone(),
                    "src directory (multiple packages)",
                ))
            }
            [] => {}
        }

        project_name.map(|name| {
            DetectedValue::medium(
                name.value.replace('-', "_"),
                format!("derived from project name: {}", name.value),
            )
        })
    }

    pub fn extract_version(&self) -> DetectedValue<String> {
        match self.declared_string("version") {
            Some((version, source)) => DetectedValue::high(version, source),
            None => DetectedValue::low("0.1.0".to_string(), "default value"),
        }
    }

    pub fn extract_description(&self) -> Option<DetectedValue<String>> {
        self.declared_string("description")
            .map(|(description, source)| DetectedValue::high(description, source))
    }

    pub fn extract_python_version(&self) -> DetectedValue<String> {
        let poetry_python = self
            .tool("poetry")
            .and_then(|p| p.get("dependencies"))
            .and_then(Value::as_table)
            .and_then(|d| d.get("python"))
            .and_then(Value::as_str);
        if let Some(version) = poetry_python.and_then(parse_python_version_spec) {
            return DetectedValue::high(version, "pyproject.toml [tool.poetry.dependencies.python]");
        }

        let requires_python = self
            .project_table()
            .and_then(|p| p.get("requires-python"))
            .and_then(Value::as_str);
        if let Some(version) = requires_python.and_then(parse_python_version_spec) {
            return DetectedValue::high(version, "pyproject.toml [project.requires-python]");
        }

        let ruff_target = self
            .tool("ruff")
            .and_then(|r| r.get("target-version"))
            .and_then(Value::as_str);
        if let Some(version) = ruff_target.and_then(parse_ruff_target_version) {
            return DetectedValue::medium(version, "pyproject.toml [tool.ruff.target-version]");
        }

        let mypy_version = self.tool("mypy").and_then(|m| m.get("python_version"));
        let mypy_version = match mypy_version {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Float(f)) => Some(f.to_string()),
            _ => None,
        };
        if let Some(version) = mypy_version {
            return DetectedValue::medium(version, "pyproject.toml [tool.mypy.python_version]");
        }

        DetectedValue::low(DEFAULT_PYTHON_VERSION.to_string(), "default value")
    }

    /// Main and development dependency names, sorted and deduplicated.
    pub fn extract_dependencies(&self) -> (Vec<String>, Vec<String>) {
        let mut main: Vec<String> = Vec::new();
        let mut dev: Vec<String> = Vec::new();

        if let Some(poetry) = self.tool("poetry") {
            if let Some(deps) = poetry.get("dependencies").and_then(Value::as_table) {
                main.extend(deps.keys().filter(|k| !k.eq_ignore_ascii_case("python")).cloned());
            }
            if let Some(groups) = poetry.get("group").and_then(Value::as_table) {
                for group in groups.values() {
                    if let Some(deps) = group.get("dependencies").and_then(Value::as_table) {
                        dev.extend(deps.keys().cloned());
                    }
                }
            }
            if let Some(deps) = poetry.get("dev-dependencies").and_then(Value::as_table) {
                dev.extend(deps.keys().cloned());
            }
        }

        if let Some(project) = self.project_table() {
            if let Some(deps) = project.get("dependencies").and_then(Value::as_array) {
                main.extend(deps.iter().filter_map(Value::as_str).map(requirement_name));
            }
            if let Some(optional) = project.get("optional-dependencies").and_then(Value::as_table) {
                for group in DEV_OPTIONAL_GROUPS {
                    if let Some(deps) = optional.get(*group).and_then(Value::as_array) {
                        dev.extend(deps.iter().filter_map(Value::as_str).map(requirement_name));
                    }
                }
            }
        }

        // PEP 735; `{include-group = ...}` entries are tables and skipped
        if let Some(groups) = self.pyproject.get("dependency-groups").and_then(Value::as_table) {
            for specs in groups.values().filter_map(Value::as_array) {
                dev.extend(specs.iter().filter_map(Value::as_str).map(requirement_name));
            }
        }

        main.sort();
        main.dedup();
        dev.sort();
        dev.dedup();
        (main, dev)
    }

    pub fn detect_test_framework(
        &self,
        dev_deps: &[String],
    ) -> DetectedValue<DetectedTestFramework> {
        let has_config = self.has_tool("pytest");
        if contains_dep(dev_deps, "pytest") {
            if has_config {
                return DetectedValue::high(
                    DetectedTestFramework::Pytest,
                    "dependencies + [tool.pytest]",
                );
            }
            return DetectedValue::high(DetectedTestFramework::Pytest, "pytest in dependencies");
        }
        if has_config {
            return DetectedValue::medium(
                DetectedTestFramework::Pytest,
                "pyproject.toml [tool.pytest]",
            );
        }
        if self.exists("pytest.ini") || self.exists("conftest.py") {
            return DetectedValue::medium(
                DetectedTestFramework::Pytest,
                "pytest.ini or conftest.py exists",
            );
        }
        if self.exists("tests/conftest.py") {
            return DetectedValue::medium(DetectedTestFramework::Pytest, "tests/conftest.py exists");
        }
        DetectedValue::medium(DetectedTestFramework::None, "no test framework detected")
    }

    pub fn detect_linter(&self, dev_deps: &[String]) -> DetectedValue<DetectedLinter> {
        let ruff_config = self.has_tool("ruff");
        if ruff_config || contains_dep(dev_deps, "ruff") {
            if ruff_config {
                return DetectedValue::high(DetectedLinter::Ruff, "ruff in config + dependencies");
            }
            return DetectedValue::high(DetectedLinter::Ruff, "ruff in dependencies");
        }
        if self.has_tool("black") || contains_dep(dev_deps, "black") {
            return DetectedValue::high(DetectedLinter::Black, "black in dependencies/config");
        }
        if contains_dep(dev_deps, "flake8") {
            return DetectedValue::medium(DetectedLinter::Flake8, "flake8 in dependencies");
        }
        if self.exists(".flake8") {
            return DetectedValue::medium(DetectedLinter::Flake8, ".flake8 exists");
        }
        DetectedValue::medium(DetectedLinter::None, "no linter detected")
    }

    pub fn detect_type_checker(&self, dev_deps: &[String]) -> DetectedValue<DetectedTypeChecker> {
        let mypy_config = self.has_tool("mypy");
        if mypy_config || contains_dep(dev_deps, "mypy") {
            if mypy_config {
                return DetectedValue::high(
                    DetectedTypeChecker::Mypy,
                    "mypy in config + dependencies",
                );
            }
            return DetectedValue::high(DetectedTypeChecker::Mypy, "mypy in dependencies");
        }
        if self.has_tool("pyright") || contains_dep(dev_deps, "pyright") {
            return DetectedValue::high(
                DetectedTypeChecker::Pyright,
                "pyright in dependencies/config",
            );
        }
        if self.exists("mypy.ini") {
            return DetectedValue::medium(DetectedTypeChecker::Mypy, "mypy.ini exists");
        }
        if self.exists("pyrightconfig.json") {
            return DetectedValue::medium(DetectedTypeChecker::Pyright, "pyrightconfig.json exists");
        }
        DetectedValue::medium(DetectedTypeChecker::None, "no type checker detected")
    }

    pub fn detect_line_length(&self) -> DetectedValue<i64> {
        for tool in ["ruff", "black"] {
            if let Some(len) = self
                .tool(tool)
                .and_then(|t| t.get("line-length"))
                .and_then(Value::as_integer)
            {
                return DetectedValue::high(
                    len,
                    format!("pyproject.toml [tool.{}.line-length]", tool),
                );
            }
        }
        DetectedValue::low(DEFAULT_LINE_LENGTH, "default value")
    }

    /// Filesystem-only probes; these run with or without a manifest.
    pub fn probe_structure(&self, analysis: &mut ProjectAnalysis) {
        let tests_dir = self.project_dir.join("tests");
        analysis.has_tests_dir = tests_dir.is_dir();
        analysis.existing_tests = list_files(&tests_dir, |name| {
            name.starts_with("test_") && name.ends_with(".py")
        });

        let github_dir = self.project_dir.join(".github");
        analysis.has_github_dir = github_dir.is_dir();
        if analysis.has_github_dir {
            analysis.existing_workflows = list_files(&github_dir.join("workflows"), |name| {
                name.ends_with(".yml") || name.ends_with(".yaml")
            });
            analysis.has_dependabot = github_dir.join("dependabot.yml").exists()
                || github_dir.join("dependabot.yaml").exists();
        }

        analysis.has_gitignore = self.exists(".gitignore");
        analysis.has_src_layout = self.project_dir.join("src").is_dir();

        let mut source_dirs = Vec::new();
        if analysis.has_src_layout {
            source_dirs.push("src".to_string());
        }
        source_dirs.extend(
            list_dirs(&self.project_dir)
                .into_iter()
                .filter(|name| !name.starts_with('.') && !name.starts_with('_'))
                .filter(|name| self.project_dir.join(name).join("__init__.py").exists()),
        );
        analysis.source_dirs = source_dirs;
    }

    fn directory_name(&self) -> String {
        self.project_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Fixed policy deciding which fields must be asked for or defaulted.
pub fn determine_missing_fields(analysis: &ProjectAnalysis) -> Vec<MissingField> {
    let mut missing = Vec::new();

    if analysis.project_name.is_none() {
        missing.push(MissingField::required("project_name", "Project name"));
    }

    let python_unreliable = analysis
        .python_version
        .as_ref()
        .map_or(true, |v| v.confidence == Confidence::Low);
    if python_unreliable {
        missing.push(
            MissingField::required("python_version", "Minimum Python version")
                .with_default(DEFAULT_PYTHON_VERSION)
                .with_choices(PYTHON_VERSION_CHOICES),
        );
    }

    let no_tests = analysis
        .test_framework
        .as_ref()
        .map_or(true, |v| v.value == DetectedTestFramework::None);
    if no_tests {
        missing.push(
            MissingField::optional("test_framework", "Testing framework to use")
                .with_default(DEFAULT_TEST_FRAMEWORK)
                .with_choices(&["pytest", "unittest", "none"]),
        );
    }

    let no_linter = analysis
        .linter
        .as_ref()
        .map_or(true, |v| v.value == DetectedLinter::None);
    if no_linter {
        missing.push(
            MissingField::optional("linter", "Linting/formatting tool")
                .with_default(DEFAULT_LINTER)
                .with_choices(&["ruff", "black", "none"]),
        );
    }

    missing
}

/// Analyze the project rooted at `project_dir`.
pub fn analyze_project(project_dir: &Path) -> ProjectAnalysis {
    ProjectAnalyzer::new(project_dir).analyze()
}

fn load_manifest(path: &Path) -> Table {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read manifest");
            return Table::new();
        }
    };
    match contents.parse::<Table>() {
        Ok(table) => table,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to parse manifest");
            Table::new()
        }
    }
}

fn contains_dep(deps: &[String], name: &str) -> bool {
    deps.iter().any(|d| d.eq_ignore_ascii_case(name))
}

fn list_dirs(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .into_iter()
        .flatten()
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_dir())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

fn list_files(dir: &Path, keep: impl Fn(&str) -> bool) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .into_iter()
        .flatten()
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_file())
        .filter(|entry| keep(&entry.file_name().to_string_lossy()))
        .map(|entry| entry.path())
        .collect();
    files.sort();
    files
}
