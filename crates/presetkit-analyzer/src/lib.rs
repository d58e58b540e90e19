//! Heuristic analysis of existing Python projects.
//!
//! Reads a project's `pyproject.toml`, lock files and directory layout and
//! produces a [`ProjectAnalysis`]: every inferred fact is tagged with a
//! [`Confidence`] and a human-readable source, and anything that could not
//! be inferred reliably is listed as a [`MissingField`].

mod analysis;
mod analyzer;
mod detected;
mod specifier;

pub use analysis::{
    DetectedLinter, DetectedTestFramework, DetectedTypeChecker, PackageManager, ProjectAnalysis,
};
pub use analyzer::{
    analyze_project, determine_missing_fields, ProjectAnalyzer, DEFAULT_LINE_LENGTH,
    DEFAULT_LINTER, DEFAULT_PYTHON_VERSION, DEFAULT_TEST_FRAMEWORK, MANIFEST_FILE,
    PYTHON_VERSION_CHOICES,
};
pub use detected::{Confidence, DetectedValue, MissingField};
pub use specifier::{parse_python_version_spec, requirement_name};
