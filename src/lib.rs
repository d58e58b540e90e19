//! presetkit - layered configuration for Python project scaffolding
//!
//! Resolves a fully-typed project configuration from a chain of presets,
//! the user's personal defaults and explicit overrides, and builds the
//! configuration for adding tooling to an existing project from a
//! heuristic analysis of it.

pub mod augment;
pub mod config;
pub mod model;
pub mod preset;

pub use augment::{AugmentConfig, AugmentConfigBuilder, Prompter, TerminalPrompter};
pub use config::{
    apply_overrides, build_project_config, deep_merge, OverrideSet, ResolveError,
    ResolvedProject, ResolverContext, UserDefaults,
};
pub use model::{
    package_name_for, replace_placeholders, resolved_config_schema, ParseEnumError,
    ResolvedConfig,
};
pub use preset::{list_presets, load_preset, resolve_chain, Preset, PresetSource, PresetSummary};

pub use presetkit_analyzer as analyzer;
pub use presetkit_analyzer::{analyze_project, ProjectAnalysis};
