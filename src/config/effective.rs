//! Resolved project configuration with provenance
//!
//! Runs the creation path end to end and records which layers contributed.

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::defaults::UserDefaults;
use super::overrides::{apply_overrides, OverrideSet};
use super::merge::set_path;
use super::ResolverContext;
use crate::model::{package_name_for, replace_placeholders, ResolvedConfig};
use crate::preset::{load_preset, resolve_chain_with_names};

/// Origin of a configuration layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ConfigOrigin {
    Preset,
    UserDefaults,
    Overrides,
}

/// A contributing layer with provenance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    /// Preset name (presets only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ConfigSource {
    pub fn preset(name: impl Into<String>) -> Self {
        Self {
            origin: ConfigOrigin::Preset,
            name: Some(name.into()),
        }
    }

    pub fn user_defaults() -> Self {
        Self {
            origin: ConfigOrigin::UserDefaults,
            name: None,
        }
    }

    pub fn overrides() -> Self {
        Self {
            origin: ConfigOrigin::Overrides,
            name: None,
        }
    }

    /// Short label, e.g. `preset:cli-tool`
    pub fn label(&self) -> String {
        match (&self.origin, &self.name) {
            (ConfigOrigin::Preset, Some(name)) => format!("preset:{}", name),
            (ConfigOrigin::Preset, None) => "preset".to_string(),
            (ConfigOrigin::UserDefaults, _) => "user-defaults".to_string(),
            (ConfigOrigin::Overrides, _) => "overrides".to_string(),
        }
    }
}

/// Resolved configuration plus the layers that produced it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedProject {
    pub config: ResolvedConfig,

    /// Contributing sources in precedence order (lowest first)
    pub sources: Vec<ConfigSource>,
}

impl ResolvedProject {
    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Resolve the configuration for a new project.
///
/// Layers, lowest precedence first: the preset chain, user defaults
/// (fill-only), explicit overrides, then the project name itself.
pub fn build_project_config(
    ctx: &ResolverContext,
    project_name: &str,
    preset_name: &str,
    overrides: &OverrideSet,
    custom_preset_path: Option<&Path>,
) -> Result<ResolvedProject, ResolveError> {
    let preset = load_preset(ctx, preset_name, custom_preset_path)?;
    let (tree, chain) = resolve_chain_with_names(ctx, &preset)?;
    let mut sources: Vec<ConfigSource> = chain.into_iter().map(ConfigSource::preset).collect();

    let defaults = UserDefaults::load(&ctx.user_config_path);
    let tree = if defaults.is_empty() {
        tree
    } else {
        sources.push(ConfigSource::user_defaults());
        defaults.apply(tree)
    };

    let mut tree = if overrides.is_empty() {
        tree
    } else {
        sources.push(ConfigSource::overrides());
        apply_overrides(tree, overrides)
    };

    set_path(
        &mut tree,
        &["metadata", "name"],
        Value::String(project_name.to_string()),
    );
    let tree = replace_placeholders(tree, project_name, &package_name_for(project_name));

    debug!(
        project = project_name,
        sources = sources.len(),
        "materializing configuration"
    );
    let config = ResolvedConfig::from_tree(tree)?;

    Ok(ResolvedProject { config, sources })
}

/// Resolution errors
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("preset '{0}' not found")]
    PresetNotFound(String),

    #[error("cyclic preset chain: {}", chain.join(" -> "))]
    CyclicPresetChain { chain: Vec<String> },

    #[error("missing required field: {0}")]
    MissingRequiredField(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization failed: {0}")]
    Serialize(String),
}
