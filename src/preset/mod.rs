//! Preset loading and chain resolution
//!
//! A preset is a TOML file holding a partial configuration tree plus three
//! identity keys (`name`, `description`, `base`). `base` names a parent
//! preset whose resolved tree the child is merged over.

mod bundled;

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::{deep_merge, toml_to_json, ResolveError, ResolverContext};

pub use bundled::{bundled_preset, BUNDLED_PRESETS};

const IDENTITY_KEYS: [&str; 3] = ["name", "description", "base"];

/// Where a preset's TOML came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresetSource {
    File(PathBuf),
    /// Compiled into the binary, by name
    Bundled(&'static str),
}

impl PresetSource {
    fn read(&self) -> io::Result<Vec<u8>> {
        match self {
            Self::File(path) => fs::read(path),
            Self::Bundled(name) => Ok(bundled_preset(name)
                .map(|(_, content)| content.as_bytes().to_vec())
                .unwrap_or_default()),
        }
    }
}

impl fmt::Display for PresetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Bundled(name) => write!(f, "bundled:{}", name),
        }
    }
}

/// A single preset file
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    pub name: String,
    pub description: String,
    /// Parent preset name
    pub base: Option<String>,
    /// Partial configuration contributed by this preset alone
    pub fields: Map<String, Value>,
    /// Set when loaded through [`load_preset`]
    pub source: Option<PresetSource>,
}

impl Preset {
    /// Preset with no fields and no parent
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            base: None,
            fields: Map::new(),
            source: None,
        }
    }

    /// Split identity keys out of a parsed preset tree.
    ///
    /// `fallback_name` is used when the tree does not name itself.
    pub fn from_tree(fallback_name: &str, tree: Value) -> Self {
        let Value::Object(mut fields) = tree else {
            return Self::empty(fallback_name);
        };

        let mut take_str = |key: &str| match fields.remove(key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s),
            _ => None,
        };
        let name = take_str(IDENTITY_KEYS[0]).unwrap_or_else(|| fallback_name.to_string());
        let description = take_str(IDENTITY_KEYS[1]).unwrap_or_default();
        let base = take_str(IDENTITY_KEYS[2]);

        Self {
            name,
            description,
            base,
            fields,
            source: None,
        }
    }

    /// Parse preset TOML text
    pub fn parse(fallback_name: &str, content: &str) -> Result<Self, toml::de::Error> {
        let table: toml::Table = toml::from_str(content)?;
        Ok(Self::from_tree(
            fallback_name,
            toml_to_json(toml::Value::Table(table)),
        ))
    }
}

/// Load a preset by name, or from `custom_path` when that file exists.
///
/// A file that exists but is not valid UTF-8 TOML is logged and yields an
/// empty preset, so it contributes nothing.
pub fn load_preset(
    ctx: &ResolverContext,
    name: &str,
    custom_path: Option<&Path>,
) -> Result<Preset, ResolveError> {
    let source = match custom_path.filter(|p| p.is_file()) {
        Some(path) => PresetSource::File(path.to_path_buf()),
        None => ctx
            .find_preset(name)
            .ok_or_else(|| ResolveError::PresetNotFound(name.to_string()))?,
    };
    load_from(name, source)
}

fn load_from(name: &str, source: PresetSource) -> Result<Preset, ResolveError> {
    let bytes = source.read()?;
    let parsed = match String::from_utf8(bytes) {
        Ok(content) => Preset::parse(name, &content).map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };

    let preset = match parsed {
        Ok(preset) => {
            debug!(preset = %preset.name, source = %source, "loaded preset");
            preset
        }
        Err(error) => {
            warn!(preset = name, source = %source, %error, "ignoring malformed preset");
            Preset::empty(name)
        }
    };
    Ok(Preset {
        source: Some(source),
        ..preset
    })
}

/// Resolve a preset and all of its ancestors into one partial tree.
pub fn resolve_chain(ctx: &ResolverContext, preset: &Preset) -> Result<Value, ResolveError> {
    Ok(resolve_chain_with_names(ctx, preset)?.0)
}

/// Like [`resolve_chain`], also returning chain names from root to leaf.
///
/// A chain is cyclic when a link would load a source already in the chain.
/// Names alone do not identify a link: a custom preset file may share its
/// name with the base it extends.
pub fn resolve_chain_with_names(
    ctx: &ResolverContext,
    preset: &Preset,
) -> Result<(Value, Vec<String>), ResolveError> {
    let mut visited: Vec<(Option<PresetSource>, String)> =
        vec![(preset.source.clone(), preset.name.clone())];
    let mut chain = vec![preset.clone()];

    while let Some(base) = chain.last().and_then(|p| p.base.clone()) {
        let source = ctx
            .find_preset(&base)
            .ok_or_else(|| ResolveError::PresetNotFound(base.clone()))?;
        if visited.iter().any(|(seen, _)| seen.as_ref() == Some(&source)) {
            let mut names: Vec<String> = visited.into_iter().map(|(_, name)| name).collect();
            names.push(base);
            return Err(ResolveError::CyclicPresetChain { chain: names });
        }
        let parent = load_from(&base, source.clone())?;
        visited.push((Some(source), base));
        chain.push(parent);
    }

    let mut tree = Value::Object(Map::new());
    let mut names = Vec::with_capacity(chain.len());
    for link in chain.into_iter().rev() {
        debug!(preset = %link.name, "merging preset");
        tree = deep_merge(tree, Value::Object(link.fields));
        names.push(link.name);
    }
    Ok((tree, names))
}

/// A preset available for selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresetSummary {
    pub name: String,
    pub description: String,
    /// Defined in the user preset directory
    pub user: bool,
}

/// List every available preset. Directory presets shadow bundled ones and
/// user presets shadow both.
pub fn list_presets(ctx: &ResolverContext) -> Vec<PresetSummary> {
    let mut found = BTreeMap::new();
    let mut record = |name: String, description: String, user: bool| {
        found.insert(
            name.clone(),
            PresetSummary {
                name,
                description,
                user,
            },
        );
    };

    for (name, content) in BUNDLED_PRESETS {
        record(name.to_string(), describe(name, content), false);
    }
    let dirs = ctx
        .builtin_presets_dir
        .iter()
        .map(|dir| (dir, false))
        .chain([(&ctx.user_presets_dir, true)]);
    for (dir, user) in dirs {
        for (name, description) in scan_dir(dir) {
            record(name, description, user);
        }
    }
    found.into_values().collect()
}

fn describe(name: &str, content: &str) -> String {
    Preset::parse(name, content)
        .map(|preset| preset.description)
        .unwrap_or_default()
}

fn scan_dir(dir: &Path) -> Vec<(String, String)> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
        .filter_map(|path| {
            let name = path.file_stem()?.to_str()?.to_string();
            let description = fs::read_to_string(&path)
                .map(|content| describe(&name, &content))
                .unwrap_or_default();
            Some((name, description))
        })
        .collect()
}
