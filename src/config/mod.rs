//! Layered configuration resolution
//!
//! A project configuration is assembled from four layers, lowest first:
//! 1. Preset chain (root ancestor to leaf, `presets/*.toml`)
//! 2. User defaults (~/.config/presetkit/config.toml), fill-only
//! 3. Explicit overrides (CLI flags / API callers)
//! 4. Project name and placeholder substitution

mod defaults;
mod effective;
mod merge;
mod overrides;

use std::io;
use std::path::{Path, PathBuf};

use crate::preset::{bundled_preset, PresetSource};

pub use defaults::{UserDefaults, USER_DEFAULT_KEYS};
pub use effective::{
    build_project_config, ConfigOrigin, ConfigSource, ResolveError, ResolvedProject,
};
pub use merge::{
    deep_merge, extend_path, get_path, merge_layers, set_path, set_path_if_absent, strip_nulls,
    toml_to_json,
};
pub use overrides::{apply_overrides, OverrideSet, OVERRIDE_PATHS};

/// Environment variable overriding the `~/.config/presetkit` root
pub const CONFIG_DIR_ENV: &str = "PRESETKIT_CONFIG_DIR";

/// Filesystem locations consulted during resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverContext {
    /// User preset directory, searched first
    pub user_presets_dir: PathBuf,
    /// Extra preset directory searched after the user directory and before
    /// the presets compiled into the binary
    pub builtin_presets_dir: Option<PathBuf>,
    /// User defaults file
    pub user_config_path: PathBuf,
}

impl ResolverContext {
    /// Context rooted at an explicit configuration directory.
    pub fn new(config_dir: impl AsRef<Path>) -> Self {
        let config_dir = config_dir.as_ref();
        Self {
            user_presets_dir: config_dir.join("presets"),
            builtin_presets_dir: None,
            user_config_path: config_dir.join("config.toml"),
        }
    }

    /// Context for the current user (`$PRESETKIT_CONFIG_DIR` or `~/.config/presetkit`).
    pub fn from_env() -> Result<Self, ResolveError> {
        Ok(Self::new(Self::default_config_dir()?))
    }

    /// Get the default configuration directory
    pub fn default_config_dir() -> Result<PathBuf, ResolveError> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
            return Ok(PathBuf::from(dir));
        }
        let home = std::env::var("HOME").map_err(|_| {
            ResolveError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                "HOME environment variable not set",
            ))
        })?;
        Ok(PathBuf::from(home).join(".config/presetkit"))
    }

    pub fn with_user_presets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.user_presets_dir = dir.into();
        self
    }

    pub fn with_builtin_presets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.builtin_presets_dir = Some(dir.into());
        self
    }

    pub fn with_user_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.user_config_path = path.into();
        self
    }

    /// Locate `<name>.toml` on disk, user directory first.
    pub fn find_preset_file(&self, name: &str) -> Option<PathBuf> {
        let file_name = format!("{}.toml", name);
        std::iter::once(&self.user_presets_dir)
            .chain(self.builtin_presets_dir.as_ref())
            .map(|dir| dir.join(&file_name))
            .find(|path| path.is_file())
    }

    /// Locate a preset by name, falling back to the bundled presets.
    pub fn find_preset(&self, name: &str) -> Option<PresetSource> {
        self.find_preset_file(name)
            .map(PresetSource::File)
            .or_else(|| bundled_preset(name).map(|(name, _)| PresetSource::Bundled(name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_new_layout() {
        let ctx = ResolverContext::new("/home/u/.config/presetkit");
        assert_eq!(
            ctx.user_presets_dir,
            PathBuf::from("/home/u/.config/presetkit/presets")
        );
        assert_eq!(
            ctx.user_config_path,
            PathBuf::from("/home/u/.config/presetkit/config.toml")
        );
        assert_eq!(ctx.builtin_presets_dir, None);
    }

    #[test]
    fn test_find_preset_file_prefers_user_dir() {
        let user = TempDir::new().unwrap();
        let builtin = TempDir::new().unwrap();
        fs::write(builtin.path().join("base.toml"), "").unwrap();
        fs::write(builtin.path().join("shared.toml"), "").unwrap();
        fs::write(user.path().join("shared.toml"), "").unwrap();

        let ctx = ResolverContext::new(user.path())
            .with_user_presets_dir(user.path())
            .with_builtin_presets_dir(builtin.path());

        assert_eq!(
            ctx.find_preset_file("shared"),
            Some(user.path().join("shared.toml"))
        );
        assert_eq!(
            ctx.find_preset_file("base"),
            Some(builtin.path().join("base.toml"))
        );
        assert_eq!(ctx.find_preset_file("nope"), None);
    }

    #[test]
    fn test_bundled_presets_need_no_directory() {
        let empty = TempDir::new().unwrap();
        let ctx = ResolverContext::new("/nonexistent").with_builtin_presets_dir(empty.path());

        assert_eq!(ctx.find_preset_file("empty-package"), None);
        assert_eq!(
            ctx.find_preset("empty-package"),
            Some(PresetSource::Bundled("empty-package"))
        );
        assert_eq!(ctx.find_preset("cli-tool"), Some(PresetSource::Bundled("cli-tool")));
        assert_eq!(ctx.find_preset("nope"), None);
    }

    #[test]
    fn test_preset_directory_shadows_bundled() {
        let builtin = TempDir::new().unwrap();
        fs::write(builtin.path().join("cli-tool.toml"), "").unwrap();
        let ctx = ResolverContext::new("/nonexistent").with_builtin_presets_dir(builtin.path());

        assert_eq!(
            ctx.find_preset("cli-tool"),
            Some(PresetSource::File(builtin.path().join("cli-tool.toml")))
        );
    }
}
