//! Presets compiled into the binary

/// Bundled presets as `(name, TOML source)`, sorted by name
pub const BUNDLED_PRESETS: &[(&str, &str)] = &[
    ("cli-tool", include_str!("../../presets/cli-tool.toml")),
    ("data-science", include_str!("../../presets/data-science.toml")),
    ("discord-bot", include_str!("../../presets/discord-bot.toml")),
    ("empty-package", include_str!("../../presets/empty-package.toml")),
];

/// Look up a bundled preset, returning its static name and TOML source.
pub fn bundled_preset(name: &str) -> Option<(&'static str, &'static str)> {
    BUNDLED_PRESETS
        .iter()
        .find(|(bundled, _)| *bundled == name)
        .copied()
}
