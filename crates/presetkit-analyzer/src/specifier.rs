//! Version specifier and requirement string parsing.

use regex_lite::Regex;
use std::sync::OnceLock;

/// Patterns tried in order against a Python version constraint.
///
/// Covers `^3.11`, `>=3.11`, `~3.11`, `3.11.*`, `==3.11` and compound
/// constraints such as `>=3.11,<4`.
const PYTHON_VERSION_PATTERNS: &[&str] = &[
    r"[>=^~]*(\d+\.\d+)",
    r"(\d+\.\d+)\.\*",
    r"==(\d+\.\d+)",
];

fn python_version_regexes() -> &'static [Regex] {
    static REGEXES: OnceLock<Vec<Regex>> = OnceLock::new();
    REGEXES.get_or_init(|| {
        PYTHON_VERSION_PATTERNS
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect()
    })
}

/// Extract the minimum `major.minor` version from a constraint.
pub fn parse_python_version_spec(spec: &str) -> Option<String> {
    python_version_regexes()
        .iter()
        .find_map(|re| re.captures(spec))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Convert a ruff `target-version` such as `py311` into `3.11`.
pub fn parse_ruff_target_version(target: &str) -> Option<String> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^py(\d)(\d+)").ok()).as_ref()?;
    let caps = re.captures(target)?;
    Some(format!("{}.{}", caps.get(1)?.as_str(), caps.get(2)?.as_str()))
}

/// Name portion of a requirement string: `pkg[extra]>=1.0` -> `pkg`.
pub fn requirement_name(requirement: &str) -> String {
    let trimmed = requirement.trim();
    let end = trimmed
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.'))
        .unwrap_or(trimmed.len());
    if end == 0 {
        trimmed.to_string()
    } else {
        trimmed[..end].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_python_version_constraints() {
        let cases = [
            ("^3.11", "3.11"),
            (">=3.10", "3.10"),
            ("~3.12", "3.12"),
            ("3.11.*", "3.11"),
            ("==3.13", "3.13"),
            (">=3.9,<4", "3.9"),
        ];
        for (spec, expected) in cases {
            assert_eq!(
                parse_python_version_spec(spec).as_deref(),
                Some(expected),
                "spec {spec}"
            );
        }
    }

    #[test]
    fn test_python_version_unparseable() {
        assert_eq!(parse_python_version_spec("*"), None);
        assert_eq!(parse_python_version_spec(""), None);
    }

    #[test]
    fn test_ruff_target_version() {
        assert_eq!(parse_ruff_target_version("py311").as_deref(), Some("3.11"));
        assert_eq!(parse_ruff_target_version("py39").as_deref(), Some("3.9"));
        assert_eq!(parse_ruff_target_version("3.11"), None);
    }

    #[test]
    fn test_requirement_name() {
        assert_eq!(requirement_name("requests"), "requests");
        assert_eq!(requirement_name("pytest-cov>=4.0"), "pytest-cov");
        assert_eq!(requirement_name("uvicorn[standard] >= 0.20"), "uvicorn");
        assert_eq!(requirement_name("zope.interface==6"), "zope.interface");
    }
}
