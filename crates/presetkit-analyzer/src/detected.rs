//! Confidence-tagged detections and missing-field records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How much corroborating evidence backs a detected value.
///
/// Variants are declared in ascending order so the derived `Ord` gives
/// `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value inferred from the project on disk, with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedValue<T> {
    pub value: T,
    pub confidence: Confidence,
    /// Where the value was read from, e.g. `pyproject.toml [project.name]`
    pub source: String,
}

impl<T> DetectedValue<T> {
    pub fn new(value: T, confidence: Confidence, source: impl Into<String>) -> Self {
        Self {
            value,
            confidence,
            source: source.into(),
        }
    }

    pub fn high(value: T, source: impl Into<String>) -> Self {
        Self::new(value, Confidence::High, source)
    }

    pub fn medium(value: T, source: impl Into<String>) -> Self {
        Self::new(value, Confidence::Medium, source)
    }

    pub fn low(value: T, source: impl Into<String>) -> Self {
        Self::new(value, Confidence::Low, source)
    }

    /// Reliable enough to use without asking.
    pub fn is_reliable(&self) -> bool {
        self.confidence == Confidence::High
    }
}

impl<T: Serialize> DetectedValue<T> {
    /// Type-erase the value so detections of different types can be listed together.
    pub fn to_json(&self) -> DetectedValue<serde_json::Value> {
        DetectedValue {
            value: serde_json::to_value(&self.value).unwrap_or(serde_json::Value::Null),
            confidence: self.confidence,
            source: self.source.clone(),
        }
    }
}

/// A configuration value that could not be inferred reliably.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingField {
    pub name: String,
    pub description: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
}

impl MissingField {
    pub fn required(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            required: true,
            default: None,
            choices: None,
        }
    }

    pub fn optional(name: &str, description: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name, description)
        }
    }

    pub fn with_default(mut self, default: &str) -> Self {
        self.default = Some(default.to_string());
        self
    }

    pub fn with_choices(mut self, choices: &[&str]) -> Self {
        self.choices = Some(choices.iter().map(|c| c.to_string()).collect());
        self
    }
}
