//! Rendering options
//!
//! Options come from JSON files given on the command line. Each file holds
//! one object whose top-level keys replace those of earlier files.
//! `include_private` and `legacy_behavior` are typed fields. The markup
//! options (`link_prefix`, `default_namespace`, `external_marker`,
//! `convenience_header` and `replace_strings`) are checked when loaded and
//! otherwise passed through to the templates with every other key.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DoccaError, Result};

/// Merged options, visible to templates as `Config`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Document private members too
    #[serde(default)]
    pub include_private: bool,

    /// Keep the output layout of older docca versions
    #[serde(default = "default_legacy_behavior")]
    pub legacy_behavior: bool,

    /// Template-specific options
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_legacy_behavior() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            include_private: false,
            legacy_behavior: default_legacy_behavior(),
            extra: Map::new(),
        }
    }
}

impl Config {
    /// Merge the given files over the defaults, in order.
    ///
    /// # Errors
    ///
    /// Fails when a file cannot be read, is not a JSON object, or gives a
    /// built-in option a value of the wrong type.
    pub fn load(paths: &[PathBuf]) -> Result<Self> {
        let mut merged = Map::new();
        for path in paths {
            let text = fs::read_to_string(path).map_err(|source| DoccaError::Io {
                path: path.clone(),
                source,
            })?;
            overlay(&mut merged, &text, path)?;
        }
        Self::from_map(merged)
    }

    /// Options from JSON texts, merged in order.
    ///
    /// # Errors
    ///
    /// Fails when a text is not a JSON object or gives a built-in option a
    /// value of the wrong type.
    pub fn from_json<'a>(texts: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let mut merged = Map::new();
        for text in texts {
            overlay(&mut merged, text, Path::new("<inline>"))?;
        }
        Self::from_map(merged)
    }

    fn from_map(map: Map<String, Value>) -> Result<Self> {
        let config: Self = serde_json::from_value(Value::Object(map))
            .map_err(|e| DoccaError::Config(format!("invalid option: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for key in STRING_OPTIONS {
            if self.extra.get(key).is_some_and(|value| !value.is_string()) {
                return Err(DoccaError::Config(format!("{key} must be a string")));
            }
        }
        if let Some(value) = self.extra.get("replace_strings") {
            let valid = value
                .as_object()
                .is_some_and(|map| map.values().all(Value::is_string));
            if !valid {
                return Err(DoccaError::Config(
                    "replace_strings must map strings to strings".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Option by name, including the built-in ones.
    pub fn get(&self, key: &str) -> Option<Value> {
        match key {
            "include_private" => Some(Value::Bool(self.include_private)),
            "legacy_behavior" => Some(Value::Bool(self.legacy_behavior)),
            _ => self.extra.get(key).cloned(),
        }
    }

    /// String option, if set to a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }

    /// The `replace_strings` pairs, ordered by the text they replace.
    pub fn replace_strings(&self) -> Vec<(String, String)> {
        let Some(Value::Object(map)) = self.extra.get("replace_strings") else {
            return Vec::new();
        };
        let mut pairs: Vec<(String, String)> = map
            .iter()
            .filter_map(|(from, to)| Some((from.clone(), to.as_str()?.to_string())))
            .collect();
        pairs.sort();
        pairs
    }
}

const STRING_OPTIONS: [&str; 4] = [
    "link_prefix",
    "default_namespace",
    "external_marker",
    "convenience_header",
];

fn overlay(merged: &mut Map<String, Value>, text: &str, origin: &Path) -> Result<()> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| DoccaError::Config(format!("{}: {e}", origin.display())))?;
    let Value::Object(object) = value else {
        return Err(DoccaError::Config(format!(
            "{}: top level must be an object",
            origin.display()
        )));
    };
    merged.extend(object);
    Ok(())
}
