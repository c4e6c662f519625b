//! Tunable engine heuristics.
//!
//! Loaded from the `[engine]` table of a TOML file. Every key is optional and
//! falls back to the defaults below.
//!
//! ```toml
//! [engine]
//! fuzzy_threshold = 0.8
//! min_fuzzy_words = 5
//! context_window = 12
//! edit_cost = 4
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum fraction of target words found in a candidate for a fuzzy match.
    pub fuzzy_threshold: f64,
    /// Fuzzy matching is only attempted for targets with more words than this.
    pub min_fuzzy_words: usize,
    /// Characters of surrounding context used to pin down a span in live text.
    pub context_window: usize,
    /// Equalities shorter than this are folded into neighbouring edits.
    pub edit_cost: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 0.80,
            min_fuzzy_words: 5,
            context_window: 12,
            edit_cost: 4,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    engine: EngineConfig,
}

impl EngineConfig {
    /// Parses a TOML document and validates the `[engine]` table.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` on malformed TOML and `ConfigError::Invalid`
    /// when a value is out of range.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(raw)?;
        file.engine.validate()?;
        Ok(file.engine)
    }

    /// Reads and parses the config file at `path`.
    ///
    /// A missing file yields the defaults; any other I/O failure is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(raw) => Self::from_toml_str(&raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fuzzy_threshold > 0.0 && self.fuzzy_threshold <= 1.0) {
            return Err(ConfigError::Invalid {
                key: "fuzzy_threshold",
                reason: format!("{} is not in (0, 1]", self.fuzzy_threshold),
            });
        }
        if self.edit_cost == 0 {
            return Err(ConfigError::Invalid {
                key: "edit_cost",
                reason: "must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn partial_table_overrides_only_given_keys() {
        let cfg = EngineConfig::from_toml_str("[engine]\ncontext_window = 4\n").unwrap();
        assert_eq!(cfg.context_window, 4);
        assert_eq!(cfg.edit_cost, 4);
        assert!((cfg.fuzzy_threshold - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let err = EngineConfig::from_toml_str("[engine]\nfuzzy_threshold = 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "fuzzy_threshold", .. }));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = EngineConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, EngineConfig::default());
    }
}
