// Engine settings, readable from a small TOML file:
//
//   max_states = 10     # undo/redo depth
//   diagnostics = true  # report ignored operations on the event channel

use crate::error::{Error, Result};
use crate::history::MAX_STATES;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Depth of each history stack.
    #[serde(default = "default_max_states")]
    pub max_states: usize,
    /// When set, operations skipped on an unbound engine are reported as errors.
    #[serde(default = "default_diagnostics")]
    pub diagnostics: bool,
}

fn default_max_states() -> usize {
    MAX_STATES
}

fn default_diagnostics() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { max_states: default_max_states(), diagnostics: default_diagnostics() }
    }
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_states == 0 {
            return Err(Error::Config("max_states must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.max_states, 10);
        assert!(config.diagnostics);
    }

    #[test]
    fn fields_are_read() {
        let config = EngineConfig::from_toml_str("max_states = 3\ndiagnostics = false").unwrap();
        assert_eq!(config.max_states, 3);
        assert!(!config.diagnostics);
    }

    #[test]
    fn zero_depth_and_typos_are_rejected() {
        assert!(matches!(
            EngineConfig::from_toml_str("max_states = 0"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("max_state = 4"),
            Err(Error::Config(_))
        ));
    }
}
