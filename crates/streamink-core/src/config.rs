//! Viewer configuration, loaded from JSON.
//!
//! Every field has a default, so an empty object (or no file at all) yields a
//! working configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// What to do with a frame whose type tag is not known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownActionPolicy {
    /// Fail with a not-implemented error.
    #[default]
    Reject,
    /// Skip the frame using its declared length.
    Skip,
}

/// What to do when a recorded-page buffer declares a negative length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptLengthPolicy {
    /// Fail the whole buffer.
    #[default]
    Abort,
    /// Keep the records read before the corruption.
    Truncate,
}

fn default_max_frame_length() -> usize {
    16 * 1024 * 1024
}

/// Wire codec settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    pub unknown_action: UnknownActionPolicy,
    pub corrupt_length: CorruptLengthPolicy,
    /// Frames declaring more bytes than this are rejected before reading.
    #[serde(default = "default_max_frame_length")]
    pub max_frame_length: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            unknown_action: UnknownActionPolicy::default(),
            corrupt_length: CorruptLengthPolicy::default(),
            max_frame_length: default_max_frame_length(),
        }
    }
}

/// Stream action player settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Upper bound of actions applied per animation frame; `None` drains
    /// the whole queue.
    pub max_actions_per_frame: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub codec: CodecConfig,
    pub player: PlayerConfig,
}

impl Config {
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        let config = Self::from_json(&json)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse {}: {}", path.display(), e)))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.codec.unknown_action, UnknownActionPolicy::Reject);
        assert_eq!(config.codec.corrupt_length, CorruptLengthPolicy::Abort);
        assert_eq!(config.player.max_actions_per_frame, None);
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_json(r#"{"codec": {"unknown_action": "skip"}, "player": {"max_actions_per_frame": 8}}"#)
            .unwrap();
        assert_eq!(config.codec.unknown_action, UnknownActionPolicy::Skip);
        assert_eq!(config.codec.max_frame_length, 16 * 1024 * 1024);
        assert_eq!(config.player.max_actions_per_frame, Some(8));
    }

    #[test]
    fn test_json_roundtrip() {
        let mut config = Config::default();
        config.codec.corrupt_length = CorruptLengthPolicy::Truncate;
        let json = config.to_json().unwrap();
        assert_eq!(Config::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"codec": {{"corrupt_length": "truncate"}}}}"#).unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.codec.corrupt_length, CorruptLengthPolicy::Truncate);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(Config::load(dir.path().join("missing.json")), Err(ConfigError::Io(_))));

        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
    }
}
