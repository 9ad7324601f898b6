//! Configuration management
//!
//! Loads the optional YAML configuration file. Mappings are compiled in and
//! never read from here; the file only selects devices and logging.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use tokio::fs;

use crate::error::ConfigError;
use crate::gamepad::BackendKind;
use crate::input::PortSelector;

/// Default configuration file, looked up in the working directory
pub const DEFAULT_CONFIG_PATH: &str = "midi-pad.yaml";

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub midi: MidiConfig,
    #[serde(default)]
    pub gamepad: GamepadConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// MIDI port configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MidiConfig {
    /// Port index (`0`) or name substring (`beatstep`)
    #[serde(default = "default_input_port", deserialize_with = "port_string")]
    pub input_port: String,
}

/// Virtual gamepad configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct GamepadConfig {
    #[serde(default)]
    pub backend: BackendKind,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            midi: MidiConfig::default(),
            gamepad: GamepadConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            input_port: default_input_port(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).await.map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Self::parse(&contents, &path.display().to_string())
    }

    /// Load the file if it exists, defaults otherwise
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if fs::try_exists(path).await.unwrap_or(false) {
            Self::load(path).await
        } else {
            Ok(Self::default())
        }
    }

    fn parse(contents: &str, origin: &str) -> Result<Self, ConfigError> {
        // An empty file deserializes to unit, not to a mapping
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    pub fn input_selector(&self) -> PortSelector {
        self.midi.input_port.parse().unwrap_or_default()
    }
}

/// Accept the port as either a YAML number or a string
fn port_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Index(u64),
        Name(String),
    }

    Ok(match Port::deserialize(deserializer)? {
        Port::Index(index) => index.to_string(),
        Port::Name(name) => name,
    })
}

// Default value functions
fn default_input_port() -> String { "0".to_string() }
fn default_log_level() -> String { "info".to_string() }

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_load_full_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "midi:\n  input_port: beatstep\ngamepad:\n  backend: log\nlog_level: debug"
        )
        .unwrap();

        let config = AppConfig::load(file.path()).await.unwrap();

        assert_eq!(config.midi.input_port, "beatstep");
        assert_eq!(config.gamepad.backend, BackendKind::Log);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.input_selector(), PortSelector::Name("beatstep".to_string()));
    }

    #[tokio::test]
    async fn test_partial_config_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "gamepad:\n  backend: uinput").unwrap();

        let config = AppConfig::load(file.path()).await.unwrap();

        assert_eq!(config.midi.input_port, "0");
        assert_eq!(config.input_selector(), PortSelector::Index(0));
        assert_eq!(config.gamepad.backend, BackendKind::Uinput);
        assert_eq!(config.log_level, "info");
    }

    #[tokio::test]
    async fn test_numeric_port_index() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "midi:\n  input_port: 2").unwrap();

        let config = AppConfig::load(file.path()).await.unwrap();

        assert_eq!(config.input_selector(), PortSelector::Index(2));
    }

    #[tokio::test]
    async fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_or_default(dir.path().join("absent.yaml")).await.unwrap();

        assert_eq!(config.midi.input_port, "0");
        assert_eq!(config.gamepad.backend, BackendKind::Auto);
        assert_eq!(config.log_level, "info");
    }

    #[tokio::test]
    async fn test_empty_file_is_default() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = AppConfig::load(file.path()).await.unwrap();
        assert_eq!(config.log_level, "info");
    }

    #[tokio::test]
    async fn test_invalid_yaml_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "gamepad:\n  backend: joystick").unwrap();

        let err = AppConfig::load(file.path()).await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(dir.path().join("absent.yaml")).await.unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
