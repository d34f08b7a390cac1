//! TOML configuration for the inspector.
//!
//! ```toml
//! [inspect]
//! log_level = "info"
//! format = "text"          # "text" | "json"
//! hex_dump_unknown = true
//! max_frame_size = 8192
//!
//! [listen]
//! bind_address = "0.0.0.0:13000"
//! ```
//!
//! Every field has a default, so a partial file (or no file at all) is valid.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error other than "not found".
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// How frame reports are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One human-readable line per frame.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Top-level inspector configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InspectConfig {
    #[serde(default)]
    pub inspect: InspectSettings,
    #[serde(default)]
    pub listen: ListenSettings,
}

/// Decoding and output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InspectSettings {
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub format: OutputFormat,
    /// Include the raw body bytes for frames with an unregistered identifier.
    #[serde(default = "default_true")]
    pub hex_dump_unknown: bool,
    /// Frames longer than this are reported as failures without decoding.
    #[serde(default = "default_max_frame_size")]
    pub max_frame_size: usize,
}

/// UDP listen-mode settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListenSettings {
    /// Address bound by `--listen` when no address is given on the command line.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_max_frame_size() -> usize {
    8192
}
fn default_bind_address() -> String {
    "0.0.0.0:13000".to_string()
}

impl Default for InspectSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            format: OutputFormat::default(),
            hex_dump_unknown: default_true(),
            max_frame_size: default_max_frame_size(),
        }
    }
}

impl Default for ListenSettings {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Loads the configuration from `path`.
///
/// Returns [`InspectConfig::default()`] when `path` is `None` or the file
/// does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: Option<&Path>) -> Result<InspectConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(InspectConfig::default());
    };

    match std::fs::read_to_string(path) {
        Ok(content) => parse_config(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(InspectConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Parses configuration from TOML text.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] if the TOML is malformed.
pub fn parse_config(content: &str) -> Result<InspectConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        // Arrange / Act
        let cfg = InspectConfig::default();

        // Assert
        assert_eq!(cfg.inspect.log_level, "info");
        assert_eq!(cfg.inspect.format, OutputFormat::Text);
        assert!(cfg.inspect.hex_dump_unknown);
        assert_eq!(cfg.inspect.max_frame_size, 8192);
        assert_eq!(cfg.listen.bind_address, "0.0.0.0:13000");
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let cfg = parse_config("[inspect]\nformat = \"json\"\n").unwrap();
        assert_eq!(cfg.inspect.format, OutputFormat::Json);
        assert_eq!(cfg.inspect.max_frame_size, 8192);
        assert_eq!(cfg.listen, ListenSettings::default());
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(parse_config("").unwrap(), InspectConfig::default());
    }

    #[test]
    fn test_unknown_format_is_parse_error() {
        let result = parse_config("[inspect]\nformat = \"xml\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_config_serializes_and_deserializes_round_trip() {
        // Arrange
        let mut cfg = InspectConfig::default();
        cfg.inspect.hex_dump_unknown = false;
        cfg.listen.bind_address = "127.0.0.1:9000".to_string();

        // Act
        let text = toml::to_string_pretty(&cfg).expect("serialize");
        let restored = parse_config(&text).expect("deserialize");

        // Assert
        assert_eq!(cfg, restored);
    }

    #[test]
    fn test_missing_path_yields_defaults() {
        assert_eq!(load_config(None).unwrap(), InspectConfig::default());
        let missing = std::env::temp_dir().join("vwire-inspect-does-not-exist.toml");
        assert_eq!(load_config(Some(&missing)).unwrap(), InspectConfig::default());
    }

    #[test]
    fn test_load_config_reads_file() {
        // Arrange
        let path = std::env::temp_dir().join(format!("vwire-inspect-{}.toml", std::process::id()));
        std::fs::write(&path, "[inspect]\nmax_frame_size = 1500\n").expect("write temp config");

        // Act
        let cfg = load_config(Some(&path));
        let _ = std::fs::remove_file(&path);

        // Assert
        assert_eq!(cfg.unwrap().inspect.max_frame_size, 1500);
    }
}
