//! Application configuration.
//!
//! Read from `<config dir>/doodle-recognizer/config.json` when present. Every
//! field is optional in the file; `DOODLE_MODEL` and `DOODLE_LABELS` override
//! the model paths.

use doodle_classifier::InputSpec;
use doodle_core::{DEFAULT_STROKE_WIDTH, SerializableColor};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable overriding [`AppConfig::model_path`].
pub const MODEL_ENV: &str = "DOODLE_MODEL";
/// Environment variable overriding [`AppConfig::labels_path`].
pub const LABELS_ENV: &str = "DOODLE_LABELS";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Invalid config file {path}: {reason}")]
    Parse { path: String, reason: String },
    #[error("Invalid color: {0}")]
    InvalidColor(String),
    #[error("No {0} configured (set it in the config file or via environment)")]
    Missing(&'static str),
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub stroke_width: f64,
    /// `#rrggbb`
    pub stroke_color: String,
    /// `#rrggbb`
    pub background_color: String,
    /// Margin around the exported drawing, in logical pixels.
    pub render_padding: f64,
    pub model_path: Option<PathBuf>,
    pub labels_path: Option<PathBuf>,
    pub model_input: InputSpec,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Doodle Recognizer".to_string(),
            width: 800,
            height: 800,
            stroke_width: DEFAULT_STROKE_WIDTH,
            stroke_color: "#000000".to_string(),
            background_color: "#ffffff".to_string(),
            render_padding: 0.0,
            model_path: None,
            labels_path: None,
            model_input: InputSpec::default(),
        }
    }
}

impl AppConfig {
    /// Default config file location.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("doodle-recognizer").join("config.json"))
    }

    /// Load from the default location (if it exists) and apply environment
    /// overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };
        config.apply_overrides(std::env::var(MODEL_ENV).ok(), std::env::var(LABELS_ENV).ok());
        Ok(config)
    }

    /// Load from a specific JSON file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        let config = Self::from_json(&text).map_err(|reason| ConfigError::Parse {
            path: path.display().to_string(),
            reason,
        })?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| e.to_string())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Replace the model and label paths with any provided overrides.
    pub fn apply_overrides(&mut self, model: Option<String>, labels: Option<String>) {
        if let Some(model) = model.filter(|s| !s.is_empty()) {
            self.model_path = Some(PathBuf::from(model));
        }
        if let Some(labels) = labels.filter(|s| !s.is_empty()) {
            self.labels_path = Some(PathBuf::from(labels));
        }
    }

    pub fn stroke_color(&self) -> Result<SerializableColor, ConfigError> {
        parse_color(&self.stroke_color)
    }

    pub fn background_color(&self) -> Result<SerializableColor, ConfigError> {
        parse_color(&self.background_color)
    }

    /// Model and label paths, both required to start.
    pub fn model_paths(&self) -> Result<(&Path, &Path), ConfigError> {
        let model = self.model_path.as_deref().ok_or(ConfigError::Missing("model path"))?;
        let labels = self.labels_path.as_deref().ok_or(ConfigError::Missing("labels path"))?;
        Ok((model, labels))
    }
}

/// Parse a `#rrggbb` or `#rrggbbaa` color string.
pub fn parse_color(s: &str) -> Result<SerializableColor, ConfigError> {
    let invalid = || ConfigError::InvalidColor(s.to_string());
    let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
    if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
        return Err(invalid());
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
    let a = if hex.len() == 8 { channel(6)? } else { 255 };
    Ok(SerializableColor::new(channel(0)?, channel(2)?, channel(4)?, a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use doodle_classifier::PixelFormat;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.stroke_width, DEFAULT_STROKE_WIDTH);
        assert_eq!(config.stroke_color().unwrap(), SerializableColor::black());
        assert_eq!(config.background_color().unwrap(), SerializableColor::white());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let json = r#"{
            "stroke_width": 12.0,
            "model_input": { "width": 64, "height": 64, "pixel_format": "rgb" }
        }"#;
        let config = AppConfig::from_json(json).unwrap();
        assert_eq!(config.stroke_width, 12.0);
        assert_eq!(config.title, "Doodle Recognizer");
        assert_eq!(config.model_input.pixel_format, PixelFormat::Rgb);
        assert_eq!(config.model_input.width, 64);
    }

    #[test]
    fn test_timing_is_not_configurable() {
        let json = r#"{ "debounce_ms": 50, "top_n": 10, "title": "Sketch" }"#;
        let config = AppConfig::from_json(json).unwrap();
        assert_eq!(config.title, "Sketch");
        let roundtrip = config.to_json().unwrap();
        assert!(!roundtrip.contains("debounce"));
        assert!(!roundtrip.contains("top_n"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = AppConfig::default();
        config.title = "Sketch".to_string();
        config.model_path = Some(PathBuf::from("/models/quickdraw.onnx"));
        fs::write(&path, config.to_json().unwrap()).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(AppConfig::load_from(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_overrides() {
        let mut config = AppConfig::default();
        config.labels_path = Some(PathBuf::from("labels.txt"));
        config.apply_overrides(Some("model.onnx".to_string()), Some(String::new()));
        assert_eq!(config.model_path, Some(PathBuf::from("model.onnx")));
        assert_eq!(config.labels_path, Some(PathBuf::from("labels.txt")));
    }

    #[test]
    fn test_missing_model_paths() {
        let config = AppConfig::default();
        assert!(matches!(config.model_paths(), Err(ConfigError::Missing("model path"))));
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#ff8000").unwrap(), SerializableColor::new(255, 128, 0, 255));
        assert_eq!(parse_color(" #00000080 ").unwrap(), SerializableColor::new(0, 0, 0, 128));
        assert!(parse_color("ff8000").is_err());
        assert!(parse_color("#ff80").is_err());
        assert!(parse_color("#gg0000").is_err());
    }
}
