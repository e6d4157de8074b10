//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory where pose archives are stored.
    pub archives_dir: PathBuf,

    /// Default extraction settings.
    pub extraction: ExtractionDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default extraction parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionDefaults {
    /// Fallback frame rate when measurement is unavailable.
    pub default_fps: f64,

    /// Keypoint confidence floor below which a detection is treated as absent.
    pub confidence_floor: f64,

    /// Zero-based index of the tracked person within each frame.
    pub person_index: usize,

    /// Pose model identifier recorded into archives.
    pub model_id: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "strokelab=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            archives_dir: dirs_default_archives(),
            extraction: ExtractionDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ExtractionDefaults {
    fn default() -> Self {
        Self {
            default_fps: 30.0,
            confidence_floor: 0.3,
            person_index: 0,
            model_id: "movenet-thunder".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("strokelab").join("config.json")
}

/// Default archives directory.
fn dirs_default_archives() -> PathBuf {
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local").join("share")
        });
    base.join("strokelab").join("archives")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let config = AppConfig::default();
        assert_eq!(config.extraction.default_fps, 30.0);
        assert!(config.extraction.confidence_floor > 0.0);
        assert!(config.extraction.confidence_floor < 1.0);
    }

    #[test]
    fn test_config_roundtrip() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.extraction.model_id, config.extraction.model_id);
    }
}
