//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// External tool locations.
    pub tools: ToolPaths,

    /// Default video settings applied when a build does not override them.
    pub video: VideoDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Paths (or PATH-resolved names) of the external encoder binaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

/// Default video parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoDefaults {
    /// Output resolution as `W:H`.
    pub resolution: String,

    /// xfade transition name.
    pub transition_type: String,

    /// Crossfade length in seconds.
    pub transition_duration: f64,

    /// Video bitrate passed to `-b:v` (e.g. "4M").
    pub bitrate: Option<String>,

    /// Output frame rate passed to `-r`.
    pub framerate: Option<u32>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "slidereel=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tools: ToolPaths::default(),
            video: VideoDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

impl Default for VideoDefaults {
    fn default() -> Self {
        Self {
            resolution: "1920:1080".to_string(),
            transition_type: "fade".to_string(),
            transition_duration: 1.0,
            bitrate: None,
            framerate: None,
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

impl EngineConfig {
    /// Load config from an explicit path, falling back to defaults when the
    /// file is absent or unreadable.
    pub fn load_from(config_path: &Path) -> Self {
        if config_path.exists() {
            match std::fs::read_to_string(config_path) {
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

    /// Write config as pretty JSON, creating parent directories.
    pub fn save_to(&self, config_path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("slidereel").join("config.json")
}
