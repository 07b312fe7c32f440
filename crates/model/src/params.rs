//! Output video parameters.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::slide::{AudioTrack, ImageSlide};

/// Default output resolution.
pub const DEFAULT_RESOLUTION: Resolution = Resolution {
    width: 1920,
    height: 1080,
};

/// Default crossfade transition.
pub const DEFAULT_TRANSITION_TYPE: &str = "fade";

/// Default crossfade length in seconds.
pub const DEFAULT_TRANSITION_DURATION: f64 = 1.0;

/// Everything needed to render one video.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoParams {
    /// Slides in render order.
    pub slides: Vec<ImageSlide>,

    /// Audio track; its duration must be known before planning.
    pub audio: AudioTrack,

    /// Target frame size.
    pub resolution: Resolution,

    /// xfade transition name.
    pub transition_type: String,

    /// Crossfade length in seconds.
    pub transition_duration: f64,

    /// Optional `-b:v` value (e.g. "4M").
    pub bitrate: Option<String>,

    /// Optional `-r` value.
    pub framerate: Option<u32>,

    /// Destination file.
    pub output_path: PathBuf,
}

impl VideoParams {
    /// Parameters with default resolution and transition settings.
    pub fn new(slides: Vec<ImageSlide>, audio: AudioTrack, output_path: impl Into<PathBuf>) -> Self {
        Self {
            slides,
            audio,
            resolution: DEFAULT_RESOLUTION,
            transition_type: DEFAULT_TRANSITION_TYPE.to_string(),
            transition_duration: DEFAULT_TRANSITION_DURATION,
            bitrate: None,
            framerate: None,
            output_path: output_path.into(),
        }
    }
}

/// Target frame size, written `W:H`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Resolution {
    fn default() -> Self {
        DEFAULT_RESOLUTION
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid resolution '{input}': expected W:H with positive integers")]
pub struct ResolutionParseError {
    pub input: String,
}

impl FromStr for Resolution {
    type Err = ResolutionParseError;

    /// Accepts `W:H` and `WxH`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ResolutionParseError {
            input: s.to_string(),
        };
        let trimmed = s.trim();
        let (w, h) = trimmed
            .split_once(':')
            .or_else(|| trimmed.split_once(|c: char| c == 'x' || c == 'X'))
            .ok_or_else(err)?;
        let width = w.trim().parse::<u32>().map_err(|_| err())?;
        let height = h.trim().parse::<u32>().map_err(|_| err())?;
        if width == 0 || height == 0 {
            return Err(err());
        }
        Ok(Self { width, height })
    }
}

impl TryFrom<String> for Resolution {
    type Error = ResolutionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Resolution> for String {
    fn from(value: Resolution) -> Self {
        value.to_string()
    }
}
