pub mod check;
pub mod config;
pub mod plan;
pub mod probe;
pub mod render;

use std::path::Path;

use clap::Args;
use slidereel_common::config::VideoDefaults;
use slidereel_model::pipeline::PipelineData;

/// Per-run overrides of the configured video defaults.
#[derive(Args, Debug, Default)]
pub struct VideoOverrides {
    /// Output resolution, `W:H` or `WxH`
    #[arg(long)]
    pub resolution: Option<String>,

    /// xfade transition name
    #[arg(long)]
    pub transition: Option<String>,

    /// Crossfade length in seconds (0 disables crossfades)
    #[arg(long)]
    pub transition_duration: Option<f64>,

    /// Video bitrate, e.g. 4M
    #[arg(long)]
    pub bitrate: Option<String>,

    /// Output frame rate
    #[arg(long)]
    pub framerate: Option<u32>,
}

impl VideoOverrides {
    pub fn apply(self, defaults: &mut VideoDefaults) {
        if let Some(resolution) = self.resolution {
            defaults.resolution = resolution;
        }
        if let Some(transition) = self.transition {
            defaults.transition_type = transition;
        }
        if let Some(duration) = self.transition_duration {
            defaults.transition_duration = duration;
        }
        if self.bitrate.is_some() {
            defaults.bitrate = self.bitrate;
        }
        if self.framerate.is_some() {
            defaults.framerate = self.framerate;
        }
    }
}

/// Read pipeline data from a JSON file.
pub fn load_pipeline(path: &Path) -> anyhow::Result<PipelineData> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))?;
    serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Invalid pipeline data in {}: {e}", path.display()))
}
