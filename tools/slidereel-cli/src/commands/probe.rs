//! Print an audio file's duration.

use std::path::PathBuf;

use slidereel_common::config::EngineConfig;
use slidereel_render_engine::probe::probe_audio_duration;

pub async fn run(audio: PathBuf, config: EngineConfig) -> anyhow::Result<()> {
    let duration = probe_audio_duration(&config.tools.ffprobe, &audio).await?;
    println!("{}: {duration:.3}s", audio.display());
    Ok(())
}
