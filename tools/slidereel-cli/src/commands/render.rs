//! Render a video from pipeline data.

use std::path::PathBuf;

use slidereel_common::config::EngineConfig;
use slidereel_common::error::{SlidereelError, SlidereelResult};
use slidereel_model::metadata::VideoMetadata;
use slidereel_render_engine::export::build_video;
use tokio_util::sync::CancellationToken;

pub async fn run(pipeline: PathBuf, output: PathBuf, config: EngineConfig) -> anyhow::Result<()> {
    println!("Rendering pipeline: {}", pipeline.display());
    let data = super::load_pipeline(&pipeline)?;

    println!("  Output: {}", output.display());
    println!("  Resolution: {}", config.video.resolution);
    println!(
        "  Transition: {} ({}s)",
        config.video.transition_type, config.video.transition_duration
    );

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupt received, cancelling render");
                cancel.cancel();
            }
        })
    };

    let result = build_video(&data, &output, &config, cancel).await;
    ctrl_c.abort();

    report(result)
}

fn report(result: SlidereelResult<VideoMetadata>) -> anyhow::Result<()> {
    match result {
        Ok(metadata) => {
            println!("Render complete: {}", metadata.uri);
            println!("{}", serde_json::to_string_pretty(&metadata)?);
            Ok(())
        }
        Err(SlidereelError::Cancelled) => Err(anyhow::anyhow!("Render cancelled")),
        Err(e) => {
            if let Some(diagnostics) = e.diagnostics() {
                eprintln!("ffmpeg output:\n{diagnostics}");
            }
            Err(anyhow::anyhow!("Render failed: {e}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_render_is_an_error() {
        let err = report(Err(SlidereelError::Cancelled)).unwrap_err();
        assert_eq!(err.to_string(), "Render cancelled");
    }

    #[test]
    fn test_encode_failure_is_an_error() {
        let err = report(Err(SlidereelError::encode("exit status 1"))).unwrap_err();
        assert!(err.to_string().starts_with("Render failed"));
    }
}
