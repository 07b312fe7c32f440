//! Print the encoder invocation for pipeline data.

use std::path::PathBuf;

use slidereel_common::config::EngineConfig;
use slidereel_render_engine::export::{plan_video, video_params};
use slidereel_render_engine::probe::probe_audio_duration;
use slidereel_render_engine::resolve::resolve_inputs;

pub async fn run(
    pipeline: PathBuf,
    audio_duration: Option<f64>,
    output: PathBuf,
    config: EngineConfig,
) -> anyhow::Result<()> {
    let data = super::load_pipeline(&pipeline)?;
    let inputs = resolve_inputs(&data)?;

    let mut audio = inputs.audio;
    let duration = match audio_duration {
        Some(secs) => secs,
        None => probe_audio_duration(&config.tools.ffprobe, &audio.uri).await?,
    };
    audio.duration_secs = Some(duration);

    let params = video_params(inputs.slides, audio, output, &config.video)?;
    let plan = plan_video(&params, &data.context)?;

    println!("Slides: {}", params.slides.len());
    for (slide, secs) in params.slides.iter().zip(&plan.allocation.durations) {
        println!("  {:>8.3}s  {}", secs, slide.uri.display());
    }
    println!(
        "Audio: {:.3}s (scale factor {:.3}, overlap {:.3}s)",
        duration, plan.allocation.scale_factor, plan.allocation.transition_overlap
    );
    println!();
    println!("{} {}", config.tools.ffmpeg.display(), shell_join(&plan.args));

    Ok(())
}

/// Quote arguments for copy-pasting into a POSIX shell.
fn shell_join(args: &[String]) -> String {
    args.iter()
        .map(|arg| {
            let plain = arg
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || "-_./:=+".contains(c));
            if plain && !arg.is_empty() {
                arg.clone()
            } else {
                format!("'{}'", arg.replace('\'', r"'\''"))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_join_quotes_graphs() {
        let args = vec![
            "-i".to_string(),
            "/tmp/a.png".to_string(),
            "-filter_complex".to_string(),
            "[0:v]drawtext=text='Hi'[vout]".to_string(),
        ];
        assert_eq!(
            shell_join(&args),
            r"-i /tmp/a.png -filter_complex '[0:v]drawtext=text='\''Hi'\''[vout]'"
        );
    }
}
