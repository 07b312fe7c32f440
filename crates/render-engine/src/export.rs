//! Encoder invocation and the top-level build.
//!
//! A build resolves inputs, probes the audio, allocates slide durations,
//! builds the filtergraph and runs ffmpeg once. [`plan_video`] stops just
//! before the process is spawned.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::str::FromStr;

use serde_json::{Map, Value};
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use slidereel_common::config::{EngineConfig, VideoDefaults};
use slidereel_common::error::{SlidereelError, SlidereelResult};
use slidereel_model::metadata::{SlideMetadata, VideoMetadata, VIDEO_MIME_TYPE};
use slidereel_model::overlay::TextOverlay;
use slidereel_model::params::{Resolution, VideoParams};
use slidereel_model::pipeline::PipelineData;
use slidereel_model::slide::{AudioTrack, ImageSlide};
use slidereel_processing::duration::{allocate_durations, DurationAllocation};
use slidereel_processing::overlay::OverlayEngine;

use crate::filter_graph::{build_filter_graph, FilterGraph, TransitionSpec};
use crate::probe::probe_audio_duration;
use crate::resolve::resolve_inputs;

/// Maximum number of stderr characters kept as diagnostics.
const DIAGNOSTICS_TAIL_CHARS: usize = 4000;

/// Everything decided before the encoder runs.
#[derive(Debug, Clone)]
pub struct EncodePlan {
    /// Full ffmpeg argument list (without the program name).
    pub args: Vec<String>,
    pub graph: FilterGraph,
    pub allocation: DurationAllocation,
    /// Overlay actually drawn on each slide, placeholders resolved.
    pub rendered_overlays: Vec<Option<TextOverlay>>,
}

/// Build [`VideoParams`] from resolved inputs and the configured defaults.
pub fn video_params(
    slides: Vec<ImageSlide>,
    audio: AudioTrack,
    output_path: impl Into<PathBuf>,
    defaults: &VideoDefaults,
) -> SlidereelResult<VideoParams> {
    let resolution = Resolution::from_str(&defaults.resolution)
        .map_err(|e| SlidereelError::configuration(e.to_string()))?;

    let mut params = VideoParams::new(slides, audio, output_path);
    params.resolution = resolution;
    params.transition_type = defaults.transition_type.clone();
    params.transition_duration = defaults.transition_duration;
    params.bitrate = defaults.bitrate.clone();
    params.framerate = defaults.framerate;
    Ok(params)
}

/// Allocate durations and build the encoder invocation, without running it.
///
/// `params.audio.duration_secs` must already be known.
pub fn plan_video(params: &VideoParams, context: &Map<String, Value>) -> SlidereelResult<EncodePlan> {
    let audio_duration = params.audio.duration_secs.ok_or_else(|| {
        SlidereelError::configuration(format!(
            "Audio duration for {} is unknown; probe it first",
            params.audio.uri.display()
        ))
    })?;

    let explicit: Vec<Option<f64>> = params
        .slides
        .iter()
        .map(|slide| slide.explicit_duration)
        .collect();
    let allocation = allocate_durations(audio_duration, params.transition_duration, &explicit)?;

    let engine = OverlayEngine::new(context);
    let build = build_filter_graph(
        &params.slides,
        &allocation.durations,
        params.resolution,
        TransitionSpec {
            kind: &params.transition_type,
            duration: params.transition_duration,
        },
        &engine,
    )?;

    let args = encoder_args(params, &build.graph);

    tracing::info!(
        slides = params.slides.len(),
        audio_duration,
        scale_factor = allocation.scale_factor,
        transitions = build.graph.has_transitions(),
        overlays = build.rendered_overlays.iter().flatten().count(),
        output = %params.output_path.display(),
        "Encode plan ready"
    );

    Ok(EncodePlan {
        args,
        graph: build.graph,
        allocation,
        rendered_overlays: build.rendered_overlays,
    })
}

/// ffmpeg arguments: looped image inputs, the audio input, the graph and
/// the fixed H.264/AAC output settings.
pub fn encoder_args(params: &VideoParams, graph: &FilterGraph) -> Vec<String> {
    let mut args = Vec::with_capacity(params.slides.len() * 4 + 24);

    for slide in &params.slides {
        args.push("-loop".to_string());
        args.push("1".to_string());
        args.push("-i".to_string());
        args.push(slide.uri.display().to_string());
    }
    args.push("-i".to_string());
    args.push(params.audio.uri.display().to_string());

    args.push("-filter_complex".to_string());
    args.push(graph.to_string());
    args.push("-map".to_string());
    args.push(graph.video_map());
    args.push("-map".to_string());
    args.push(format!("{}:a", params.slides.len()));

    args.extend(
        ["-c:v", "libx264", "-c:a", "aac", "-pix_fmt", "yuv420p"]
            .into_iter()
            .map(String::from),
    );
    if let Some(bitrate) = &params.bitrate {
        args.push("-b:v".to_string());
        args.push(bitrate.clone());
    }
    if let Some(framerate) = params.framerate {
        args.push("-r".to_string());
        args.push(framerate.to_string());
    }

    args.push("-shortest".to_string());
    args.push("-y".to_string());
    args.push(params.output_path.display().to_string());
    args
}

/// Run the encoder once and confirm it wrote a non-empty `output`.
///
/// Any file already at `output` is removed first, and whatever the encoder
/// wrote is removed again if the run fails. Cancelling `cancel` kills the
/// child and returns [`SlidereelError::Cancelled`].
pub async fn run_encoder(
    ffmpeg: &Path,
    args: &[String],
    output: &Path,
    cancel: &CancellationToken,
) -> SlidereelResult<()> {
    if cancel.is_cancelled() {
        return Err(SlidereelError::Cancelled);
    }

    match tokio::fs::remove_file(output).await {
        Ok(()) => tracing::debug!(output = %output.display(), "Removed previous output"),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(SlidereelError::encode(format!(
                "Cannot replace existing output {}: {err}",
                output.display()
            )))
        }
    }

    tracing::debug!(args = ?args, "Running ffmpeg");
    let start = std::time::Instant::now();
    let mut child = Command::new(ffmpeg)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            SlidereelError::encode(format!("Failed to start {}: {e}", ffmpeg.display()))
        })?;

    let pid = child.id();
    tracing::info!(pid, args_len = args.len(), "ffmpeg process started");

    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| SlidereelError::encode("Failed to capture ffmpeg stderr"))?;

    // Drain stderr concurrently so ffmpeg never blocks on a full pipe.
    let stderr_task = tokio::spawn(async move {
        let mut raw = Vec::new();
        match stderr.read_to_end(&mut raw).await {
            Ok(_) => String::from_utf8_lossy(&raw).into_owned(),
            Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
        }
    });

    let waited = tokio::select! {
        status = child.wait() => status,
        _ = cancel.cancelled() => {
            tracing::warn!(pid, "Cancelling ffmpeg");
            if let Err(err) = child.kill().await {
                tracing::warn!(pid, error = %err, "Failed to kill ffmpeg");
            }
            stderr_task.abort();
            discard_partial_output(output).await;
            return Err(SlidereelError::Cancelled);
        }
    };
    let status = match waited {
        Ok(status) => status,
        Err(err) => {
            discard_partial_output(output).await;
            return Err(SlidereelError::encode(format!("Failed to wait on ffmpeg: {err}")));
        }
    };

    let stderr_output = stderr_task
        .await
        .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());
    let diagnostics = diagnostics_tail(&stderr_output);

    if !status.success() {
        tracing::error!(pid, %status, "ffmpeg failed");
        discard_partial_output(output).await;
        return Err(SlidereelError::encode_with_diagnostics(
            format!("ffmpeg exited with {status}"),
            diagnostics,
        ));
    }

    let produced = tokio::fs::metadata(output)
        .await
        .map(|meta| meta.is_file() && meta.len() > 0)
        .unwrap_or(false);
    if !produced {
        discard_partial_output(output).await;
        return Err(SlidereelError::encode_with_diagnostics(
            "encoder did not produce output",
            diagnostics,
        ));
    }

    tracing::info!(
        pid,
        elapsed_secs = start.elapsed().as_secs_f64(),
        output = %output.display(),
        "ffmpeg finished"
    );
    Ok(())
}

/// Remove whatever a failed or cancelled run left at `output`.
async fn discard_partial_output(output: &Path) {
    match tokio::fs::remove_file(output).await {
        Ok(()) => tracing::debug!(output = %output.display(), "Removed partial output"),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => tracing::warn!(
            output = %output.display(),
            error = %err,
            "Failed to remove partial output"
        ),
    }
}

/// Last [`DIAGNOSTICS_TAIL_CHARS`] characters of `stderr`, trimmed.
fn diagnostics_tail(stderr: &str) -> String {
    let trimmed = stderr.trim();
    let count = trimmed.chars().count();
    if count <= DIAGNOSTICS_TAIL_CHARS {
        return trimmed.to_string();
    }
    trimmed.chars().skip(count - DIAGNOSTICS_TAIL_CHARS).collect()
}

/// Build one video from upstream pipeline data.
pub async fn build_video(
    data: &PipelineData,
    output_path: &Path,
    config: &EngineConfig,
    cancel: CancellationToken,
) -> SlidereelResult<VideoMetadata> {
    let inputs = resolve_inputs(data)?;

    let mut audio = inputs.audio;
    let audio_duration = probe_audio_duration(&config.tools.ffprobe, &audio.uri).await?;
    audio.duration_secs = Some(audio_duration);

    let params = video_params(inputs.slides, audio, output_path, &config.video)?;
    let plan = plan_video(&params, &data.context)?;

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    run_encoder(&config.tools.ffmpeg, &plan.args, output_path, &cancel).await?;

    let metadata = video_metadata(&params, &plan, audio_duration).await?;
    tracing::info!(
        file_id = %metadata.file_id,
        size = metadata.size,
        duration = metadata.duration,
        "Video built"
    );
    Ok(metadata)
}

async fn video_metadata(
    params: &VideoParams,
    plan: &EncodePlan,
    duration: f64,
) -> SlidereelResult<VideoMetadata> {
    let output = &params.output_path;
    let size = tokio::fs::metadata(output).await?.len();
    let absolute = match tokio::fs::canonicalize(output).await {
        Ok(path) => path,
        Err(_) => output.clone(),
    };

    let slides = params
        .slides
        .iter()
        .zip(&plan.allocation.durations)
        .zip(&plan.rendered_overlays)
        .map(|((slide, duration), overlay)| SlideMetadata {
            file_id: slide.file_id.clone(),
            duration: *duration,
            step_key: slide.step_key.clone(),
            text_overlay: overlay.clone(),
        })
        .collect();

    Ok(VideoMetadata {
        file_id: uuid::Uuid::new_v4().to_string(),
        uri: absolute.display().to_string(),
        url: format!("file://{}", absolute.display()),
        mime_type: VIDEO_MIME_TYPE.to_string(),
        filename: output
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
        duration,
        size,
        timestamp: chrono::Utc::now().to_rfc3339(),
        slides,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use slidereel_model::overlay::{OverlayPosition, TextOverlay};

    fn params(n: usize) -> VideoParams {
        let slides = (0..n)
            .map(|i| ImageSlide::new(format!("/img/{i}.png"), format!("img{i}"), i as i64))
            .collect();
        VideoParams::new(
            slides,
            AudioTrack::new("/audio/voice.mp3").with_duration(8.0),
            "/out/video.mp4",
        )
    }

    #[test]
    fn test_encoder_args_layout() {
        let params = params(2);
        let plan = plan_video(&params, &Map::new()).unwrap();
        let args = &plan.args;

        assert_eq!(&args[..8], &[
            "-loop", "1", "-i", "/img/0.png", "-loop", "1", "-i", "/img/1.png"
        ]);
        assert_eq!(&args[8..10], &["-i", "/audio/voice.mp3"]);
        assert_eq!(args[10], "-filter_complex");
        assert_eq!(args[11], plan.graph.to_string());
        assert_eq!(&args[12..16], &["-map", "[trans1]", "-map", "2:a"]);
        assert_eq!(
            &args[16..],
            &[
                "-c:v", "libx264", "-c:a", "aac", "-pix_fmt", "yuv420p", "-shortest", "-y",
                "/out/video.mp4"
            ]
        );
    }

    #[test]
    fn test_optional_bitrate_and_framerate() {
        let mut params = params(1);
        params.bitrate = Some("4M".to_string());
        params.framerate = Some(30);
        let plan = plan_video(&params, &Map::new()).unwrap();
        let joined = plan.args.join(" ");
        assert!(joined.contains("-pix_fmt yuv420p -b:v 4M -r 30 -shortest -y /out/video.mp4"));
        assert!(joined.contains("-map [vout] -map 1:a"));
    }

    #[test]
    fn test_single_slide_plan_has_no_xfade() {
        let plan = plan_video(&params(1), &Map::new()).unwrap();
        assert!(!plan.graph.has_transitions());
        assert_eq!(plan.allocation.durations, vec![8.0]);
    }

    #[test]
    fn test_plan_requires_probed_audio() {
        let mut params = params(2);
        params.audio.duration_secs = None;
        assert!(plan_video(&params, &Map::new()).unwrap_err().is_configuration());
    }

    #[test]
    fn test_plan_resolves_overlay_placeholders() {
        let mut params = params(1);
        params.slides[0].text_overlay =
            Some(TextOverlay::new("Hi {name}", OverlayPosition::Top));
        let context: Map<String, Value> =
            serde_json::from_value(serde_json::json!({"name": "Ada"})).unwrap();

        let plan = plan_video(&params, &context).unwrap();
        assert_eq!(
            plan.rendered_overlays[0].as_ref().map(|o| o.text.as_str()),
            Some("Hi Ada")
        );
        assert!(plan.graph.to_string().contains("text='Hi Ada'"));
    }

    #[test]
    fn test_video_params_from_defaults() {
        let defaults = VideoDefaults {
            resolution: "1280x720".to_string(),
            transition_type: "wipeleft".to_string(),
            transition_duration: 0.5,
            bitrate: Some("2M".to_string()),
            framerate: Some(25),
        };
        let params = video_params(Vec::new(), AudioTrack::new("/a.mp3"), "/o.mp4", &defaults)
            .unwrap();
        assert_eq!(params.resolution, Resolution::new(1280, 720));
        assert_eq!(params.transition_type, "wipeleft");
        assert_eq!(params.framerate, Some(25));

        let bad = VideoDefaults {
            resolution: "huge".to_string(),
            ..defaults
        };
        assert!(video_params(Vec::new(), AudioTrack::new("/a.mp3"), "/o.mp4", &bad)
            .unwrap_err()
            .is_configuration());
    }

    #[test]
    fn test_diagnostics_tail_keeps_the_end() {
        let long = format!("{}END", "x".repeat(DIAGNOSTICS_TAIL_CHARS * 2));
        let tail = diagnostics_tail(&long);
        assert_eq!(tail.chars().count(), DIAGNOSTICS_TAIL_CHARS);
        assert!(tail.ends_with("END"));
        assert_eq!(diagnostics_tail("  short\n"), "short");
    }
}
