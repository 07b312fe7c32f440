//! Resolve slides and the audio track from upstream pipeline data.
//!
//! Files are expected to be local already; remote references are rejected
//! rather than fetched.

use std::path::PathBuf;

use slidereel_common::error::{OverlayValidationError, SlidereelError, SlidereelResult};
use slidereel_model::overlay::TextOverlay;
use slidereel_model::pipeline::{
    FileReference, PipelineData, StepOutput, AUDIO_CONTENT, FEATURED_IMAGE,
};
use slidereel_model::slide::{sort_slides, AudioTrack, ImageSlide};

/// Slides in render order plus the unprobed audio track.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedInputs {
    pub slides: Vec<ImageSlide>,
    pub audio: AudioTrack,
}

/// Extract slides (`featured_image`) and the audio track (`audio_content`).
pub fn resolve_inputs(data: &PipelineData) -> SlidereelResult<ResolvedInputs> {
    let mut slides = Vec::new();
    for output in data.outputs_of_type(FEATURED_IMAGE) {
        for reference in decode_output(output)? {
            slides.push(slide_from_reference(output, &reference)?);
        }
    }

    if slides.is_empty() {
        return Err(SlidereelError::configuration(format!(
            "No {FEATURED_IMAGE} found in pipeline data"
        )));
    }
    sort_slides(&mut slides);

    let audio = resolve_audio(data)?;

    tracing::info!(
        slides = slides.len(),
        audio = %audio.uri.display(),
        "Resolved video inputs"
    );

    Ok(ResolvedInputs { slides, audio })
}

fn resolve_audio(data: &PipelineData) -> SlidereelResult<AudioTrack> {
    let mut candidates: Vec<&StepOutput> = data.outputs_of_type(AUDIO_CONTENT).collect();
    candidates.sort_by_key(|output| output.order_weight);

    if candidates.len() > 1 {
        tracing::warn!(
            count = candidates.len(),
            using = %candidates[0].step_key,
            "Multiple {AUDIO_CONTENT} outputs, using the first by weight"
        );
    }

    let output = candidates.first().ok_or_else(|| {
        SlidereelError::configuration(format!("No {AUDIO_CONTENT} found in pipeline data"))
    })?;

    let reference = decode_output(output)?.into_iter().next().ok_or_else(|| {
        SlidereelError::configuration(format!(
            "Audio step '{}' has no file reference",
            output.step_key
        ))
    })?;

    let uri = local_path(&reference, &output.step_key)?;
    Ok(AudioTrack {
        uri,
        step_key: output.step_key.clone(),
        duration_secs: None,
    })
}

fn decode_output(output: &StepOutput) -> SlidereelResult<Vec<FileReference>> {
    FileReference::decode(&output.value).map_err(|e| {
        SlidereelError::configuration(format!(
            "Step '{}' ({}) has an unusable file reference: {e}",
            output.step_key, output.output_type
        ))
    })
}

fn slide_from_reference(
    output: &StepOutput,
    reference: &FileReference,
) -> SlidereelResult<ImageSlide> {
    let uri = local_path(reference, &output.step_key)?;
    let info = reference.info();

    let text_overlay = info
        .and_then(|info| info.text_overlay.as_ref())
        .filter(|raw| !raw.is_null())
        .and_then(|raw| match decode_overlay(raw) {
            Ok(overlay) => Some(overlay),
            Err(reason) => {
                tracing::warn!(
                    step_key = %output.step_key,
                    %reason,
                    "Dropping undecodable text overlay"
                );
                None
            }
        });

    Ok(ImageSlide {
        uri,
        file_id: info.and_then(|info| info.file_id.clone()),
        explicit_duration: info.and_then(|info| info.duration),
        text_overlay,
        step_key: output.step_key.clone(),
        order_weight: info
            .and_then(|info| info.weight)
            .unwrap_or(output.order_weight),
    })
}

fn decode_overlay(raw: &serde_json::Value) -> Result<TextOverlay, OverlayValidationError> {
    let value = match raw {
        serde_json::Value::String(s) => serde_json::from_str(s)
            .map_err(|e| OverlayValidationError::Malformed(e.to_string()))?,
        other => other.clone(),
    };
    serde_json::from_value(value).map_err(|e| OverlayValidationError::Malformed(e.to_string()))
}

/// Turn a reference into an existing local path.
fn local_path(reference: &FileReference, step_key: &str) -> SlidereelResult<PathBuf> {
    let location = reference.location().ok_or_else(|| {
        SlidereelError::configuration(format!("Step '{step_key}' file reference has no location"))
    })?;

    let lower = location.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Err(SlidereelError::configuration(format!(
            "Step '{step_key}' references remote file {location}; it must be downloaded first"
        )));
    }

    let path = PathBuf::from(location.strip_prefix("file://").unwrap_or(location));
    if !path.is_file() {
        return Err(SlidereelError::FileNotFound { path });
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::Path;

    fn touch(dir: &Path, name: &str) -> String {
        let path = dir.join(name);
        std::fs::write(&path, b"x").unwrap();
        path.display().to_string()
    }

    fn pipeline(outputs: serde_json::Value) -> PipelineData {
        serde_json::from_value(json!({ "outputs": outputs })).unwrap()
    }

    #[test]
    fn test_resolves_and_orders_by_weight() {
        let dir = tempfile::tempdir().unwrap();
        let a = touch(dir.path(), "a.png");
        let b = touch(dir.path(), "b.png");
        let c = touch(dir.path(), "c.png");
        let audio = touch(dir.path(), "voice.mp3");

        let data = pipeline(json!([
            {"stepKey": "second", "outputType": "featured_image", "orderWeight": 20, "value": b},
            {"stepKey": "first", "outputType": "featured_image", "orderWeight": 10,
             "value": {"fileId": "f-a", "localPath": a, "duration": 2.5}},
            {"stepKey": "third", "outputType": "featured_image", "orderWeight": 30,
             "value": format!("file://{c}")},
            {"stepKey": "tts", "outputType": "audio_content", "value": audio}
        ]));

        let resolved = resolve_inputs(&data).unwrap();
        let keys: Vec<_> = resolved.slides.iter().map(|s| s.step_key.as_str()).collect();
        assert_eq!(keys, vec!["first", "second", "third"]);
        assert_eq!(resolved.slides[0].file_id.as_deref(), Some("f-a"));
        assert_eq!(resolved.slides[0].explicit_duration, Some(2.5));
        assert_eq!(resolved.slides[2].uri, PathBuf::from(&c));
        assert_eq!(resolved.audio.step_key, "tts");
        assert!(resolved.audio.duration_secs.is_none());
    }

    #[test]
    fn test_file_weight_overrides_step_weight() {
        let dir = tempfile::tempdir().unwrap();
        let a = touch(dir.path(), "a.png");
        let b = touch(dir.path(), "b.png");
        let audio = touch(dir.path(), "voice.mp3");

        let data = pipeline(json!([
            {"stepKey": "gallery", "outputType": "featured_image", "orderWeight": 5,
             "value": [{"uri": a, "weight": 9}, {"uri": b, "weight": 1}]},
            {"stepKey": "tts", "outputType": "audio_content", "value": audio}
        ]));

        let resolved = resolve_inputs(&data).unwrap();
        assert_eq!(resolved.slides[0].uri, PathBuf::from(&b));
        assert_eq!(resolved.slides[1].uri, PathBuf::from(&a));
    }

    #[test]
    fn test_overlay_decoded_from_json_string_and_bad_overlay_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let a = touch(dir.path(), "a.png");
        let b = touch(dir.path(), "b.png");
        let audio = touch(dir.path(), "voice.mp3");

        let data = pipeline(json!([
            {"stepKey": "one", "outputType": "featured_image", "orderWeight": 1,
             "value": {"uri": a, "textOverlay": r#"{"text": "Hello", "enabled": true}"#}},
            {"stepKey": "two", "outputType": "featured_image", "orderWeight": 2,
             "value": {"uri": b, "textOverlay": "not json"}},
            {"stepKey": "tts", "outputType": "audio_content", "value": audio}
        ]));

        let resolved = resolve_inputs(&data).unwrap();
        assert_eq!(resolved.slides[0].text_overlay.as_ref().unwrap().text, "Hello");
        assert!(resolved.slides[1].text_overlay.is_none());
    }

    #[test]
    fn test_missing_image_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let audio = touch(dir.path(), "voice.mp3");
        let data = pipeline(json!([
            {"stepKey": "tts", "outputType": "audio_content", "value": audio}
        ]));
        assert!(resolve_inputs(&data).unwrap_err().is_configuration());
    }

    #[test]
    fn test_missing_audio_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let a = touch(dir.path(), "a.png");
        let data = pipeline(json!([
            {"stepKey": "img", "outputType": "featured_image", "value": a}
        ]));
        let err = resolve_inputs(&data).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("audio_content"));
    }

    #[test]
    fn test_nonexistent_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let audio = touch(dir.path(), "voice.mp3");
        let data = pipeline(json!([
            {"stepKey": "img", "outputType": "featured_image",
             "value": dir.path().join("gone.png").display().to_string()},
            {"stepKey": "tts", "outputType": "audio_content", "value": audio}
        ]));
        let err = resolve_inputs(&data).unwrap_err();
        assert!(matches!(err, SlidereelError::FileNotFound { .. }));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_remote_reference_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let audio = touch(dir.path(), "voice.mp3");
        let data = pipeline(json!([
            {"stepKey": "img", "outputType": "featured_image",
             "value": "https://cdn.example.com/a.png"},
            {"stepKey": "tts", "outputType": "audio_content", "value": audio}
        ]));
        let err = resolve_inputs(&data).unwrap_err();
        assert!(err.to_string().contains("downloaded first"));
    }

    #[test]
    fn test_first_audio_by_weight_wins() {
        let dir = tempfile::tempdir().unwrap();
        let a = touch(dir.path(), "a.png");
        let music = touch(dir.path(), "music.mp3");
        let voice = touch(dir.path(), "voice.mp3");
        let data = pipeline(json!([
            {"stepKey": "img", "outputType": "featured_image", "value": a},
            {"stepKey": "music", "outputType": "audio_content", "orderWeight": 50, "value": music},
            {"stepKey": "voice", "outputType": "audio_content", "orderWeight": 10, "value": voice}
        ]));
        let resolved = resolve_inputs(&data).unwrap();
        assert_eq!(resolved.audio.step_key, "voice");
    }
}
