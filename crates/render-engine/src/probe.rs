//! ffprobe / tool discovery helpers.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;

use slidereel_common::error::{SlidereelError, SlidereelResult};

/// Audio duration in seconds, read from the container header.
pub async fn probe_audio_duration(ffprobe: &Path, audio: &Path) -> SlidereelResult<f64> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(audio)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| {
            SlidereelError::probe(format!("Failed to start {}: {e}", ffprobe.display()))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SlidereelError::probe(format!(
            "ffprobe failed on {} (status {}): {}",
            audio.display(),
            output.status,
            stderr.trim()
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let duration = parse_duration(&stdout).ok_or_else(|| {
        SlidereelError::probe(format!(
            "Could not read a duration for {} from ffprobe output {:?}",
            audio.display(),
            stdout.trim()
        ))
    })?;

    tracing::debug!(audio = %audio.display(), duration, "Probed audio duration");
    Ok(duration)
}

fn parse_duration(raw: &str) -> Option<f64> {
    let secs = raw.lines().next()?.trim().parse::<f64>().ok()?;
    (secs.is_finite() && secs > 0.0).then_some(secs)
}

/// Whether `binary` runs and answers `-version`.
pub async fn tool_available(binary: &Path) -> bool {
    Command::new(binary)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|status| status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("8.000000\n"), Some(8.0));
        assert_eq!(parse_duration("  12.5  "), Some(12.5));
        assert_eq!(parse_duration("N/A\n"), None);
        assert_eq!(parse_duration("0.0"), None);
        assert_eq!(parse_duration("-3"), None);
        assert_eq!(parse_duration(""), None);
    }

    #[tokio::test]
    async fn test_missing_binary_is_probe_error() {
        let err = probe_audio_duration(
            Path::new("/nonexistent/slidereel-ffprobe"),
            Path::new("voice.mp3"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SlidereelError::Probe { .. }));
    }

    #[tokio::test]
    async fn test_missing_tool_is_unavailable() {
        assert!(!tool_available(Path::new("/nonexistent/slidereel-ffmpeg")).await);
    }
}
