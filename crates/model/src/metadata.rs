//! Metadata describing a finished video.

use serde::{Deserialize, Serialize};

use crate::overlay::TextOverlay;

/// MIME type of every video this engine produces.
pub const VIDEO_MIME_TYPE: &str = "video/mp4";

/// Record handed back to the calling pipeline step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    pub file_id: String,

    /// Local path of the output file.
    pub uri: String,

    /// `file://` URL of the output file.
    pub url: String,

    pub mime_type: String,

    pub filename: String,

    /// Playback duration in seconds (the audio duration).
    pub duration: f64,

    /// Output size in bytes.
    pub size: u64,

    /// Completion time (RFC 3339).
    pub timestamp: String,

    pub slides: Vec<SlideMetadata>,
}

/// Per-slide summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideMetadata {
    pub file_id: Option<String>,

    /// Allocated on-screen duration in seconds.
    pub duration: f64,

    pub step_key: String,

    /// Overlay that was actually rendered on this slide.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_overlay: Option<TextOverlay>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_serializes_camel_case_and_omits_missing_overlay() {
        let metadata = VideoMetadata {
            file_id: "abc".to_string(),
            uri: "/out/video.mp4".to_string(),
            url: "file:///out/video.mp4".to_string(),
            mime_type: VIDEO_MIME_TYPE.to_string(),
            filename: "video.mp4".to_string(),
            duration: 8.0,
            size: 1024,
            timestamp: "2024-01-01T00:00:00Z".to_string(),
            slides: vec![SlideMetadata {
                file_id: None,
                duration: 8.0,
                step_key: "img".to_string(),
                text_overlay: None,
            }],
        };

        let value = serde_json::to_value(&metadata).unwrap();
        assert_eq!(value["mimeType"], "video/mp4");
        assert_eq!(value["slides"][0]["stepKey"], "img");
        assert!(value["slides"][0].get("textOverlay").is_none());
    }
}
