//! Slide and audio track descriptors.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::overlay::TextOverlay;

/// One still image in the slideshow.
///
/// The engine only reads the file at `uri`; it never moves or deletes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSlide {
    /// Local path of the image.
    pub uri: PathBuf,

    /// Upstream file identifier, carried into output metadata.
    #[serde(default)]
    pub file_id: Option<String>,

    /// On-screen duration requested by upstream, in seconds.
    #[serde(default)]
    pub explicit_duration: Option<f64>,

    /// Text drawn on top of this slide.
    #[serde(default)]
    pub text_overlay: Option<TextOverlay>,

    /// Key of the pipeline step that produced the image.
    #[serde(default)]
    pub step_key: String,

    /// Sort key; slides render in ascending weight.
    #[serde(default)]
    pub order_weight: i64,
}

impl ImageSlide {
    pub fn new(uri: impl Into<PathBuf>, step_key: impl Into<String>, order_weight: i64) -> Self {
        Self {
            uri: uri.into(),
            file_id: None,
            explicit_duration: None,
            text_overlay: None,
            step_key: step_key.into(),
            order_weight,
        }
    }

    pub fn with_duration(mut self, secs: f64) -> Self {
        self.explicit_duration = Some(secs);
        self
    }

    pub fn with_overlay(mut self, overlay: TextOverlay) -> Self {
        self.text_overlay = Some(overlay);
        self
    }
}

/// The single audio track that drives the video length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioTrack {
    /// Local path of the audio file.
    pub uri: PathBuf,

    /// Key of the pipeline step that produced the audio.
    #[serde(default)]
    pub step_key: String,

    /// Duration in seconds; `None` until probed.
    #[serde(default)]
    pub duration_secs: Option<f64>,
}

impl AudioTrack {
    pub fn new(uri: impl Into<PathBuf>) -> Self {
        Self {
            uri: uri.into(),
            step_key: String::new(),
            duration_secs: None,
        }
    }

    /// Returns a copy with the probed duration attached.
    pub fn with_duration(mut self, secs: f64) -> Self {
        self.duration_secs = Some(secs);
        self
    }
}

/// Sort slides by ascending weight, keeping input order for ties.
pub fn sort_slides(slides: &mut [ImageSlide]) {
    slides.sort_by_key(|slide| slide.order_weight);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_slides_is_stable_for_equal_weights() {
        let mut slides = vec![
            ImageSlide::new("/c.png", "c", 2),
            ImageSlide::new("/a.png", "a", 1),
            ImageSlide::new("/b.png", "b", 1),
        ];
        sort_slides(&mut slides);
        let keys: Vec<_> = slides.iter().map(|s| s.step_key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_slide_builder() {
        let slide = ImageSlide::new("/a.png", "img", 0).with_duration(2.5);
        assert_eq!(slide.explicit_duration, Some(2.5));
        assert!(slide.text_overlay.is_none());
    }
}
