//! Text overlay (text block) definitions.
//!
//! Overlay specs arrive from upstream pipeline steps with loosely typed
//! fields: `enabled` may be a bool, a string or a number, and coordinates may
//! be numbers or ffmpeg expressions. Decoding is lenient; deciding whether an
//! overlay is usable is the overlay engine's job.

use serde::{Deserialize, Deserializer, Serialize};

/// Default overlay font size in pixels.
pub const DEFAULT_FONT_SIZE: u32 = 48;

/// Default overlay font color.
pub const DEFAULT_FONT_COLOR: &str = "white";

/// A block of text drawn on top of one slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextOverlay {
    /// Overlay identifier (informational).
    pub id: String,

    /// Raw text, possibly containing `{key}` placeholders.
    #[serde(alias = "rawText", alias = "raw_text", alias = "content")]
    pub text: String,

    /// Anchor keyword.
    pub position: OverlayPosition,

    /// X expression used with [`OverlayPosition::Custom`].
    #[serde(alias = "custom_x", deserialize_with = "de_opt_stringish")]
    pub custom_x: Option<String>,

    /// Y expression used with [`OverlayPosition::Custom`].
    #[serde(alias = "custom_y", deserialize_with = "de_opt_stringish")]
    pub custom_y: Option<String>,

    /// Font size in pixels.
    #[serde(alias = "font_size", deserialize_with = "de_font_size")]
    pub font_size: u32,

    /// Font color (ffmpeg color syntax, e.g. `white` or `0xFFFFFF@0.8`).
    #[serde(alias = "font_color")]
    pub font_color: String,

    /// Fontconfig family name.
    #[serde(alias = "font_family")]
    pub font_family: Option<String>,

    /// Fontconfig style (e.g. `Bold`).
    #[serde(alias = "font_style")]
    pub font_style: Option<String>,

    /// Box color drawn behind the text; no box when absent.
    #[serde(alias = "background_color")]
    pub background_color: Option<String>,

    /// Raw enabled flag as received from upstream.
    pub enabled: Option<serde_json::Value>,

    /// Optional entrance animation.
    pub animation: Option<OverlayAnimation>,
}

impl Default for TextOverlay {
    fn default() -> Self {
        Self {
            id: String::new(),
            text: String::new(),
            position: OverlayPosition::default(),
            custom_x: None,
            custom_y: None,
            font_size: DEFAULT_FONT_SIZE,
            font_color: DEFAULT_FONT_COLOR.to_string(),
            font_family: None,
            font_style: None,
            background_color: None,
            enabled: None,
            animation: None,
        }
    }
}

impl TextOverlay {
    /// Convenience constructor for an enabled overlay.
    pub fn new(text: impl Into<String>, position: OverlayPosition) -> Self {
        Self {
            text: text.into(),
            position,
            enabled: Some(serde_json::Value::Bool(true)),
            ..Self::default()
        }
    }
}

/// Where the overlay is anchored on the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OverlayPosition {
    Top,
    #[default]
    Bottom,
    Center,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Left,
    Right,
    Custom,
}

/// Unknown keywords decode as [`OverlayPosition::Center`].
impl From<String> for OverlayPosition {
    fn from(value: String) -> Self {
        let normalized: String = value
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect();
        match normalized.as_str() {
            "top" => Self::Top,
            "bottom" => Self::Bottom,
            "center" | "centre" | "middle" => Self::Center,
            "topleft" => Self::TopLeft,
            "topright" => Self::TopRight,
            "bottomleft" => Self::BottomLeft,
            "bottomright" => Self::BottomRight,
            "left" => Self::Left,
            "right" => Self::Right,
            "custom" => Self::Custom,
            _ => Self::Center,
        }
    }
}

/// Strings go through [`From<String>`]; `null` and non-string values keep
/// the default anchor.
impl<'de> Deserialize<'de> for OverlayPosition {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
            Some(serde_json::Value::String(s)) => Self::from(s),
            _ => Self::default(),
        })
    }
}

/// Entrance animation for an overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OverlayAnimation {
    /// Animation kind (`fade` is rendered; other kinds are ignored).
    #[serde(rename = "type")]
    pub kind: String,

    /// Easing name (informational).
    pub easing: Option<String>,

    /// Animation length in seconds.
    pub duration: f64,

    /// Delay before the animation starts, in seconds.
    pub delay: f64,
}

impl Default for OverlayAnimation {
    fn default() -> Self {
        Self {
            kind: "fade".to_string(),
            easing: None,
            duration: 0.5,
            delay: 0.0,
        }
    }
}

/// Accepts strings and numbers, normalizing both to `Some(String)`.
fn de_opt_stringish<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Accepts a positive number or numeric string; anything else falls back to
/// [`DEFAULT_FONT_SIZE`].
fn de_font_size<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let parsed = match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().trim_end_matches("px").parse::<f64>().ok(),
        _ => None,
    };
    Ok(parsed
        .filter(|size| size.is_finite() && *size >= 1.0)
        .map(|size| size.round() as u32)
        .unwrap_or(DEFAULT_FONT_SIZE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_overlay_decodes_camel_and_snake_case() {
        let camel: TextOverlay = serde_json::from_value(json!({
            "id": "t1",
            "rawText": "Hello",
            "position": "top_left",
            "fontSize": 32,
            "fontColor": "yellow",
            "backgroundColor": "black@0.5",
            "enabled": true
        }))
        .unwrap();
        let snake: TextOverlay = serde_json::from_value(json!({
            "id": "t1",
            "text": "Hello",
            "position": "top-left",
            "font_size": "32",
            "font_color": "yellow",
            "background_color": "black@0.5",
            "enabled": true
        }))
        .unwrap();

        assert_eq!(camel, snake);
        assert_eq!(camel.position, OverlayPosition::TopLeft);
        assert_eq!(camel.font_size, 32);
    }

    #[test]
    fn test_overlay_defaults_for_missing_fields() {
        let overlay: TextOverlay = serde_json::from_value(json!({"text": "hi"})).unwrap();
        assert_eq!(overlay.position, OverlayPosition::Bottom);
        assert_eq!(overlay.font_size, DEFAULT_FONT_SIZE);
        assert_eq!(overlay.font_color, DEFAULT_FONT_COLOR);
        assert!(overlay.enabled.is_none());
    }

    #[test]
    fn test_unknown_position_falls_back_to_center() {
        let overlay: TextOverlay =
            serde_json::from_value(json!({"text": "hi", "position": "diagonal"})).unwrap();
        assert_eq!(overlay.position, OverlayPosition::Center);
    }

    #[test]
    fn test_numeric_custom_coordinates_become_strings() {
        let overlay: TextOverlay = serde_json::from_value(json!({
            "text": "hi",
            "position": "custom",
            "customX": 100,
            "customY": "h/2"
        }))
        .unwrap();
        assert_eq!(overlay.custom_x.as_deref(), Some("100"));
        assert_eq!(overlay.custom_y.as_deref(), Some("h/2"));
    }

    #[test]
    fn test_invalid_font_size_uses_default() {
        let overlay: TextOverlay =
            serde_json::from_value(json!({"text": "hi", "fontSize": "huge"})).unwrap();
        assert_eq!(overlay.font_size, DEFAULT_FONT_SIZE);
    }

    #[test]
    fn test_null_or_numeric_position_keeps_default_anchor() {
        for position in [json!(null), json!(3), json!({"x": 1})] {
            let overlay: TextOverlay =
                serde_json::from_value(json!({"text": "hi", "position": position})).unwrap();
            assert_eq!(overlay.position, OverlayPosition::Bottom);
            assert_eq!(overlay.text, "hi");
        }
    }

    #[test]
    fn test_position_serializes_snake_case() {
        let json = serde_json::to_string(&OverlayPosition::BottomRight).unwrap();
        assert_eq!(json, "\"bottom_right\"");
    }
}
