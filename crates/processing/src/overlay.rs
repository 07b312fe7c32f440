//! Text overlay engine.
//!
//! Prepares overlay specs for ffmpeg's `drawtext` filter:
//! placeholder substitution against the upstream context, anchor position
//! expressions, escaping for the filtergraph syntax, and the enabled/text
//! checks that decide whether an overlay is rendered at all.

use serde_json::{Map, Value};
use slidereel_common::error::OverlayValidationError;
use slidereel_model::overlay::{OverlayPosition, TextOverlay};

/// Distance in pixels between an anchored overlay and the frame edge.
pub const OVERLAY_MARGIN_PX: u32 = 20;

/// Border around the text when a background box is drawn.
const BOX_BORDER_PX: u32 = 5;

/// Characters with structural meaning in filtergraph syntax.
const FILTER_SPECIAL_CHARS: [char; 6] = [':', ',', '[', ']', ';', '='];

/// Escape text for embedding inside a filtergraph option value.
///
/// Order is fixed: backslashes first, then single quotes, then the
/// structural characters, so escapes added by later steps are never
/// escaped again.
pub fn escape_ffmpeg_text(text: &str) -> String {
    let mut escaped = text.replace('\\', "\\\\").replace('\'', "\\'");
    for special in FILTER_SPECIAL_CHARS {
        escaped = escaped.replace(special, &format!("\\{special}"));
    }
    escaped
}

/// Whether a raw `enabled` flag counts as on.
///
/// Accepts `true`, `"1"`, `"true"` (any case) and the number 1.
pub fn is_enabled(flag: Option<&Value>) -> bool {
    match flag {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => {
            let s = s.trim();
            s == "1" || s.eq_ignore_ascii_case("true")
        }
        Some(Value::Number(n)) => n.as_f64() == Some(1.0),
        _ => false,
    }
}

/// Check whether an overlay should be rendered.
pub fn check_text_overlay(overlay: &TextOverlay) -> Result<(), OverlayValidationError> {
    if !is_enabled(overlay.enabled.as_ref()) {
        return Err(OverlayValidationError::Disabled);
    }
    if overlay.text.trim().is_empty() {
        return Err(OverlayValidationError::EmptyText);
    }
    Ok(())
}

/// `true` when the overlay is enabled and has text.
pub fn validate_text_overlay_config(overlay: &TextOverlay) -> bool {
    check_text_overlay(overlay).is_ok()
}

/// Replace `{key}` tokens with values from `context`.
///
/// Strings are inserted verbatim, objects with a `text` field contribute
/// that field, anything else is JSON-serialized. Unknown keys stay as the
/// literal placeholder.
pub fn resolve_placeholders(text: &str, context: &Map<String, Value>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];

        let Some(close) = after_open.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };

        let key = &after_open[..close];
        // A nested `{` means this brace was literal; retry from the inner one.
        if let Some(nested) = key.rfind('{') {
            out.push_str(&rest[open..open + 1 + nested]);
            rest = &after_open[nested..];
            continue;
        }

        match context.get(key.trim()).filter(|_| !key.trim().is_empty()) {
            Some(value) => out.push_str(&placeholder_value(value)),
            None => {
                out.push('{');
                out.push_str(key);
                out.push('}');
            }
        }
        rest = &after_open[close + 1..];
    }

    out.push_str(rest);
    out
}

fn placeholder_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(record) => match record.get("text") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => value.to_string(),
        },
        other => other.to_string(),
    }
}

/// Resolved `x`/`y` expressions for `drawtext`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionExpr {
    pub x: String,
    pub y: String,
}

impl std::fmt::Display for PositionExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "x={}:y={}", self.x, self.y)
    }
}

/// Map an overlay's position to `drawtext` coordinates.
///
/// Custom coordinates are escaped so expressions containing commas survive
/// the filtergraph parser. Custom without both coordinates falls back to
/// centered.
pub fn resolve_position(overlay: &TextOverlay) -> PositionExpr {
    if overlay.position == OverlayPosition::Custom {
        let custom = overlay
            .custom_x
            .as_deref()
            .map(str::trim)
            .filter(|x| !x.is_empty())
            .zip(overlay.custom_y.as_deref().map(str::trim).filter(|y| !y.is_empty()));
        if let Some((x, y)) = custom {
            return PositionExpr {
                x: escape_ffmpeg_text(x),
                y: escape_ffmpeg_text(y),
            };
        }
        tracing::debug!(id = %overlay.id, "Custom overlay position without coordinates, centering");
        return anchor_position(OverlayPosition::Center);
    }
    anchor_position(overlay.position)
}

fn anchor_position(position: OverlayPosition) -> PositionExpr {
    let m = OVERLAY_MARGIN_PX;
    let center_x = "(w-text_w)/2".to_string();
    let center_y = "(h-text_h)/2".to_string();
    let right_x = format!("w-text_w-{m}");
    let bottom_y = format!("h-text_h-{m}");

    let (x, y) = match position {
        OverlayPosition::Top => (center_x, m.to_string()),
        OverlayPosition::Bottom => (center_x, bottom_y),
        OverlayPosition::Center | OverlayPosition::Custom => (center_x, center_y),
        OverlayPosition::TopLeft => (m.to_string(), m.to_string()),
        OverlayPosition::TopRight => (right_x, m.to_string()),
        OverlayPosition::BottomLeft => (m.to_string(), bottom_y),
        OverlayPosition::BottomRight => (right_x, bottom_y),
        OverlayPosition::Left => (m.to_string(), center_y),
        OverlayPosition::Right => (right_x, center_y),
    };
    PositionExpr { x, y }
}

/// Builds `drawtext` stages for overlays, resolving placeholders against a
/// read-only upstream context.
#[derive(Debug, Clone, Copy)]
pub struct OverlayEngine<'a> {
    context: &'a Map<String, Value>,
}

impl<'a> OverlayEngine<'a> {
    pub fn new(context: &'a Map<String, Value>) -> Self {
        Self { context }
    }

    /// Validate an overlay and substitute its placeholders.
    ///
    /// The returned overlay carries the final (unescaped) text.
    pub fn prepare(&self, overlay: &TextOverlay) -> Result<TextOverlay, OverlayValidationError> {
        check_text_overlay(overlay)?;
        let text = resolve_placeholders(&overlay.text, self.context);
        if text.trim().is_empty() {
            return Err(OverlayValidationError::EmptyText);
        }
        Ok(TextOverlay {
            text,
            ..overlay.clone()
        })
    }

    /// Build the `drawtext=...` stage for an overlay.
    pub fn drawtext_filter(&self, overlay: &TextOverlay) -> Result<String, OverlayValidationError> {
        let prepared = self.prepare(overlay)?;
        Ok(render_drawtext(&prepared))
    }
}

/// Render a prepared overlay as a `drawtext` stage.
pub fn render_drawtext(overlay: &TextOverlay) -> String {
    let position = resolve_position(overlay);
    let mut filter = format!(
        "drawtext=text='{text}':fontsize={size}:fontcolor={color}:{position}",
        text = escape_ffmpeg_text(&overlay.text),
        size = overlay.font_size,
        color = escape_ffmpeg_text(&overlay.font_color),
    );

    if let Some(background) = overlay
        .background_color
        .as_deref()
        .filter(|c| !c.trim().is_empty())
    {
        filter.push_str(&format!(
            ":box=1:boxcolor={}:boxborderw={BOX_BORDER_PX}",
            escape_ffmpeg_text(background.trim())
        ));
    }

    if let Some(family) = overlay
        .font_family
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
    {
        let font = match overlay.font_style.as_deref().map(str::trim) {
            Some(style) if !style.is_empty() && !style.eq_ignore_ascii_case("normal") => {
                format!("{family}:style={style}")
            }
            _ => family.to_string(),
        };
        filter.push_str(&format!(":font='{}'", escape_ffmpeg_text(&font)));
    }

    if let Some(alpha) = fade_alpha_expr(overlay) {
        filter.push_str(&format!(":alpha={}", escape_ffmpeg_text(&alpha)));
    }

    filter
}

/// Alpha ramp for a `fade` entrance, in slide-local time.
fn fade_alpha_expr(overlay: &TextOverlay) -> Option<String> {
    let animation = overlay.animation.as_ref()?;
    if !animation.kind.eq_ignore_ascii_case("fade") {
        tracing::debug!(kind = %animation.kind, "Unsupported overlay animation ignored");
        return None;
    }
    if !animation.duration.is_finite() || animation.duration <= 0.0 {
        return None;
    }
    let delay = if animation.delay.is_finite() {
        animation.delay.max(0.0)
    } else {
        0.0
    };
    let end = delay + animation.duration;
    Some(format!(
        "if(lt(t,{delay:.3}),0,if(lt(t,{end:.3}),(t-{delay:.3})/{dur:.3},1))",
        dur = animation.duration
    ))
}
