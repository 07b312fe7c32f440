//! Upstream pipeline data and file references.
//!
//! Pipeline steps hand over file information in several shapes: a bare path
//! or URL string, a JSON document serialized into a string, or a structured
//! object. [`FileReference::decode`] turns all of them into one tagged value
//! at the boundary so nothing downstream inspects raw JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Output type of steps that produce slide images.
pub const FEATURED_IMAGE: &str = "featured_image";

/// Output type of the step that produces the narration/music track.
pub const AUDIO_CONTENT: &str = "audio_content";

/// Everything upstream hands to one video build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineData {
    /// Outputs of earlier steps.
    pub outputs: Vec<StepOutput>,

    /// Read-only values available to overlay placeholders.
    pub context: serde_json::Map<String, Value>,
}

impl PipelineData {
    /// Outputs of the given type, in the order they were recorded.
    pub fn outputs_of_type<'a>(&'a self, output_type: &'a str) -> impl Iterator<Item = &'a StepOutput> + 'a {
        self.outputs
            .iter()
            .filter(move |output| output.output_type == output_type)
    }
}

/// One step's output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutput {
    /// Key of the producing step.
    #[serde(alias = "step_key")]
    pub step_key: String,

    /// Output type (e.g. [`FEATURED_IMAGE`]).
    #[serde(alias = "output_type")]
    pub output_type: String,

    /// Ordering weight of the producing step.
    #[serde(default, alias = "order_weight")]
    pub order_weight: i64,

    /// File reference payload, in any of the supported shapes.
    #[serde(default)]
    pub value: Value,
}

/// A decoded file reference.
#[derive(Debug, Clone, PartialEq)]
pub enum FileReference {
    /// Bare path or URL string.
    ImageUrl(String),
    /// Structured file information.
    Structured(StructuredFileInfo),
}

/// Structured file information as produced by the upload/download collaborator.
///
/// Decoding is lenient: synonymous keys may appear together (the first
/// non-empty one wins) and numbers may arrive as strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawFileInfo")]
pub struct StructuredFileInfo {
    pub file_id: Option<String>,

    /// Local path or `file://` URI.
    pub uri: Option<String>,

    /// Public URL, if any.
    pub url: Option<String>,

    pub mime_type: Option<String>,

    pub filename: Option<String>,

    /// Requested on-screen (or known) duration in seconds.
    pub duration: Option<f64>,

    /// Raw overlay spec; validated later.
    pub text_overlay: Option<Value>,

    /// Per-file ordering weight, overriding the step weight.
    pub weight: Option<i64>,
}

/// Wire shape of [`StructuredFileInfo`], one field per accepted key.
#[derive(Deserialize)]
struct RawFileInfo {
    #[serde(rename = "fileId")]
    file_id_camel: Option<Value>,
    file_id: Option<Value>,
    id: Option<Value>,

    uri: Option<Value>,
    #[serde(rename = "localPath")]
    local_path_camel: Option<Value>,
    local_path: Option<Value>,
    path: Option<Value>,

    url: Option<Value>,

    #[serde(rename = "mimeType")]
    mime_type_camel: Option<Value>,
    mime_type: Option<Value>,

    filename: Option<Value>,
    duration: Option<Value>,

    #[serde(rename = "textOverlay")]
    text_overlay_camel: Option<Value>,
    text_overlay: Option<Value>,
    #[serde(rename = "textBlock")]
    text_block_camel: Option<Value>,
    text_block: Option<Value>,

    weight: Option<Value>,
}

impl From<RawFileInfo> for StructuredFileInfo {
    fn from(raw: RawFileInfo) -> Self {
        let first_string = |candidates: [Option<Value>; 4]| {
            candidates.into_iter().flatten().find_map(|value| stringish(&value))
        };

        Self {
            file_id: first_string([raw.file_id_camel, raw.file_id, raw.id, None]),
            uri: first_string([raw.uri, raw.local_path_camel, raw.local_path, raw.path]),
            url: first_string([raw.url, None, None, None]),
            mime_type: first_string([raw.mime_type_camel, raw.mime_type, None, None]),
            filename: first_string([raw.filename, None, None, None]),
            duration: raw.duration.as_ref().and_then(numberish),
            text_overlay: [
                raw.text_overlay_camel,
                raw.text_overlay,
                raw.text_block_camel,
                raw.text_block,
            ]
            .into_iter()
            .flatten()
            .find(|value| !value.is_null()),
            weight: raw
                .weight
                .as_ref()
                .and_then(numberish)
                .map(|weight| weight.round() as i64),
        }
    }
}

/// Non-empty string, or a number rendered as one.
fn stringish(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Finite number, or a string holding one.
fn numberish(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}

/// Why a payload could not be decoded into file references.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceDecodeError {
    #[error("unsupported file reference shape: {0}")]
    UnsupportedShape(&'static str),

    #[error("malformed file info: {0}")]
    Malformed(String),
}

impl FileReference {
    /// Decode a step payload into zero or more references.
    ///
    /// Arrays yield one reference per element; `null` yields none.
    pub fn decode(value: &Value) -> Result<Vec<FileReference>, ReferenceDecodeError> {
        match value {
            Value::Null => Ok(Vec::new()),
            Value::String(raw) => Self::decode_str(raw),
            Value::Object(_) => {
                let info: StructuredFileInfo = serde_json::from_value(value.clone())
                    .map_err(|e| ReferenceDecodeError::Malformed(e.to_string()))?;
                Ok(vec![FileReference::Structured(info)])
            }
            Value::Array(items) => {
                let mut refs = Vec::with_capacity(items.len());
                for item in items {
                    refs.extend(Self::decode(item)?);
                }
                Ok(refs)
            }
            Value::Bool(_) => Err(ReferenceDecodeError::UnsupportedShape("boolean")),
            Value::Number(_) => Err(ReferenceDecodeError::UnsupportedShape("number")),
        }
    }

    fn decode_str(raw: &str) -> Result<Vec<FileReference>, ReferenceDecodeError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }
        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            let nested: Value = serde_json::from_str(trimmed)
                .map_err(|e| ReferenceDecodeError::Malformed(e.to_string()))?;
            return Self::decode(&nested);
        }
        Ok(vec![FileReference::ImageUrl(trimmed.to_string())])
    }

    /// The location string (path, `file://` URI or URL) this reference points at.
    pub fn location(&self) -> Option<&str> {
        match self {
            FileReference::ImageUrl(url) => Some(url.as_str()),
            FileReference::Structured(info) => info
                .uri
                .as_deref()
                .or(info.url.as_deref())
                .filter(|s| !s.trim().is_empty()),
        }
    }

    /// Structured info, when present.
    pub fn info(&self) -> Option<&StructuredFileInfo> {
        match self {
            FileReference::ImageUrl(_) => None,
            FileReference::Structured(info) => Some(info),
        }
    }
}
