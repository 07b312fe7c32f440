//! Error types shared across Slidereel crates.

use std::path::PathBuf;

/// Top-level error type for a video build.
///
/// `Configuration`, `Probe` and `Encode` abort the whole build. Overlay
/// problems are reported through [`OverlayValidationError`] instead and never
/// surface here.
#[derive(Debug, thiserror::Error)]
pub enum SlidereelError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Probe error: {message}")]
    Probe { message: String },

    #[error("Encode error: {message}")]
    Encode {
        message: String,
        /// Captured encoder stderr, if the process got far enough to emit any.
        diagnostics: Option<String>,
    },

    #[error("Encode cancelled")]
    Cancelled,

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias using SlidereelError.
pub type SlidereelResult<T> = Result<T, SlidereelError>;

impl SlidereelError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
        }
    }

    pub fn probe(msg: impl Into<String>) -> Self {
        Self::Probe {
            message: msg.into(),
        }
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode {
            message: msg.into(),
            diagnostics: None,
        }
    }

    pub fn encode_with_diagnostics(msg: impl Into<String>, diagnostics: impl Into<String>) -> Self {
        Self::Encode {
            message: msg.into(),
            diagnostics: Some(diagnostics.into()),
        }
    }

    /// Whether this error belongs to the configuration class (bad input data).
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. } | Self::FileNotFound { .. })
    }

    /// Encoder diagnostics attached to an encode failure.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            Self::Encode { diagnostics, .. } => diagnostics.as_deref(),
            _ => None,
        }
    }
}

/// Reason a single text overlay was rejected.
///
/// Never fatal: the slide still renders, without that overlay.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OverlayValidationError {
    #[error("overlay is not enabled")]
    Disabled,

    #[error("overlay text is empty")]
    EmptyText,

    #[error("overlay could not be decoded: {0}")]
    Malformed(String),
}
