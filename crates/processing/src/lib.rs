//! Slidereel Processing
//!
//! Turns resolved slides into render decisions:
//! - **Duration allocation:** Per-slide on-screen time so the video,
//!   net of crossfade overlap, matches the audio
//! - **Text overlays:** Placeholder substitution, anchor positions,
//!   filter-safe escaping, and `drawtext` stage generation
//!
//! This crate is pure computation with no I/O and no process spawning.
//! All inputs are data; all outputs are data.

pub mod duration;
pub mod overlay;

pub use duration::{allocate_durations, DurationAllocation, DURATION_TOLERANCE_SECS};
pub use overlay::{
    check_text_overlay, escape_ffmpeg_text, is_enabled, render_drawtext, resolve_placeholders,
    resolve_position, validate_text_overlay_config, OverlayEngine, PositionExpr, OVERLAY_MARGIN_PX,
};
