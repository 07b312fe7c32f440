//! Slidereel Render Engine
//!
//! Turns upstream pipeline data into a finished MP4 by driving ffmpeg.
//!
//! # Pipeline Architecture
//!
//! ```text
//! pipeline data ── resolve ── slides ─────────────┐
//!                     │                           │
//!                     └── audio ── ffprobe ──┐    │
//!                                            ▼    ▼
//!                                   Duration Allocation
//!                                            │
//!                                            ▼
//!                      Filtergraph (scale, drawtext, trim, xfade)
//!                                            │
//!                                            ▼
//!                                   Encode (H.264 + AAC)
//!                                            │
//!                                            ▼
//!                                  output.mp4 + metadata
//! ```

pub mod export;
pub mod filter_graph;
pub mod probe;
pub mod resolve;

pub use export::*;
pub use filter_graph::{build_filter_graph, FilterGraph, GraphBuild, TransitionSpec};
pub use probe::{probe_audio_duration, tool_available};
pub use resolve::{resolve_inputs, ResolvedInputs};
