//! Slidereel Model
//!
//! Defines the data contracts for one video build:
//! - **Slides:** Ordered still images with optional duration and text overlay
//! - **Overlay:** Text blocks rendered on top of a slide
//! - **Params:** Resolution, transition and encoder settings for the output
//! - **Pipeline:** Upstream step outputs and the file references they carry
//! - **Metadata:** The record describing a finished video
//!
//! Everything here is created fresh per build and discarded afterwards.

pub mod metadata;
pub mod overlay;
pub mod params;
pub mod pipeline;
pub mod slide;

pub use metadata::*;
pub use overlay::*;
pub use params::*;
pub use pipeline::*;
pub use slide::*;
