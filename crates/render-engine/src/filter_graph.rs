//! ffmpeg filtergraph construction.
//!
//! Input `i` (0-based) is image `i`, looped; the audio track is input `n`.
//!
//! ```text
//! [0:v] scale/format/drawtext [v0] ─ trim [hold0] ─┐
//!                                                  ├─ xfade [trans1] ─┐
//! [1:v] scale/format/drawtext [v1] ─ trim [hold1] ─┘                  ├─ xfade [trans2] ─▶ map
//! [2:v] scale/format/drawtext [v2] ─ trim [hold2] ────────────────────┘
//! ```

use std::fmt;

use slidereel_common::error::{SlidereelError, SlidereelResult};
use slidereel_model::overlay::TextOverlay;
use slidereel_model::params::Resolution;
use slidereel_model::slide::ImageSlide;
use slidereel_processing::overlay::{render_drawtext, OverlayEngine};

/// Output pad of single-slide and concat graphs.
pub const FINAL_VIDEO_PAD: &str = "vout";

/// Transition names understood by ffmpeg's `xfade` filter.
const XFADE_TRANSITIONS: &[&str] = &[
    "fade", "fadeblack", "fadewhite", "fadegrays", "fadefast", "fadeslow", "dissolve", "distance",
    "pixelize", "radial", "wipeleft", "wiperight", "wipeup", "wipedown", "wipetl", "wipetr",
    "wipebl", "wipebr", "slideleft", "slideright", "slideup", "slidedown", "smoothleft",
    "smoothright", "smoothup", "smoothdown", "circlecrop", "rectcrop", "circleopen",
    "circleclose", "vertopen", "vertclose", "horzopen", "horzclose", "diagtl", "diagtr", "diagbl",
    "diagbr", "hlslice", "hrslice", "vuslice", "vdslice", "hblur", "squeezeh", "squeezev",
    "zoomin", "hlwind", "hrwind", "vuwind", "vdwind", "coverleft", "coverright", "coverup",
    "coverdown", "revealleft", "revealright", "revealup", "revealdown",
];

/// Normalize a transition name, falling back to `fade` for unknown names.
pub fn xfade_transition_name(requested: &str) -> &'static str {
    let normalized = requested.trim().to_ascii_lowercase();
    match XFADE_TRANSITIONS.iter().copied().find(|name| *name == normalized) {
        Some(name) => name,
        None => {
            tracing::warn!(requested, "Unknown xfade transition, using fade");
            "fade"
        }
    }
}

/// Round a resolution down to even dimensions (minimum 2x2).
pub fn even_resolution(resolution: Resolution) -> Resolution {
    let even = Resolution::new(
        (resolution.width - resolution.width % 2).max(2),
        (resolution.height - resolution.height % 2).max(2),
    );
    if even != resolution {
        tracing::warn!(
            requested = %resolution,
            adjusted = %even,
            "Odd output resolution rounded down for H.264"
        );
    }
    even
}

/// A complete `-filter_complex` graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterGraph {
    stages: Vec<String>,
    video_pad: String,
}

impl FilterGraph {
    /// Individual `;`-separated stages, in order.
    pub fn stages(&self) -> &[String] {
        &self.stages
    }

    /// Label of the pad to map as the output video stream, with brackets.
    pub fn video_map(&self) -> String {
        format!("[{}]", self.video_pad)
    }

    pub fn video_pad(&self) -> &str {
        &self.video_pad
    }

    /// Whether any stage uses a crossfade.
    pub fn has_transitions(&self) -> bool {
        self.stages.iter().any(|stage| stage.contains("xfade="))
    }
}

impl fmt::Display for FilterGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stages.join(";"))
    }
}

/// Transition settings for a graph.
#[derive(Debug, Clone, Copy)]
pub struct TransitionSpec<'a> {
    /// xfade transition name.
    pub kind: &'a str,
    /// Crossfade length in seconds; 0 concatenates without blending.
    pub duration: f64,
}

/// A built graph plus the overlay (with placeholders resolved) that ended
/// up on each slide.
#[derive(Debug, Clone)]
pub struct GraphBuild {
    pub graph: FilterGraph,
    pub rendered_overlays: Vec<Option<TextOverlay>>,
}

/// Build the filtergraph for `slides` shown for `durations` seconds each.
pub fn build_filter_graph(
    slides: &[ImageSlide],
    durations: &[f64],
    resolution: Resolution,
    transition: TransitionSpec<'_>,
    overlays: &OverlayEngine<'_>,
) -> SlidereelResult<GraphBuild> {
    if slides.is_empty() {
        return Err(SlidereelError::configuration(
            "Cannot build a filter graph without slides",
        ));
    }
    if slides.len() != durations.len() {
        return Err(SlidereelError::configuration(format!(
            "{} slides but {} durations",
            slides.len(),
            durations.len()
        )));
    }
    if !transition.duration.is_finite() || transition.duration < 0.0 {
        return Err(SlidereelError::configuration(format!(
            "Transition duration must be >= 0, got {}",
            transition.duration
        )));
    }

    let resolution = even_resolution(resolution);
    let mut rendered_overlays = Vec::with_capacity(slides.len());
    let mut stages = Vec::new();

    if slides.len() == 1 {
        let (chain, overlay) = slide_chain(&slides[0], 0, resolution, overlays);
        rendered_overlays.push(overlay);
        stages.push(format!(
            "[0:v]{chain},{trim}[{FINAL_VIDEO_PAD}]",
            trim = trim_filter(durations[0])
        ));
        return Ok(GraphBuild {
            graph: FilterGraph {
                stages,
                video_pad: FINAL_VIDEO_PAD.to_string(),
            },
            rendered_overlays,
        });
    }

    for (index, slide) in slides.iter().enumerate() {
        let (chain, overlay) = slide_chain(slide, index, resolution, overlays);
        rendered_overlays.push(overlay);
        stages.push(format!("[{index}:v]{chain}[v{index}]"));
    }

    for (index, duration) in durations.iter().enumerate() {
        stages.push(format!("[v{index}]{}[hold{index}]", trim_filter(*duration)));
    }

    let video_pad = if transition.duration == 0.0 {
        let inputs: String = (0..slides.len()).map(|i| format!("[hold{i}]")).collect();
        stages.push(format!(
            "{inputs}concat=n={n}:v=1:a=0[{FINAL_VIDEO_PAD}]",
            n = slides.len()
        ));
        FINAL_VIDEO_PAD.to_string()
    } else {
        let kind = xfade_transition_name(transition.kind);
        let mut previous = "hold0".to_string();
        // Length of the composed stream so far.
        let mut composed = durations[0];
        for (index, duration) in durations.iter().enumerate().skip(1) {
            let offset = (composed - transition.duration).max(0.0);
            let output = format!("trans{index}");
            stages.push(format!(
                "[{previous}][hold{index}]xfade=transition={kind}:duration={td:.3}:offset={offset:.3}[{output}]",
                td = transition.duration,
            ));
            composed += duration - transition.duration;
            previous = output;
        }
        previous
    };

    tracing::debug!(
        slides = slides.len(),
        stages = stages.len(),
        video_pad = %video_pad,
        "Filter graph built"
    );

    Ok(GraphBuild {
        graph: FilterGraph { stages, video_pad },
        rendered_overlays,
    })
}

/// scale/format plus an optional drawtext for one slide, without pads.
fn slide_chain(
    slide: &ImageSlide,
    index: usize,
    resolution: Resolution,
    overlays: &OverlayEngine<'_>,
) -> (String, Option<TextOverlay>) {
    let mut chain = format!(
        "scale={w}:{h}:force_divisible_by=2,setsar=1,format=yuv420p",
        w = resolution.width,
        h = resolution.height
    );

    let Some(spec) = slide.text_overlay.as_ref() else {
        return (chain, None);
    };

    match overlays.prepare(spec) {
        Ok(prepared) => {
            chain.push(',');
            chain.push_str(&render_drawtext(&prepared));
            (chain, Some(prepared))
        }
        Err(reason) => {
            tracing::warn!(
                slide = index,
                step_key = %slide.step_key,
                overlay_id = %spec.id,
                %reason,
                "Skipping text overlay"
            );
            (chain, None)
        }
    }
}

fn trim_filter(duration: f64) -> String {
    format!("trim=duration={duration:.3},setpts=PTS-STARTPTS")
}
