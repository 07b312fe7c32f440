//! Slide duration allocation.
//!
//! Crossfades overlap the tail of one slide with the head of the next, so
//! they consume time from inside the slides instead of adding to the total.
//! The allocator stretches or shrinks the slides until
//! `sum(durations) - transition * (n - 1)` equals the audio length.

use slidereel_common::error::{SlidereelError, SlidereelResult};

/// Allowed drift between the net slide time and the audio duration.
pub const DURATION_TOLERANCE_SECS: f64 = 0.1;

/// Result of allocating on-screen time to slides.
#[derive(Debug, Clone, PartialEq)]
pub struct DurationAllocation {
    /// Final on-screen duration per slide, in render order.
    pub durations: Vec<f64>,

    /// Factor applied to the requested durations (1.0 when untouched).
    pub scale_factor: f64,

    /// Total time shared between adjacent slides by crossfades.
    pub transition_overlap: f64,
}

impl DurationAllocation {
    /// Sum of all slide durations.
    pub fn total(&self) -> f64 {
        self.durations.iter().sum()
    }

    /// Presentation time once crossfade overlap is removed.
    pub fn net_total(&self) -> f64 {
        self.total() - self.transition_overlap
    }

    pub fn len(&self) -> usize {
        self.durations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }
}

/// Allocate per-slide durations.
///
/// `explicit` holds one entry per slide; `None` (or a non-positive value)
/// means "no preference" and defaults to an equal split of the audio.
/// A single slide always gets exactly `audio_duration`.
pub fn allocate_durations(
    audio_duration: f64,
    transition_duration: f64,
    explicit: &[Option<f64>],
) -> SlidereelResult<DurationAllocation> {
    let n = explicit.len();
    if n == 0 {
        return Err(SlidereelError::configuration(
            "Cannot allocate durations without slides",
        ));
    }
    if !audio_duration.is_finite() || audio_duration <= 0.0 {
        return Err(SlidereelError::configuration(format!(
            "Audio duration must be positive, got {audio_duration}"
        )));
    }
    if !transition_duration.is_finite() || transition_duration < 0.0 {
        return Err(SlidereelError::configuration(format!(
            "Transition duration must be >= 0, got {transition_duration}"
        )));
    }

    if n == 1 {
        return Ok(DurationAllocation {
            durations: vec![audio_duration],
            scale_factor: 1.0,
            transition_overlap: 0.0,
        });
    }

    let default_duration = audio_duration / n as f64;
    let requested: Vec<f64> = explicit
        .iter()
        .enumerate()
        .map(|(index, duration)| match duration {
            Some(secs) if secs.is_finite() && *secs > 0.0 => *secs,
            Some(secs) => {
                tracing::warn!(
                    slide = index,
                    duration = secs,
                    "Ignoring non-positive slide duration"
                );
                default_duration
            }
            None => default_duration,
        })
        .collect();

    let transition_overlap = transition_duration * (n - 1) as f64;
    let raw_total: f64 = requested.iter().sum();
    let net_total = raw_total - transition_overlap;

    if net_total <= 0.0 {
        return Err(SlidereelError::configuration(format!(
            "Transitions ({transition_overlap:.3}s across {n} slides) consume all slide time ({raw_total:.3}s)"
        )));
    }

    if (net_total - audio_duration).abs() <= DURATION_TOLERANCE_SECS {
        tracing::debug!(raw_total, net_total, audio_duration, "Slide durations already match audio");
        return Ok(DurationAllocation {
            durations: requested,
            scale_factor: 1.0,
            transition_overlap,
        });
    }

    // The overlap is fixed, so only the slide total scales:
    // raw_total * f - overlap == audio.
    let scale_factor = (audio_duration + transition_overlap) / raw_total;
    let durations: Vec<f64> = requested.iter().map(|d| d * scale_factor).collect();

    if let Some(shortest) = durations.iter().copied().reduce(f64::min) {
        if shortest < transition_duration {
            tracing::warn!(
                shortest,
                transition_duration,
                "A slide is shorter than the crossfade; transitions will overlap"
            );
        }
    }

    tracing::debug!(
        raw_total,
        transition_overlap,
        audio_duration,
        scale_factor,
        "Scaled slide durations to match audio"
    );

    Ok(DurationAllocation {
        durations,
        scale_factor,
        transition_overlap,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_invariant(allocation: &DurationAllocation, audio: f64) {
        assert!(
            (allocation.net_total() - audio).abs() <= DURATION_TOLERANCE_SECS,
            "net {} vs audio {}",
            allocation.net_total(),
            audio
        );
    }

    #[test]
    fn test_single_slide_gets_exact_audio_duration() {
        let allocation = allocate_durations(7.25, 1.0, &[Some(3.0)]).unwrap();
        assert_eq!(allocation.durations, vec![7.25]);
        assert_eq!(allocation.transition_overlap, 0.0);
        assert_eq!(allocation.scale_factor, 1.0);
    }

    #[test]
    fn test_equal_split_is_scaled_to_absorb_overlap() {
        let allocation = allocate_durations(8.0, 1.0, &[None, None, None]).unwrap();
        assert_eq!(allocation.len(), 3);
        for d in &allocation.durations {
            assert!((d - 10.0 / 3.0).abs() < 1e-9);
        }
        assert!((allocation.scale_factor - 1.25).abs() < 1e-9);
        assert_invariant(&allocation, 8.0);
    }

    #[test]
    fn test_matching_explicit_durations_are_untouched() {
        let allocation = allocate_durations(8.0, 1.0, &[Some(2.0), Some(3.0), Some(5.0)]).unwrap();
        assert_eq!(allocation.durations, vec![2.0, 3.0, 5.0]);
        assert_eq!(allocation.scale_factor, 1.0);
        assert_invariant(&allocation, 8.0);
    }

    #[test]
    fn test_within_tolerance_is_not_scaled() {
        let allocation = allocate_durations(8.05, 1.0, &[Some(2.0), Some(3.0), Some(5.0)]).unwrap();
        assert_eq!(allocation.durations, vec![2.0, 3.0, 5.0]);
    }

    #[test]
    fn test_mixed_explicit_and_default() {
        let allocation = allocate_durations(12.0, 0.5, &[Some(6.0), None, None]).unwrap();
        assert_invariant(&allocation, 12.0);
        // proportions survive scaling
        assert!((allocation.durations[0] / allocation.durations[1] - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_non_positive_explicit_duration_is_ignored() {
        let allocation = allocate_durations(6.0, 0.0, &[Some(-1.0), Some(0.0)]).unwrap();
        assert_eq!(allocation.durations, vec![3.0, 3.0]);
    }

    #[test]
    fn test_zero_transition_splits_evenly() {
        let allocation = allocate_durations(9.0, 0.0, &[None, None, None]).unwrap();
        assert_eq!(allocation.durations, vec![3.0, 3.0, 3.0]);
    }

    #[test]
    fn test_transitions_longer_than_slides_is_configuration_error() {
        let err = allocate_durations(8.0, 5.0, &[Some(1.0), Some(1.0), Some(1.0)]).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_rejects_bad_inputs() {
        assert!(allocate_durations(8.0, 1.0, &[]).unwrap_err().is_configuration());
        assert!(allocate_durations(0.0, 1.0, &[None]).unwrap_err().is_configuration());
        assert!(allocate_durations(8.0, -0.5, &[None, None]).unwrap_err().is_configuration());
        assert!(allocate_durations(f64::NAN, 1.0, &[None]).is_err());
    }

    proptest! {
        #[test]
        fn prop_net_duration_matches_audio(
            audio in 1.0f64..600.0,
            transition in 0.0f64..2.0,
            explicit in prop::collection::vec(prop::option::of(0.5f64..30.0), 1..12),
        ) {
            match allocate_durations(audio, transition, &explicit) {
                Ok(allocation) => {
                    prop_assert_eq!(allocation.len(), explicit.len());
                    prop_assert!((allocation.net_total() - audio).abs() <= DURATION_TOLERANCE_SECS);
                    prop_assert!(allocation.durations.iter().all(|d| *d > 0.0));
                }
                Err(err) => prop_assert!(err.is_configuration()),
            }
        }

        #[test]
        fn prop_default_split_never_errors_when_transitions_fit(
            audio in 10.0f64..600.0,
            n in 1usize..10,
        ) {
            let explicit = vec![None; n];
            let allocation = allocate_durations(audio, 0.5, &explicit).unwrap();
            prop_assert!((allocation.net_total() - audio).abs() <= DURATION_TOLERANCE_SECS);
        }
    }
}
