//! Corruption intensity model
//!
//! One scalar in [0, 1] drives every glitch in the game. It is derived from
//! two monotonic session counters and recomputed every tick.

use serde::{Deserialize, Serialize};

use crate::tuning::{IntensityTuning, NarrativeTuning};

/// Compute intensity from playtime and death count using the default weights
///
/// `min(playtime / 120, 0.5) + min(deaths / 5, 0.5)`, clamped to [0, 1].
pub fn compute_intensity(playtime_secs: f32, deaths: u32) -> f32 {
    compute_intensity_with(&IntensityTuning::default(), playtime_secs, deaths)
}

/// Compute intensity with explicit weights
pub fn compute_intensity_with(tuning: &IntensityTuning, playtime_secs: f32, deaths: u32) -> f32 {
    // NaN and negative playtime both count as zero
    let playtime = if playtime_secs > 0.0 { playtime_secs } else { 0.0 };
    let time_term = (playtime / tuning.seconds_to_cap).min(tuning.term_cap);
    let death_term = (deaths as f32 / tuning.deaths_to_cap).min(tuning.term_cap);
    (time_term + death_term).clamp(0.0, 1.0)
}

/// Coarse intensity bucket used for message selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntensityBand {
    Low,
    Mid,
    High,
}

impl IntensityBand {
    /// Classify with the default band edges (0.3 and 0.6)
    pub fn of(intensity: f32) -> Self {
        Self::with_edges(intensity, 0.3, 0.6)
    }

    pub fn from_tuning(intensity: f32, tuning: &NarrativeTuning) -> Self {
        Self::with_edges(intensity, tuning.mid_band_start, tuning.high_band_start)
    }

    fn with_edges(intensity: f32, mid: f32, high: f32) -> Self {
        if intensity < mid {
            IntensityBand::Low
        } else if intensity < high {
            IntensityBand::Mid
        } else {
            IntensityBand::High
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_scenarios() {
        assert_eq!(compute_intensity(300.0, 10), 1.0);
        // The time term is already saturated after one minute
        assert_eq!(compute_intensity(60.0, 0), 0.5);
        assert!((compute_intensity(30.0, 0) - 0.25).abs() < 1e-6);
        assert_eq!(compute_intensity(0.0, 0), 0.0);
        assert!((compute_intensity(0.0, 1) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_each_term_saturates_at_half() {
        assert_eq!(compute_intensity(10_000.0, 0), 0.5);
        assert_eq!(compute_intensity(0.0, 1_000), 0.5);
    }

    #[test]
    fn test_bad_playtime_is_zero() {
        assert_eq!(compute_intensity(-50.0, 0), 0.0);
        assert_eq!(compute_intensity(f32::NAN, 0), 0.0);
    }

    #[test]
    fn test_bands() {
        assert_eq!(IntensityBand::of(0.0), IntensityBand::Low);
        assert_eq!(IntensityBand::of(0.29), IntensityBand::Low);
        assert_eq!(IntensityBand::of(0.3), IntensityBand::Mid);
        assert_eq!(IntensityBand::of(0.59), IntensityBand::Mid);
        assert_eq!(IntensityBand::of(0.6), IntensityBand::High);
        assert_eq!(IntensityBand::of(1.0), IntensityBand::High);
    }

    proptest! {
        #[test]
        fn intensity_stays_in_unit_range(t in 0.0f32..1.0e6, d in 0u32..10_000) {
            let i = compute_intensity(t, d);
            prop_assert!((0.0..=1.0).contains(&i));
        }

        #[test]
        fn intensity_is_monotone(
            t in 0.0f32..1000.0,
            dt in 0.0f32..1000.0,
            d in 0u32..100,
            dd in 0u32..100,
        ) {
            let base = compute_intensity(t, d);
            prop_assert!(compute_intensity(t + dt, d) >= base);
            prop_assert!(compute_intensity(t, d + dd) >= base);
        }
    }
}
