use serde::{Deserialize, Serialize};

/// Values at or above this are High priority.
pub const HIGH_THRESHOLD: f64 = 150.0;
/// Values at or above this (and below [`HIGH_THRESHOLD`]) are Medium priority.
pub const MEDIUM_THRESHOLD: f64 = 100.0;

/// Priority tier derived from an activity value. Ordered `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PriorityTier {
    Low,
    Medium,
    High,
}

impl PriorityTier {
    pub const ALL: [PriorityTier; 3] = [PriorityTier::High, PriorityTier::Medium, PriorityTier::Low];

    pub const fn color_hex(self) -> &'static str {
        match self {
            PriorityTier::High => "#FF3B30",
            PriorityTier::Medium => "#FFCC00",
            PriorityTier::Low => "#34C759",
        }
    }

    pub const fn rgb(self) -> (u8, u8, u8) {
        match self {
            PriorityTier::High => (255, 59, 48),
            PriorityTier::Medium => (255, 204, 0),
            PriorityTier::Low => (52, 199, 89),
        }
    }

    /// Lighter companion colour used for the middle stop of the tier gradient.
    pub const fn light_rgb(self) -> (u8, u8, u8) {
        match self {
            PriorityTier::High => (255, 107, 96),
            PriorityTier::Medium => (255, 221, 102),
            PriorityTier::Low => (102, 217, 143),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            PriorityTier::High => "High",
            PriorityTier::Medium => "Medium",
            PriorityTier::Low => "Low",
        }
    }

    pub const fn legend_label(self) -> &'static str {
        match self {
            PriorityTier::High => "High (>= 150)",
            PriorityTier::Medium => "Medium (100-149)",
            PriorityTier::Low => "Low (< 100)",
        }
    }
}

/// Classify an activity value. Total over `f64`: anything that is not at least
/// [`MEDIUM_THRESHOLD`] (negatives, NaN) is Low.
pub fn tier_of(value: f64) -> PriorityTier {
    if value >= HIGH_THRESHOLD {
        PriorityTier::High
    } else if value >= MEDIUM_THRESHOLD {
        PriorityTier::Medium
    } else {
        PriorityTier::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_inclusive_lower_bounds() {
        assert_eq!(tier_of(150.0), PriorityTier::High);
        assert_eq!(tier_of(149.999), PriorityTier::Medium);
        assert_eq!(tier_of(100.0), PriorityTier::Medium);
        assert_eq!(tier_of(99.999), PriorityTier::Low);
        assert_eq!(tier_of(160.0), PriorityTier::High);
    }

    #[test]
    fn degenerate_inputs_fall_through_to_low() {
        assert_eq!(tier_of(-5.0), PriorityTier::Low);
        assert_eq!(tier_of(f64::NEG_INFINITY), PriorityTier::Low);
        assert_eq!(tier_of(f64::NAN), PriorityTier::Low);
        assert_eq!(tier_of(f64::INFINITY), PriorityTier::High);
    }

    #[test]
    fn tier_of_is_monotonic() {
        let mut values: Vec<f64> = (-40..=400).map(|v| v as f64 * 0.5).collect();
        values.extend([99.5, 100.0, 149.5, 150.0, 1e9]);
        values.sort_by(f64::total_cmp);
        for pair in values.windows(2) {
            assert!(
                tier_of(pair[0]) <= tier_of(pair[1]),
                "tier_of({}) > tier_of({})",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn tier_of_is_repeatable() {
        for value in [0.0, 99.0, 100.0, 150.0, 420.0] {
            assert_eq!(tier_of(value), tier_of(value));
        }
    }

    #[test]
    fn tier_serializes_by_name() {
        assert_eq!(
            serde_json::to_string(&PriorityTier::High).expect("serialize tier"),
            "\"High\""
        );
        let parsed: PriorityTier = serde_json::from_str("\"Medium\"").expect("parse tier");
        assert_eq!(parsed, PriorityTier::Medium);
    }
}
