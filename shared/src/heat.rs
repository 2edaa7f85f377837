use serde::{Deserialize, Serialize};

use crate::priority::PriorityTier;
use crate::region::RegionFocus;

/// Gradient stop: position in `0.0..=1.0` and colour.
pub type GradientStop = (f64, (u8, u8, u8));

/// Heat-layer rendering parameters for one region view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatStyle {
    /// Blob radius in screen pixels.
    pub radius: f64,
    /// Extra soft edge in screen pixels.
    pub blur: f64,
    /// Stops sorted by position.
    pub gradient: Vec<GradientStop>,
}

const MIXED_GRADIENT: [GradientStop; 3] = [
    (0.3, (52, 199, 89)),
    (0.6, (255, 204, 0)),
    (1.0, (255, 59, 48)),
];

impl HeatStyle {
    /// The default mixed-priority layer.
    pub fn mixed() -> Self {
        Self {
            radius: 35.0,
            blur: 25.0,
            gradient: MIXED_GRADIENT.to_vec(),
        }
    }

    /// A layer tinted to a single tier.
    pub fn for_tier(tier: PriorityTier) -> Self {
        Self {
            radius: 40.0,
            blur: 30.0,
            gradient: vec![
                (0.4, tier.rgb()),
                (0.7, tier.light_rgb()),
                (1.0, tier.rgb()),
            ],
        }
    }

    pub fn for_focus(focus: RegionFocus) -> Self {
        match focus.tier() {
            Some(tier) => Self::for_tier(tier),
            None => Self::mixed(),
        }
    }

    /// Colour at `intensity`, clamped to the first/last stop outside their range.
    pub fn color_at(&self, intensity: f64) -> (u8, u8, u8) {
        gradient_color(&self.gradient, intensity)
    }
}

fn lerp_u8(a: u8, b: u8, t: f64) -> u8 {
    let t = t.clamp(0.0, 1.0);
    let value = a as f64 + (b as f64 - a as f64) * t;
    value.round().clamp(0.0, 255.0) as u8
}

pub fn gradient_color(stops: &[GradientStop], intensity: f64) -> (u8, u8, u8) {
    let Some(&(first_pos, first_color)) = stops.first() else {
        return (0, 0, 0);
    };
    let intensity = if intensity.is_nan() {
        0.0
    } else {
        intensity.clamp(0.0, 1.0)
    };
    if intensity <= first_pos {
        return first_color;
    }

    for window in stops.windows(2) {
        let (left_pos, left_color) = window[0];
        let (right_pos, right_color) = window[1];
        if intensity >= left_pos && intensity <= right_pos {
            let span = (right_pos - left_pos).max(f64::EPSILON);
            let t = (intensity - left_pos) / span;
            return (
                lerp_u8(left_color.0, right_color.0, t),
                lerp_u8(left_color.1, right_color.1, t),
                lerp_u8(left_color.2, right_color.2, t),
            );
        }
    }

    stops.last().map(|(_, color)| *color).unwrap_or(first_color)
}

/// Normalise a point value into `0.0..=1.0` against the layer maximum.
pub fn intensity(value: f64, max_value: f64) -> f64 {
    if max_value.is_nan() || max_value <= 0.0 || !value.is_finite() {
        return 0.0;
    }
    (value / max_value).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_gradient_matches_stop_colours() {
        let style = HeatStyle::mixed();
        assert_eq!(style.color_at(0.0), (52, 199, 89));
        assert_eq!(style.color_at(0.3), (52, 199, 89));
        assert_eq!(style.color_at(0.6), (255, 204, 0));
        assert_eq!(style.color_at(1.0), (255, 59, 48));
        assert_eq!(style.color_at(7.0), (255, 59, 48));
    }

    #[test]
    fn gradient_interpolates_between_stops() {
        let stops = [(0.0, (0, 0, 0)), (1.0, (200, 100, 50))];
        assert_eq!(gradient_color(&stops, 0.5), (100, 50, 25));
    }

    #[test]
    fn tier_focus_selects_tier_style() {
        let style = HeatStyle::for_focus(RegionFocus::Tier {
            tier: PriorityTier::Medium,
        });
        assert_eq!(style.radius, 40.0);
        assert_eq!(style.blur, 30.0);
        assert_eq!(style.color_at(1.0), PriorityTier::Medium.rgb());
        assert_eq!(HeatStyle::for_focus(RegionFocus::Overview), HeatStyle::mixed());
    }

    #[test]
    fn intensity_handles_zero_max() {
        assert_eq!(intensity(10.0, 0.0), 0.0);
        assert_eq!(intensity(50.0, 200.0), 0.25);
        assert_eq!(intensity(500.0, 200.0), 1.0);
        assert_eq!(intensity(f64::NAN, 200.0), 0.0);
    }

    #[test]
    fn empty_gradient_is_black() {
        assert_eq!(gradient_color(&[], 0.5), (0, 0, 0));
    }
}
