use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::geo::LatLng;
use crate::tracker::{DEFAULT_INTERSECTION_THRESHOLD, normalize_threshold};

pub const DEFAULT_TRANSITION_DURATION_MS: u32 = 1200;

/// Easing curve applied to camera flights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    Linear,
    #[default]
    EaseOutCubic,
    EaseInOut,
}

impl Easing {
    /// Map linear progress `t` in `0.0..=1.0` onto the curve.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseOutCubic => {
                let t = t - 1.0;
                t * t * t + 1.0
            }
            Easing::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let u = -2.0 * t + 2.0;
                    1.0 - u * u * u / 2.0
                }
            }
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::EaseOutCubic => "ease-out-cubic",
            Easing::EaseInOut => "ease-in-out",
        }
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Easing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(Easing::Linear),
            "ease-out-cubic" | "ease-out" | "cubic-out" => Ok(Easing::EaseOutCubic),
            "ease-in-out" => Ok(Easing::EaseInOut),
            other => Err(format!("unknown easing {other:?}")),
        }
    }
}

/// Settings shared by the intersection tracker and the camera synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSyncConfig {
    pub transition_duration_ms: u32,
    pub easing: Easing,
    pub intersection_threshold: f64,
}

impl Default for MapSyncConfig {
    fn default() -> Self {
        Self {
            transition_duration_ms: DEFAULT_TRANSITION_DURATION_MS,
            easing: Easing::default(),
            intersection_threshold: DEFAULT_INTERSECTION_THRESHOLD,
        }
    }
}

impl MapSyncConfig {
    pub fn transition(&self) -> Transition {
        Transition {
            duration_ms: self.transition_duration_ms,
            easing: self.easing,
        }
    }

    pub fn threshold(&self) -> f64 {
        normalize_threshold(self.intersection_threshold)
    }
}

/// Animated camera move parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub duration_ms: u32,
    pub easing: Easing,
}

/// Where the camera should end up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraTarget {
    pub center: LatLng,
    pub zoom: f64,
}

/// The single pulsing marker placed at the active region's center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightMarker {
    pub region_id: String,
    pub position: LatLng,
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn easing_curves_hit_endpoints() {
        for easing in [Easing::Linear, Easing::EaseOutCubic, Easing::EaseInOut] {
            assert_close(easing.apply(0.0), 0.0, 1e-12);
            assert_close(easing.apply(1.0), 1.0, 1e-12);
            assert_close(easing.apply(2.0), 1.0, 1e-12);
        }
        assert_close(Easing::EaseInOut.apply(0.5), 0.5, 1e-12);
        assert!(Easing::EaseOutCubic.apply(0.5) > 0.5);
    }

    #[test]
    fn easing_parses_identifiers() {
        assert_eq!("linear".parse::<Easing>(), Ok(Easing::Linear));
        assert_eq!(" Ease-Out ".parse::<Easing>(), Ok(Easing::EaseOutCubic));
        assert_eq!("ease-in-out".parse::<Easing>(), Ok(Easing::EaseInOut));
        assert!("bounce".parse::<Easing>().is_err());
        assert_eq!(Easing::EaseInOut.to_string(), "ease-in-out");
    }

    #[test]
    fn config_defaults_fill_missing_fields() {
        let config: MapSyncConfig =
            serde_json::from_str(r#"{"easing":"linear"}"#).expect("config parses");
        assert_eq!(config.easing, Easing::Linear);
        assert_eq!(config.transition_duration_ms, DEFAULT_TRANSITION_DURATION_MS);
        assert_eq!(config.threshold(), DEFAULT_INTERSECTION_THRESHOLD);
        assert_eq!(
            config.transition(),
            Transition {
                duration_ms: 1200,
                easing: Easing::Linear
            }
        );
    }
}
