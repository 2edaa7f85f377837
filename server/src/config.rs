use std::path::PathBuf;

use janconnect_shared::camera::DEFAULT_TRANSITION_DURATION_MS;
use janconnect_shared::tracker::DEFAULT_INTERSECTION_THRESHOLD;
use janconnect_shared::{Easing, MapSyncConfig};
use tracing::warn;

pub const DEFAULT_SERVER_PORT: u16 = 3000;
pub const DEFAULT_STATIC_DIR: &str = "client/dist";

pub const HEATMAP_CACHE_CONTROL: &str = "public, max-age=60";
pub const CONFIG_CACHE_CONTROL: &str = "public, max-age=300";

pub fn server_port() -> u16 {
    std::env::var("SERVER_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_SERVER_PORT)
}

pub fn static_dir() -> PathBuf {
    std::env::var("STATIC_DIR")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR))
}

/// Dataset file to serve instead of the bundled one.
pub fn dataset_path() -> Option<PathBuf> {
    std::env::var("HEATMAP_DATASET_PATH")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

pub fn transition_duration_ms() -> u32 {
    std::env::var("TRANSITION_DURATION_MS")
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_TRANSITION_DURATION_MS)
}

pub fn camera_easing() -> Easing {
    let Ok(raw) = std::env::var("CAMERA_EASING") else {
        return Easing::default();
    };
    raw.parse::<Easing>().unwrap_or_else(|e| {
        warn!(error = %e, "ignoring CAMERA_EASING");
        Easing::default()
    })
}

/// Visible fraction in `(0, 1]` a section needs to become active.
pub fn intersection_threshold() -> f64 {
    std::env::var("INTERSECTION_THRESHOLD")
        .ok()
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|value| value.is_finite() && *value > 0.0 && *value <= 1.0)
        .unwrap_or(DEFAULT_INTERSECTION_THRESHOLD)
}

pub fn sync_config() -> MapSyncConfig {
    MapSyncConfig {
        transition_duration_ms: transition_duration_ms(),
        easing: camera_easing(),
        intersection_threshold: intersection_threshold(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 6] = [
        "SERVER_PORT",
        "STATIC_DIR",
        "HEATMAP_DATASET_PATH",
        "TRANSITION_DURATION_MS",
        "CAMERA_EASING",
        "INTERSECTION_THRESHOLD",
    ];

    fn unset_all() -> Vec<(&'static str, Option<&'static str>)> {
        VARS.iter().map(|name| (*name, None)).collect()
    }

    #[test]
    fn defaults_apply_when_unset() {
        temp_env::with_vars(unset_all(), || {
            assert_eq!(server_port(), DEFAULT_SERVER_PORT);
            assert_eq!(static_dir(), PathBuf::from(DEFAULT_STATIC_DIR));
            assert_eq!(dataset_path(), None);
            assert_eq!(sync_config(), MapSyncConfig::default());
        });
    }

    #[test]
    fn overrides_are_parsed() {
        temp_env::with_vars(
            [
                ("SERVER_PORT", Some("8080")),
                ("STATIC_DIR", Some(" /srv/www ")),
                ("HEATMAP_DATASET_PATH", Some("/data/heatmap.json")),
                ("TRANSITION_DURATION_MS", Some("800")),
                ("CAMERA_EASING", Some("linear")),
                ("INTERSECTION_THRESHOLD", Some("0.4")),
            ],
            || {
                assert_eq!(server_port(), 8080);
                assert_eq!(static_dir(), PathBuf::from("/srv/www"));
                assert_eq!(dataset_path(), Some(PathBuf::from("/data/heatmap.json")));
                let config = sync_config();
                assert_eq!(config.transition_duration_ms, 800);
                assert_eq!(config.easing, Easing::Linear);
                assert_eq!(config.intersection_threshold, 0.4);
            },
        );
    }

    #[test]
    fn invalid_values_fall_back() {
        temp_env::with_vars(
            [
                ("SERVER_PORT", Some("0")),
                ("STATIC_DIR", Some("   ")),
                ("HEATMAP_DATASET_PATH", Some("")),
                ("TRANSITION_DURATION_MS", Some("-5")),
                ("CAMERA_EASING", Some("bounce")),
                ("INTERSECTION_THRESHOLD", Some("1.5")),
            ],
            || {
                assert_eq!(server_port(), DEFAULT_SERVER_PORT);
                assert_eq!(static_dir(), PathBuf::from(DEFAULT_STATIC_DIR));
                assert_eq!(dataset_path(), None);
                assert_eq!(sync_config(), MapSyncConfig::default());
            },
        );
    }
}
