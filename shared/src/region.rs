use serde::{Deserialize, Serialize};

use crate::geo::{BoundingBox, LatLng};
use crate::priority::{PriorityTier, tier_of};

/// Proximity radius used when a region does not declare its own.
pub const DEFAULT_FALLBACK_RADIUS_KM: f64 = 200.0;

/// A reported-activity sample. The priority tier is always derived from `value`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
    pub value: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64, value: f64) -> Self {
        Self { lat, lng, value }
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    pub fn tier(&self) -> PriorityTier {
        tier_of(self.value)
    }
}

/// What a region's map view concentrates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegionFocus {
    /// Every point in the dataset, no spatial filtering.
    Overview,
    /// All tiers inside the region.
    #[default]
    All,
    /// Only points of one tier inside the region.
    Tier { tier: PriorityTier },
}

impl RegionFocus {
    pub fn tier(&self) -> Option<PriorityTier> {
        match self {
            RegionFocus::Tier { tier } => Some(*tier),
            RegionFocus::Overview | RegionFocus::All => None,
        }
    }
}

/// A named viewport bound to one scroll section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub narrative: String,
    pub center: LatLng,
    pub zoom: u8,
    pub bbox: BoundingBox,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_radius_km: Option<f64>,
    #[serde(default)]
    pub focus: RegionFocus,
}

impl Region {
    pub fn is_overview(&self) -> bool {
        matches!(self.focus, RegionFocus::Overview)
    }

    pub fn proximity_radius_km(&self) -> f64 {
        self.fallback_radius_km
            .unwrap_or(DEFAULT_FALLBACK_RADIUS_KM)
    }

    /// `Region center: 23.344, 85.310`
    pub fn center_label(&self) -> String {
        format!(
            "Region center: {:.3}, {:.3}",
            self.center.lat, self.center.lng
        )
    }
}

/// Listing entry for region pickers and the HTTP API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSummary {
    pub id: String,
    pub title: String,
    pub center: LatLng,
    pub zoom: u8,
    pub focus: RegionFocus,
}

impl From<&Region> for RegionSummary {
    fn from(region: &Region) -> Self {
        Self {
            id: region.id.clone(),
            title: region.title.clone(),
            center: region.center,
            zoom: region.zoom,
            focus: region.focus,
        }
    }
}
