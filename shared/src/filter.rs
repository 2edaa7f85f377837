use serde::{Deserialize, Serialize};

use crate::geo::approx_distance_km;
use crate::heat::HeatStyle;
use crate::region::{GeoPoint, Region};

/// Value given to the stand-in point when a tier focus matches nothing.
pub const SYNTHETIC_POINT_VALUE: f64 = 50.0;

/// Which spatial step produced a view's candidate set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterStage {
    Overview,
    BoundingBox,
    Proximity,
}

/// Points to render for one region, plus how they were chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionView {
    pub region_id: String,
    pub stage: FilterStage,
    pub points: Vec<GeoPoint>,
    /// `points` is the single stand-in at the region center.
    pub synthetic: bool,
    pub style: HeatStyle,
}

impl RegionView {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn max_value(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.value)
            .filter(|v| v.is_finite())
            .fold(0.0, f64::max)
    }
}

/// Select the points a region's heat layer should draw.
///
/// Order, first match wins:
/// 1. overview focus returns `points` unchanged;
/// 2. otherwise points inside the bounding box (edges inclusive);
/// 3. if none, points closer than the region's proximity radius to its center;
/// 4. a tier focus then keeps only that tier, falling back to one synthetic
///    point at the center when nothing matches.
pub fn filter_region(points: &[GeoPoint], region: &Region) -> RegionView {
    let style = HeatStyle::for_focus(region.focus);

    if region.is_overview() {
        return RegionView {
            region_id: region.id.clone(),
            stage: FilterStage::Overview,
            points: points.to_vec(),
            synthetic: false,
            style,
        };
    }

    let mut stage = FilterStage::BoundingBox;
    let mut selected: Vec<GeoPoint> = points
        .iter()
        .filter(|p| region.bbox.contains(p.lat, p.lng))
        .copied()
        .collect();

    if selected.is_empty() {
        stage = FilterStage::Proximity;
        let radius_km = region.proximity_radius_km();
        selected = points
            .iter()
            .filter(|p| approx_distance_km(region.center, p.lat, p.lng) < radius_km)
            .copied()
            .collect();
    }

    let mut synthetic = false;
    if let Some(tier) = region.focus.tier() {
        selected.retain(|p| p.tier() == tier);
        if selected.is_empty() {
            selected.push(GeoPoint::new(
                region.center.lat,
                region.center.lng,
                SYNTHETIC_POINT_VALUE,
            ));
            synthetic = true;
        }
    }

    RegionView {
        region_id: region.id.clone(),
        stage,
        points: selected,
        synthetic,
        style,
    }
}
