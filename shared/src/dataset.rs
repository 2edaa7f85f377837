use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::filter::{RegionView, filter_region};
use crate::region::{GeoPoint, Region, RegionSummary};

const BUNDLED_JSON: &str = include_str!("../data/heatmap.json");

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("heatmap dataset parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("heatmap dataset must define at least one region")]
    NoRegions,
    #[error("region id must not be empty (index {index})")]
    EmptyRegionId { index: usize },
    #[error("region id {0:?} defined more than once")]
    DuplicateRegion(String),
    #[error("only one overview region is allowed, found {first:?} and {second:?}")]
    MultipleOverviews { first: String, second: String },
    #[error("region {id:?}: {reason}")]
    InvalidRegion { id: String, reason: &'static str },
    #[error("point {index}: {reason}")]
    InvalidPoint { index: usize, reason: &'static str },
}

/// The static point collection plus the scroll-bound regions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatDataset {
    pub points: Vec<GeoPoint>,
    #[serde(rename = "scrollpoints")]
    pub regions: Vec<Region>,
}

impl HeatDataset {
    /// Parse and validate a dataset document.
    pub fn from_json(text: &str) -> Result<Self, DatasetError> {
        let dataset: HeatDataset = serde_json::from_str(text)?;
        dataset.validate()?;
        Ok(dataset)
    }

    /// The dataset compiled into the crate.
    pub fn bundled() -> Result<Self, DatasetError> {
        Self::from_json(BUNDLED_JSON)
    }

    pub fn validate(&self) -> Result<(), DatasetError> {
        if self.regions.is_empty() {
            return Err(DatasetError::NoRegions);
        }

        let mut seen: HashSet<&str> = HashSet::with_capacity(self.regions.len());
        let mut overview: Option<&str> = None;
        for (index, region) in self.regions.iter().enumerate() {
            if region.id.trim().is_empty() {
                return Err(DatasetError::EmptyRegionId { index });
            }
            if !seen.insert(region.id.as_str()) {
                return Err(DatasetError::DuplicateRegion(region.id.clone()));
            }
            if region.is_overview() {
                if let Some(first) = overview {
                    return Err(DatasetError::MultipleOverviews {
                        first: first.to_string(),
                        second: region.id.clone(),
                    });
                }
                overview = Some(region.id.as_str());
            }
            validate_region(region)?;
        }

        for (index, point) in self.points.iter().enumerate() {
            validate_point(index, point)?;
        }

        Ok(())
    }

    pub fn region(&self, id: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }

    pub fn overview_region(&self) -> Option<&Region> {
        self.regions.iter().find(|r| r.is_overview())
    }

    pub fn summaries(&self) -> Vec<RegionSummary> {
        self.regions.iter().map(RegionSummary::from).collect()
    }

    /// Filtered view for `id`, or `None` for an unknown region.
    pub fn view(&self, id: &str) -> Option<RegionView> {
        self.region(id)
            .map(|region| filter_region(&self.points, region))
    }

    /// CRC32 over the canonical JSON encoding; stable for identical contents.
    pub fn fingerprint(&self) -> Result<u32, DatasetError> {
        let canonical = serde_json::to_vec(self)?;
        Ok(crc32fast::hash(&canonical))
    }
}

fn validate_region(region: &Region) -> Result<(), DatasetError> {
    let invalid = |reason| DatasetError::InvalidRegion {
        id: region.id.clone(),
        reason,
    };

    if !region.center.is_finite()
        || !region.bbox.south_west.is_finite()
        || !region.bbox.north_east.is_finite()
    {
        return Err(invalid("coordinates must be finite"));
    }
    if !region.center.in_range()
        || !region.bbox.south_west.in_range()
        || !region.bbox.north_east.in_range()
    {
        return Err(invalid("coordinates out of range"));
    }
    if !region.bbox.is_ordered() {
        return Err(invalid("bounding box corners are not south-west/north-east"));
    }
    if let Some(radius) = region.fallback_radius_km
        && (!radius.is_finite() || radius <= 0.0)
    {
        return Err(invalid("fallback radius must be positive"));
    }
    Ok(())
}

fn validate_point(index: usize, point: &GeoPoint) -> Result<(), DatasetError> {
    if !point.lat.is_finite() || !point.lng.is_finite() || !point.value.is_finite() {
        return Err(DatasetError::InvalidPoint {
            index,
            reason: "fields must be finite",
        });
    }
    if !point.position().in_range() {
        return Err(DatasetError::InvalidPoint {
            index,
            reason: "coordinates out of range",
        });
    }
    if point.value < 0.0 {
        return Err(DatasetError::InvalidPoint {
            index,
            reason: "value must be non-negative",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterStage;
    use crate::priority::PriorityTier;
    use crate::region::RegionFocus;

    const MINIMAL: &str = r#"{
        "points": [
            { "lat": 23.6, "lng": 86.4, "value": 160 },
            { "lat": 23.2, "lng": 86.1, "value": 40 }
        ],
        "scrollpoints": [
            { "id": "sp-all", "title": "All", "center": [23.5, 85.0], "zoom": 7,
              "bbox": [[21.9, 83.3], [25.3, 87.9]], "focus": { "kind": "overview" } },
            { "id": "sp-a", "title": "A", "center": [23.5, 86.5], "zoom": 10,
              "bbox": [[23.0, 86.0], [24.0, 87.0]] }
        ]
    }"#;

    fn with_regions(regions: &str) -> String {
        format!(r#"{{ "points": [], "scrollpoints": [{regions}] }}"#)
    }

    #[test]
    fn bundled_dataset_is_valid() {
        let dataset = HeatDataset::bundled().expect("bundled dataset loads");
        assert!(!dataset.points.is_empty());
        let overview = dataset.overview_region().expect("bundled overview region");
        assert_eq!(overview.id, "sp-ranchi");
        for tier in PriorityTier::ALL {
            assert!(
                dataset.points.iter().any(|p| p.tier() == tier),
                "bundled data should contain {tier:?} points"
            );
        }
        assert!(
            dataset
                .regions
                .iter()
                .any(|r| matches!(r.focus, RegionFocus::Tier { .. }))
        );
    }

    #[test]
    fn bundled_regions_exercise_each_filter_stage() {
        let dataset = HeatDataset::bundled().expect("bundled dataset loads");
        let stage = |id: &str| dataset.view(id).expect("bundled region").stage;
        assert_eq!(stage("sp-ranchi"), FilterStage::Overview);
        assert_eq!(stage("sp-hazaribagh"), FilterStage::BoundingBox);
        assert_eq!(stage("sp-sahibganj"), FilterStage::Proximity);

        let sahibganj = dataset.view("sp-sahibganj").expect("bundled region");
        assert!(!sahibganj.points.is_empty());
        assert!(!sahibganj.synthetic);
    }

    #[test]
    fn parses_minimal_document() {
        let dataset = HeatDataset::from_json(MINIMAL).expect("minimal dataset parses");
        assert_eq!(dataset.points.len(), 2);
        assert_eq!(dataset.regions.len(), 2);
        assert_eq!(dataset.summaries()[1].id, "sp-a");

        let view = dataset.view("sp-a").expect("known region");
        assert_eq!(view.stage, FilterStage::BoundingBox);
        assert_eq!(view.points.len(), 2);
        assert!(dataset.view("sp-missing").is_none());
    }

    #[test]
    fn rejects_duplicate_region_ids() {
        let doc = with_regions(
            r#"{ "id": "x", "title": "X", "center": [1, 1], "zoom": 5, "bbox": [[0, 0], [2, 2]] },
               { "id": "x", "title": "X", "center": [1, 1], "zoom": 5, "bbox": [[0, 0], [2, 2]] }"#,
        );
        let err = HeatDataset::from_json(&doc).expect_err("duplicate ids rejected");
        assert!(matches!(err, DatasetError::DuplicateRegion(id) if id == "x"));
    }

    #[test]
    fn rejects_second_overview() {
        let doc = with_regions(
            r#"{ "id": "a", "title": "A", "center": [1, 1], "zoom": 5, "bbox": [[0, 0], [2, 2]], "focus": { "kind": "overview" } },
               { "id": "b", "title": "B", "center": [1, 1], "zoom": 5, "bbox": [[0, 0], [2, 2]], "focus": { "kind": "overview" } }"#,
        );
        let err = HeatDataset::from_json(&doc).expect_err("two overviews rejected");
        assert!(matches!(err, DatasetError::MultipleOverviews { .. }));
    }

    #[test]
    fn rejects_swapped_bbox_and_bad_radius() {
        let swapped = with_regions(
            r#"{ "id": "a", "title": "A", "center": [1, 1], "zoom": 5, "bbox": [[2, 2], [0, 0]] }"#,
        );
        assert!(matches!(
            HeatDataset::from_json(&swapped),
            Err(DatasetError::InvalidRegion { .. })
        ));

        let radius = with_regions(
            r#"{ "id": "a", "title": "A", "center": [1, 1], "zoom": 5, "bbox": [[0, 0], [2, 2]], "fallback_radius_km": 0 }"#,
        );
        assert!(matches!(
            HeatDataset::from_json(&radius),
            Err(DatasetError::InvalidRegion { .. })
        ));
    }

    #[test]
    fn rejects_negative_values_and_empty_regions() {
        let negative = r#"{
            "points": [{ "lat": 1, "lng": 1, "value": -3 }],
            "scrollpoints": [{ "id": "a", "title": "A", "center": [1, 1], "zoom": 5, "bbox": [[0, 0], [2, 2]] }]
        }"#;
        assert!(matches!(
            HeatDataset::from_json(negative),
            Err(DatasetError::InvalidPoint { index: 0, .. })
        ));
        assert!(matches!(
            HeatDataset::from_json(r#"{ "points": [], "scrollpoints": [] }"#),
            Err(DatasetError::NoRegions)
        ));
        assert!(matches!(
            HeatDataset::from_json("{ not json"),
            Err(DatasetError::Parse(_))
        ));
    }

    #[test]
    fn fingerprint_is_stable_and_content_sensitive() {
        let a = HeatDataset::from_json(MINIMAL).expect("parses");
        let b = HeatDataset::from_json(MINIMAL).expect("parses");
        assert_eq!(
            a.fingerprint().expect("fingerprint"),
            b.fingerprint().expect("fingerprint")
        );

        let mut c = b.clone();
        c.points[0].value = 161.0;
        assert_ne!(
            a.fingerprint().expect("fingerprint"),
            c.fingerprint().expect("fingerprint")
        );
    }
}
