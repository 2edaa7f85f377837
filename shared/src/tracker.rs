use std::collections::HashMap;

use tracing::debug;

use crate::active::{ActiveRegion, ActiveRegionWriter};

/// Fraction of a section that must be visible before it becomes active.
pub const DEFAULT_INTERSECTION_THRESHOLD: f64 = 0.55;

/// Clamp a configured threshold into `0.0..=1.0`; NaN selects the default.
pub fn normalize_threshold(threshold: f64) -> f64 {
    if threshold.is_nan() {
        DEFAULT_INTERSECTION_THRESHOLD
    } else {
        threshold.clamp(0.0, 1.0)
    }
}

/// One observation of a section, as delivered by the host's intersection primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionSample {
    pub region_id: String,
    /// Visible fraction of the section, `0.0..=1.0`.
    pub ratio: f64,
    pub is_intersecting: bool,
}

impl IntersectionSample {
    pub fn new(region_id: impl Into<String>, ratio: f64, is_intersecting: bool) -> Self {
        Self {
            region_id: region_id.into(),
            ratio,
            is_intersecting,
        }
    }
}

/// Turns section visibility samples into active-region writes.
///
/// Owns the single writer of the active-region cell. A registered section
/// activates its region when it crosses the threshold upward; falling below
/// only re-arms it. Within one batch the last activation wins.
pub struct IntersectionTracker {
    writer: ActiveRegionWriter,
    threshold: f64,
    /// Registered section ids and whether each is currently above threshold.
    sections: HashMap<String, bool>,
    observing: bool,
}

impl IntersectionTracker {
    pub fn new(writer: ActiveRegionWriter, threshold: f64) -> Self {
        Self {
            writer,
            threshold: normalize_threshold(threshold),
            sections: HashMap::new(),
            observing: true,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn active(&self) -> ActiveRegion {
        self.writer.reader()
    }

    /// Start observing a section. Returns `false` after [`disconnect`](Self::disconnect)
    /// or when the id is already registered.
    pub fn register(&mut self, region_id: impl Into<String>) -> bool {
        if !self.observing {
            return false;
        }
        let region_id = region_id.into();
        if self.sections.contains_key(&region_id) {
            return false;
        }
        self.sections.insert(region_id, false);
        true
    }

    pub fn is_registered(&self, region_id: &str) -> bool {
        self.sections.contains_key(region_id)
    }

    pub fn registered_count(&self) -> usize {
        self.sections.len()
    }

    pub fn is_observing(&self) -> bool {
        self.observing
    }

    /// Apply a batch of samples in delivery order.
    ///
    /// Returns the region that ended up activated by this batch, if any.
    pub fn observe(&mut self, samples: &[IntersectionSample]) -> Option<String> {
        if !self.observing {
            return None;
        }

        let mut activated: Option<&str> = None;
        for sample in samples {
            let Some(was_visible) = self.sections.get_mut(sample.region_id.as_str()) else {
                continue;
            };
            let visible = sample.is_intersecting && sample.ratio >= self.threshold;
            if visible && !*was_visible {
                activated = Some(sample.region_id.as_str());
                if self.writer.set(&sample.region_id) {
                    debug!(region = %sample.region_id, ratio = sample.ratio, "active region changed");
                }
            }
            *was_visible = visible;
        }
        activated.map(str::to_string)
    }

    /// Release every registration. Later samples are ignored.
    pub fn disconnect(&mut self) {
        self.sections.clear();
        self.observing = false;
    }
}
