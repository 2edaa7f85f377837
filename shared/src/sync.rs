use std::sync::Arc;

use tracing::{debug, warn};

use crate::camera::{CameraTarget, HighlightMarker, MapSyncConfig, Transition};
use crate::dataset::HeatDataset;
use crate::filter::{FilterStage, RegionView, filter_region};
use crate::heat::HeatStyle;

pub type MarkerId = u64;

/// The rendering sink the synchronizer drives. Implemented by the canvas map
/// in the browser and by recording fakes in tests.
pub trait MapSurface {
    /// Animate the camera; a new request supersedes one in flight.
    fn fly_to(&mut self, target: CameraTarget, transition: Transition);
    /// Replace the heat layer contents and style.
    fn set_heat(&mut self, view: &RegionView);
    fn add_marker(&mut self, marker: &HighlightMarker) -> MarkerId;
    fn remove_marker(&mut self, id: MarkerId);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The region resolved and the surface now shows it.
    Applied,
    /// No region is active yet.
    Idle,
    /// The id matched no configured region; the surface was left untouched.
    UnknownRegion,
}

/// Keeps a [`MapSurface`] in line with the active region.
///
/// Remembers what was last pushed so each change only issues the updates that
/// differ, and guarantees at most one highlight marker exists at a time.
pub struct MapSynchronizer<S: MapSurface> {
    surface: S,
    dataset: Arc<HeatDataset>,
    transition: Transition,
    camera: Option<CameraTarget>,
    heat: Option<RegionView>,
    highlight: Option<(MarkerId, HighlightMarker)>,
}

impl<S: MapSurface> MapSynchronizer<S> {
    pub fn new(surface: S, dataset: Arc<HeatDataset>, config: &MapSyncConfig) -> Self {
        Self {
            surface,
            dataset,
            transition: config.transition(),
            camera: None,
            heat: None,
            highlight: None,
        }
    }

    /// Paint the whole dataset before any region becomes active.
    pub fn show_all(&mut self) {
        let view = match self.dataset.overview_region() {
            Some(region) => filter_region(&self.dataset.points, region),
            None => RegionView {
                region_id: String::new(),
                stage: FilterStage::Overview,
                points: self.dataset.points.clone(),
                synthetic: false,
                style: HeatStyle::mixed(),
            },
        };
        self.push_heat(view);
    }

    /// React to an active-region change.
    pub fn apply(&mut self, active: Option<&str>) -> SyncOutcome {
        let Some(id) = active else {
            return SyncOutcome::Idle;
        };
        let Some(region) = self.dataset.region(id) else {
            warn!(region = id, "active region is not configured; keeping current map state");
            return SyncOutcome::UnknownRegion;
        };

        let view = filter_region(&self.dataset.points, region);
        debug!(
            region = id,
            stage = ?view.stage,
            points = view.points.len(),
            synthetic = view.synthetic,
            "syncing map to region"
        );
        let target = CameraTarget {
            center: region.center,
            zoom: f64::from(region.zoom),
        };
        let marker = HighlightMarker {
            region_id: region.id.clone(),
            position: region.center,
            title: region.title.clone(),
        };

        self.push_heat(view);

        if self.camera != Some(target) {
            self.surface.fly_to(target, self.transition);
            self.camera = Some(target);
        }

        let unchanged = self
            .highlight
            .as_ref()
            .is_some_and(|(_, current)| *current == marker);
        if !unchanged {
            if let Some((old_id, _)) = self.highlight.take() {
                self.surface.remove_marker(old_id);
            }
            let new_id = self.surface.add_marker(&marker);
            self.highlight = Some((new_id, marker));
        }

        SyncOutcome::Applied
    }

    fn push_heat(&mut self, view: RegionView) {
        if self.heat.as_ref() != Some(&view) {
            self.surface.set_heat(&view);
            self.heat = Some(view);
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn highlight(&self) -> Option<&HighlightMarker> {
        self.highlight.as_ref().map(|(_, marker)| marker)
    }

    pub fn camera(&self) -> Option<CameraTarget> {
        self.camera
    }

    pub fn heat(&self) -> Option<&RegionView> {
        self.heat.as_ref()
    }
}
