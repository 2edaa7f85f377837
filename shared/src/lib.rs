pub mod active;
pub mod camera;
pub mod dataset;
pub mod filter;
pub mod geo;
pub mod heat;
pub mod priority;
pub mod region;
pub mod sync;
pub mod tracker;

pub use active::{ActiveRegion, ActiveRegionWriter, Subscription, active_region_cell};
pub use camera::{CameraTarget, Easing, HighlightMarker, MapSyncConfig, Transition};
pub use dataset::{DatasetError, HeatDataset};
pub use filter::{FilterStage, RegionView, filter_region};
pub use geo::{BoundingBox, LatLng};
pub use heat::HeatStyle;
pub use priority::{PriorityTier, tier_of};
pub use region::{GeoPoint, Region, RegionFocus, RegionSummary};
pub use sync::{MapSurface, MapSynchronizer, MarkerId, SyncOutcome};
pub use tracker::{IntersectionSample, IntersectionTracker};
