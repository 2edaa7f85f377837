use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use janconnect_shared::{DatasetError, HeatDataset, MapSyncConfig};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to read heatmap dataset {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error("failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Where the served dataset was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    Bundled,
    File(PathBuf),
}

impl DatasetSource {
    pub fn describe(&self) -> String {
        match self {
            DatasetSource::Bundled => "bundled".to_string(),
            DatasetSource::File(path) => path.display().to_string(),
        }
    }
}

/// Immutable dataset plus every payload the API serves, serialized once at startup.
#[derive(Clone)]
pub struct AppState {
    pub dataset: Arc<HeatDataset>,
    pub source: DatasetSource,
    pub sync_config: MapSyncConfig,
    pub fingerprint: u32,
    pub dataset_json: Arc<Bytes>,
    pub regions_json: Arc<Bytes>,
    pub config_json: Arc<Bytes>,
    /// Region id -> pre-serialized `RegionView`.
    pub region_views: Arc<HashMap<String, Arc<Bytes>>>,
    pub started_at: DateTime<Utc>,
    pub observability: Arc<ObservabilityCounters>,
}

#[derive(Debug, Default)]
pub struct ObservabilityCounters {
    dataset_requests_total: AtomicU64,
    region_view_requests_total: AtomicU64,
    unknown_region_requests_total: AtomicU64,
    not_modified_responses_total: AtomicU64,
}

#[derive(Debug, Clone, Copy)]
pub struct ObservabilitySnapshot {
    pub dataset_requests_total: u64,
    pub region_view_requests_total: u64,
    pub unknown_region_requests_total: u64,
    pub not_modified_responses_total: u64,
}

impl ObservabilityCounters {
    pub fn snapshot(&self) -> ObservabilitySnapshot {
        ObservabilitySnapshot {
            dataset_requests_total: self.dataset_requests_total.load(Ordering::Relaxed),
            region_view_requests_total: self.region_view_requests_total.load(Ordering::Relaxed),
            unknown_region_requests_total: self
                .unknown_region_requests_total
                .load(Ordering::Relaxed),
            not_modified_responses_total: self
                .not_modified_responses_total
                .load(Ordering::Relaxed),
        }
    }

    pub fn record_dataset_request(&self) {
        self.dataset_requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_region_view_request(&self) {
        self.region_view_requests_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unknown_region_request(&self) {
        self.unknown_region_requests_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_not_modified(&self) {
        self.not_modified_responses_total
            .fetch_add(1, Ordering::Relaxed);
    }
}

impl AppState {
    pub fn new(
        dataset: HeatDataset,
        source: DatasetSource,
        sync_config: MapSyncConfig,
    ) -> Result<Self, StateError> {
        dataset.validate()?;
        let fingerprint = dataset.fingerprint()?;

        let dataset_json = Bytes::from(serde_json::to_vec(&dataset)?);
        let regions_json = Bytes::from(serde_json::to_vec(&dataset.summaries())?);
        let config_json = Bytes::from(serde_json::to_vec(&sync_config)?);

        let mut region_views = HashMap::with_capacity(dataset.regions.len());
        for region in &dataset.regions {
            if let Some(view) = dataset.view(&region.id) {
                let json = Bytes::from(serde_json::to_vec(&view)?);
                region_views.insert(region.id.clone(), Arc::new(json));
            }
        }

        Ok(Self {
            dataset: Arc::new(dataset),
            source,
            sync_config,
            fingerprint,
            dataset_json: Arc::new(dataset_json),
            regions_json: Arc::new(regions_json),
            config_json: Arc::new(config_json),
            region_views: Arc::new(region_views),
            started_at: Utc::now(),
            observability: Arc::new(ObservabilityCounters::default()),
        })
    }

    pub fn bundled(sync_config: MapSyncConfig) -> Result<Self, StateError> {
        Self::new(HeatDataset::bundled()?, DatasetSource::Bundled, sync_config)
    }

    /// Load from `path` when given, otherwise serve the bundled dataset.
    pub async fn load(path: Option<&Path>, sync_config: MapSyncConfig) -> Result<Self, StateError> {
        let Some(path) = path else {
            return Self::bundled(sync_config);
        };
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| StateError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let dataset = HeatDataset::from_json(&text)?;
        Self::new(dataset, DatasetSource::File(path.to_path_buf()), sync_config)
    }

    /// Strong validator derived from the dataset fingerprint.
    pub fn etag(&self, resource: &str) -> String {
        format!("\"{resource}-{:08x}\"", self.fingerprint)
    }

    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds().max(0)
    }
}
