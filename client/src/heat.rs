use janconnect_shared::{HeatDataset, HeatStyle, MapSyncConfig, heat};

const DATASET_URL: &str = "/api/heatmap";
const CONFIG_URL: &str = "/api/heatmap/config";

/// Where the dataset on screen came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataSource {
    Server,
    Bundled,
}

pub async fn fetch_dataset() -> Result<HeatDataset, String> {
    let resp = gloo_net::http::Request::get(DATASET_URL)
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;
    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }
    let text = resp
        .text()
        .await
        .map_err(|e| format!("read error: {e}"))?;
    HeatDataset::from_json(&text).map_err(|e| e.to_string())
}

pub async fn fetch_sync_config() -> Result<MapSyncConfig, String> {
    let resp = gloo_net::http::Request::get(CONFIG_URL)
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;
    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }
    resp.json::<MapSyncConfig>()
        .await
        .map_err(|e| format!("parse error: {e}"))
}

/// Server dataset and config when reachable, otherwise the copy compiled into
/// the bundle with default sync settings.
pub async fn load_heatmap() -> Result<(HeatDataset, MapSyncConfig, DataSource), String> {
    let config = match fetch_sync_config().await {
        Ok(config) => config,
        Err(e) => {
            web_sys::console::warn_1(&format!("Heatmap config fetch failed: {e}").into());
            MapSyncConfig::default()
        }
    };
    match fetch_dataset().await {
        Ok(dataset) => Ok((dataset, config, DataSource::Server)),
        Err(e) => {
            web_sys::console::warn_1(
                &format!("Heatmap fetch failed, using bundled data: {e}").into(),
            );
            HeatDataset::bundled()
                .map(|dataset| (dataset, config, DataSource::Bundled))
                .map_err(|e| e.to_string())
        }
    }
}

/// Outer radius of one heat blob in CSS pixels.
pub fn blob_radius(style: &HeatStyle) -> f64 {
    (style.radius + style.blur).max(1.0)
}

/// Blob center opacity for a point of `value` against the view's `max_value`.
pub fn blob_alpha(value: f64, max_value: f64) -> f64 {
    0.25 + 0.5 * heat::intensity(value, max_value)
}

pub fn rgba((r, g, b): (u8, u8, u8), alpha: f64) -> String {
    format!("rgba({r},{g},{b},{:.3})", alpha.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use janconnect_shared::PriorityTier;

    #[test]
    fn blob_radius_includes_blur() {
        assert_eq!(blob_radius(&HeatStyle::mixed()), 60.0);
        assert_eq!(blob_radius(&HeatStyle::for_tier(PriorityTier::High)), 70.0);
    }

    #[test]
    fn blob_alpha_scales_with_intensity() {
        assert_eq!(blob_alpha(0.0, 200.0), 0.25);
        assert_eq!(blob_alpha(200.0, 200.0), 0.75);
        assert_eq!(blob_alpha(50.0, 0.0), 0.25);
        assert!(blob_alpha(100.0, 200.0) < blob_alpha(180.0, 200.0));
    }

    #[test]
    fn rgba_formats_css_color() {
        assert_eq!(rgba((255, 59, 48), 0.5), "rgba(255,59,48,0.500)");
        assert_eq!(rgba((0, 0, 0), 4.0), "rgba(0,0,0,1.000)");
    }
}
