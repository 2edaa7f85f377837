use std::fmt::Write as _;

use axum::Json;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;

use crate::state::{AppState, ObservabilitySnapshot};

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let observability = state.observability.snapshot();
    Json(serde_json::json!({
        "status": "ok",
        "points": state.dataset.points.len(),
        "regions": state.dataset.regions.len(),
        "fingerprint": format!("{:08x}", state.fingerprint),
        "dataset_source": state.source.describe(),
        "uptime_secs": state.uptime_secs(),
        "observability": {
            "dataset_requests_total": observability.dataset_requests_total,
            "region_view_requests_total": observability.region_view_requests_total,
            "unknown_region_requests_total": observability.unknown_region_requests_total,
            "not_modified_responses_total": observability.not_modified_responses_total,
        }
    }))
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = render_prometheus_metrics(
        state.dataset.points.len(),
        state.dataset.regions.len(),
        state.uptime_secs(),
        state.observability.snapshot(),
    );

    (
        [
            (header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-store"),
        ],
        body,
    )
}

fn render_prometheus_metrics(
    point_count: usize,
    region_count: usize,
    uptime_secs: i64,
    observability: ObservabilitySnapshot,
) -> String {
    let mut body = String::new();
    let mut gauge = |name: &str, help: &str, value: String| {
        let _ = writeln!(body, "# HELP {name} {help}");
        let _ = writeln!(body, "# TYPE {name} gauge");
        let _ = writeln!(body, "{name} {value}");
    };
    gauge(
        "janconnect_heatmap_points",
        "Number of points in the served heatmap dataset.",
        point_count.to_string(),
    );
    gauge(
        "janconnect_heatmap_regions",
        "Number of scroll regions in the served heatmap dataset.",
        region_count.to_string(),
    );
    gauge(
        "janconnect_uptime_seconds",
        "Seconds since the server started.",
        uptime_secs.to_string(),
    );

    let counters = [
        (
            "janconnect_dataset_requests_total",
            "Total full-dataset API requests.",
            observability.dataset_requests_total,
        ),
        (
            "janconnect_region_view_requests_total",
            "Total region view API requests.",
            observability.region_view_requests_total,
        ),
        (
            "janconnect_unknown_region_requests_total",
            "Region view requests for ids that match no region.",
            observability.unknown_region_requests_total,
        ),
        (
            "janconnect_not_modified_responses_total",
            "Responses answered with 304 Not Modified.",
            observability.not_modified_responses_total,
        ),
    ];
    for (name, help, value) in counters {
        let _ = writeln!(body, "# HELP {name} {help}");
        let _ = writeln!(body, "# TYPE {name} counter");
        let _ = writeln!(body, "{name} {value}");
    }

    body
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use janconnect_shared::MapSyncConfig;

    use super::render_prometheus_metrics;
    use crate::state::{AppState, ObservabilitySnapshot};

    async fn spawn_test_server(state: AppState) -> (SocketAddr, tokio::task::JoinHandle<()>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener address");
        let app = crate::app::build_app(state, std::path::Path::new("client/dist"));
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve test app");
        });
        (addr, handle)
    }

    #[test]
    fn metrics_output_contains_prometheus_help_type_and_values() {
        let observability = ObservabilitySnapshot {
            dataset_requests_total: 4,
            region_view_requests_total: 12,
            unknown_region_requests_total: 3,
            not_modified_responses_total: 7,
        };

        let metrics = render_prometheus_metrics(41, 6, 90, observability);

        assert!(metrics.contains("# HELP janconnect_heatmap_points"));
        assert!(metrics.contains("# TYPE janconnect_heatmap_points gauge"));
        assert!(metrics.contains("# TYPE janconnect_region_view_requests_total counter"));
        assert!(metrics.contains("janconnect_heatmap_points 41"));
        assert!(metrics.contains("janconnect_heatmap_regions 6"));
        assert!(metrics.contains("janconnect_uptime_seconds 90"));
        assert!(metrics.contains("janconnect_dataset_requests_total 4"));
        assert!(metrics.contains("janconnect_region_view_requests_total 12"));
        assert!(metrics.contains("janconnect_unknown_region_requests_total 3"));
        assert!(metrics.contains("janconnect_not_modified_responses_total 7"));
    }

    #[tokio::test]
    async fn health_and_metrics_expose_expected_contract() {
        let state = AppState::bundled(MapSyncConfig::default()).expect("bundled state");
        let point_count = state.dataset.points.len() as u64;
        let (addr, server_handle) = spawn_test_server(state).await;
        let base_url = format!("http://{addr}");
        let client = reqwest::Client::new();

        client
            .get(format!("{base_url}/api/heatmap/regions/sp-deoghar"))
            .send()
            .await
            .expect("region request")
            .error_for_status()
            .expect("region status");

        let health = client
            .get(format!("{base_url}/api/health"))
            .send()
            .await
            .expect("health request")
            .error_for_status()
            .expect("health status")
            .json::<serde_json::Value>()
            .await
            .expect("parse health");

        assert_eq!(health.get("status").and_then(|v| v.as_str()), Some("ok"));
        assert_eq!(health.get("points").and_then(|v| v.as_u64()), Some(point_count));
        assert_eq!(
            health.get("dataset_source").and_then(|v| v.as_str()),
            Some("bundled")
        );
        assert_eq!(
            health
                .get("observability")
                .and_then(|v| v.get("region_view_requests_total"))
                .and_then(|v| v.as_u64()),
            Some(1)
        );

        let metrics = client
            .get(format!("{base_url}/api/metrics"))
            .send()
            .await
            .expect("metrics request")
            .error_for_status()
            .expect("metrics status")
            .text()
            .await
            .expect("parse metrics text");

        assert!(metrics.contains("# TYPE janconnect_region_view_requests_total counter"));
        assert!(metrics.contains("janconnect_region_view_requests_total 1"));
        assert!(metrics.contains("janconnect_unknown_region_requests_total 0"));

        server_handle.abort();
        let _ = server_handle.await;
    }
}
