use std::sync::Arc;

use axum::Json;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use tracing::warn;

use crate::config::{CONFIG_CACHE_CONTROL, HEATMAP_CACHE_CONTROL};
use crate::state::AppState;

/// Full dataset document, revalidated through its fingerprint ETag.
pub async fn get_heatmap(State(state): State<AppState>, headers: HeaderMap) -> Response {
    state.observability.record_dataset_request();
    conditional_json(
        &state,
        &headers,
        &state.etag("heatmap"),
        Arc::clone(&state.dataset_json),
        HEATMAP_CACHE_CONTROL,
    )
}

pub async fn get_regions(State(state): State<AppState>, headers: HeaderMap) -> Response {
    conditional_json(
        &state,
        &headers,
        &state.etag("regions"),
        Arc::clone(&state.regions_json),
        HEATMAP_CACHE_CONTROL,
    )
}

/// Filtered heat view for one region; 404 with a JSON body for unknown ids.
pub async fn get_region(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    state.observability.record_region_view_request();
    let Some(json) = state.region_views.get(&id).cloned() else {
        state.observability.record_unknown_region_request();
        warn!(region = %id, "region view requested for unknown region");
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": "unknown region",
                "id": id,
            })),
        )
            .into_response();
    };
    conditional_json(
        &state,
        &headers,
        &state.etag(&format!("region-{id}")),
        json,
        HEATMAP_CACHE_CONTROL,
    )
}

pub async fn get_config(State(state): State<AppState>) -> Response {
    json_bytes_response(
        Bytes::clone(&state.config_json),
        CONFIG_CACHE_CONTROL,
        None,
    )
}

fn conditional_json(
    state: &AppState,
    headers: &HeaderMap,
    etag: &str,
    body: Arc<Bytes>,
    cache_control: &'static str,
) -> Response {
    if if_none_match_matches(headers, etag) {
        state.observability.record_not_modified();
        return not_modified_response(cache_control, Some(etag));
    }
    json_bytes_response(Bytes::clone(&body), cache_control, Some(etag))
}

fn json_bytes_response(body: Bytes, cache_control: &'static str, etag: Option<&str>) -> Response {
    let mut response = Response::new(Body::from(body));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(cache_control),
    );
    if let Some(etag) = etag
        && let Ok(etag_header) = HeaderValue::from_str(etag)
    {
        headers.insert(header::ETAG, etag_header);
    }
    response
}

fn not_modified_response(cache_control: &'static str, etag: Option<&str>) -> Response {
    let mut response = StatusCode::NOT_MODIFIED.into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(cache_control),
    );
    if let Some(etag) = etag
        && let Ok(etag_header) = HeaderValue::from_str(etag)
    {
        headers.insert(header::ETAG, etag_header);
    }
    response
}

fn normalize_etag(candidate: &str) -> &str {
    candidate.strip_prefix("W/").unwrap_or(candidate).trim()
}

fn if_none_match_matches(headers: &HeaderMap, etag: &str) -> bool {
    let Some(value) = headers.get(header::IF_NONE_MATCH) else {
        return false;
    };
    let Ok(raw) = value.to_str() else {
        return false;
    };

    raw.split(',').any(|candidate| {
        let candidate = candidate.trim();
        candidate == "*" || normalize_etag(candidate) == normalize_etag(etag)
    })
}
