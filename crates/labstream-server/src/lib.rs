//! HTTP telemetry server.
//!
//! Read-only JSON surface over the windowed store, plus CSV export of the
//! durable logs. All state lives in labstream-core; this crate only shapes
//! it for the wire.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::get,
};
use log::{error, info};
use serde::Deserialize;

use labstream_core::{ChannelSnapshot, LogSink, Reading, StoreError, TelemetryStore};
use labstream_core::format_iso8601_ms;

/// Shared server state.
struct AppState {
    store: Arc<TelemetryStore>,
    sink: Arc<LogSink>,
    started: Instant,
}

#[derive(Deserialize)]
struct SnapshotParams {
    /// Only the last N readings of the window.
    tail: Option<usize>,
}

async fn handle_index(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let ids = state.store.channel_ids();
    Json(serde_json::json!({
        "name": "Labstream Server",
        "version": labstream_core::VERSION,
        "channels": ids,
        "endpoints": {
            "/": "This API index",
            "/health": "Liveness, version and uptime",
            "/channels": "The channel table with current window sizes",
            "/channels/{channel}": {
                "method": "GET",
                "description": "Snapshot of a channel's in-memory window",
                "params": {
                    "tail": "Only the last N readings (default: the whole window)",
                }
            },
            "/channels/{channel}/export": "Full durable CSV log as an attachment",
        },
        "examples": {
            "snapshot": "/channels/temperature?tail=10",
            "export": "/channels/ph/export",
        }
    }))
}

async fn handle_health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": labstream_core::VERSION,
        "channels": state.store.channel_count(),
        "uptime_secs": state.started.elapsed().as_secs(),
    }))
}

async fn handle_channels(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let channels: Vec<serde_json::Value> = state
        .store
        .channel_ids()
        .iter()
        .filter_map(|id| {
            let spec = state.store.spec(id)?;
            let readings = state.store.len(id).ok()?;
            Some(serde_json::json!({
                "id": spec.id,
                "value_field": spec.value_field,
                "retention_window_secs": spec.retention_window.as_secs(),
                "production_period_secs": spec.production_period.as_secs(),
                "readings": readings,
            }))
        })
        .collect();
    Json(serde_json::json!({
        "channels": channels,
        "total": channels.len(),
    }))
}

async fn handle_snapshot(
    State(state): State<Arc<AppState>>,
    Path(channel): Path<String>,
    Query(params): Query<SnapshotParams>,
) -> (StatusCode, Json<serde_json::Value>) {
    let Some(spec) = state.store.spec(&channel).cloned() else {
        return not_found(&channel);
    };
    let snapshot = match params.tail {
        Some(n) => state.store.snapshot_tail(&channel, n),
        None => state.store.snapshot(&channel),
    };
    match snapshot {
        Ok(snap) => (StatusCode::OK, Json(render_snapshot(&snap, &spec.value_field))),
        Err(_) => not_found(&channel),
    }
}

async fn handle_export(
    State(state): State<Arc<AppState>>,
    Path(channel): Path<String>,
) -> Response {
    match state.sink.export(&channel) {
        Ok(bytes) => {
            let headers = [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{channel}.csv\""),
                ),
            ];
            (StatusCode::OK, headers, bytes).into_response()
        }
        Err(StoreError::UnknownChannel(_)) => not_found(&channel).into_response(),
        Err(e) => {
            error!("{channel}: export failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": format!("export failed: {e}") })),
            )
                .into_response()
        }
    }
}

fn not_found(channel: &str) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": format!("unknown channel '{channel}'"),
            "hint": "GET /channels lists the registered channels",
        })),
    )
}

/// Shape one snapshot for the wire.
fn render_snapshot(snapshot: &ChannelSnapshot, value_field: &str) -> serde_json::Value {
    serde_json::json!({
        "channel": snapshot.channel,
        "latest": snapshot.latest.map(|r| render_reading(&r, value_field)),
        "history": snapshot
            .history
            .iter()
            .map(|r| render_reading(r, value_field))
            .collect::<Vec<_>>(),
    })
}

/// Render a reading with the channel's own value key, e.g.
/// `{"timestamp": "2026-02-15T08:00:00Z", "temp_c": 24.61}`.
fn render_reading(reading: &Reading, value_field: &str) -> serde_json::Value {
    let mut row = serde_json::Map::new();
    row.insert(
        "timestamp".to_string(),
        format_iso8601_ms(reading.timestamp).into(),
    );
    row.insert(value_field.to_string(), reading.value.into());
    serde_json::Value::Object(row)
}

/// Build the axum router.
fn build_router(store: Arc<TelemetryStore>, sink: Arc<LogSink>) -> Router {
    let state = Arc::new(AppState {
        store,
        sink,
        started: Instant::now(),
    });

    Router::new()
        .route("/", get(handle_index))
        .route("/health", get(handle_health))
        .route("/channels", get(handle_channels))
        .route("/channels/{channel}", get(handle_snapshot))
        .route("/channels/{channel}/export", get(handle_export))
        .with_state(state)
}

/// Run the HTTP telemetry server.
pub async fn run_server(store: Arc<TelemetryStore>, sink: Arc<LogSink>, host: &str, port: u16) {
    let app = build_router(store, sink);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    info!("listening on http://{addr}");
    axum::serve(listener, app).await.unwrap();
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_reading_uses_the_channel_value_key() {
        let rendered = render_reading(&Reading::new(946_684_800_000, 24.61), "temp_c");
        assert_eq!(rendered["timestamp"], "2000-01-01T00:00:00Z");
        assert_eq!(rendered["temp_c"], 24.61);
        assert!(rendered.get("value").is_none());
    }

    #[test]
    fn test_render_snapshot_shape() {
        let snap = ChannelSnapshot {
            channel: "ph".to_string(),
            latest: Some(Reading::new(2000, 6.8)),
            history: vec![Reading::new(1000, 6.5), Reading::new(2000, 6.8)],
        };
        let rendered = render_snapshot(&snap, "ph");
        assert_eq!(rendered["channel"], "ph");
        assert_eq!(rendered["latest"]["ph"], 6.8);
        assert_eq!(rendered["history"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_render_empty_snapshot_has_null_latest() {
        let snap = ChannelSnapshot {
            channel: "ph".to_string(),
            latest: None,
            history: Vec::new(),
        };
        let rendered = render_snapshot(&snap, "ph");
        assert!(rendered["latest"].is_null());
        assert_eq!(rendered["history"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_unknown_channel_is_a_404() {
        let (status, body) = not_found("co2");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.0["error"].as_str().unwrap().contains("co2"));
    }
}
