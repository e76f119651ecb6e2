pub mod devices;
pub mod error;

use axum::{
    body::Body,
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tracing::debug;

use crate::state::AppState;

/// Log method, path, status and latency for every request.
async fn log_requests(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let start = std::time::Instant::now();
    let resp = next.run(req).await;
    let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

    debug!(
        %method,
        %path,
        status = resp.status().as_u16(),
        duration_ms,
        "Handled request"
    );

    resp
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/devices/:id/heartbeat", post(devices::record_heartbeat))
        .route(
            "/devices/:id/stats",
            post(devices::record_upload).get(devices::get_stats),
        )
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use axum::http::{header, StatusCode};
    use chrono::{TimeDelta, TimeZone, Utc};
    use serde_json::{json, Value};
    use telemetry_core::Registry;
    use tower::ServiceExt; // for `oneshot`

    async fn test_app() -> (Router, AppState) {
        let registry = Registry::new();
        registry
            .load("device_id,label\ndev1,Kitchen\ndev2,Garage\n".as_bytes())
            .await
            .unwrap();
        let state = AppState::new(registry);
        (build_router(state.clone()), state)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    async fn stats_of(app: &Router, id: &str) -> Value {
        let (status, body) = send(app, get(&format!("/devices/{id}/stats"))).await;
        assert_eq!(status, StatusCode::OK);
        serde_json::from_slice(&body).unwrap()
    }

    fn heartbeat_body(minute: i64) -> String {
        let base = Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap();
        json!({ "sent_at": (base + TimeDelta::minutes(minute)).to_rfc3339() }).to_string()
    }

    fn upload_body(upload_time: i64) -> String {
        json!({ "sent_at": "2024-02-01T09:00:00Z", "upload_time": upload_time }).to_string()
    }

    #[tokio::test]
    async fn test_fresh_device_stats_are_zero() {
        let (app, _) = test_app().await;
        let stats = stats_of(&app, "dev1").await;
        assert_eq!(stats, json!({ "uptime": 0.0, "avg_upload_time": "0" }));
    }

    #[tokio::test]
    async fn test_stats_response_is_json() {
        let (app, _) = test_app().await;
        let resp = app.clone().oneshot(get("/devices/dev1/stats")).await.unwrap();
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/json");
    }

    #[tokio::test]
    async fn test_heartbeats_drive_uptime() {
        let (app, _) = test_app().await;

        for minute in [0, 2, 4, 6, 8, 10] {
            let (status, body) =
                send(&app, post_json("/devices/dev1/heartbeat", &heartbeat_body(minute))).await;
            assert_eq!(status, StatusCode::CREATED);
            assert!(body.is_empty());
        }

        // 6 heartbeats over 10 minutes
        let stats = stats_of(&app, "dev1").await;
        assert!((stats["uptime"].as_f64().unwrap() - 60.0).abs() < 1e-9);
        assert_eq!(stats["avg_upload_time"], "0");
    }

    #[tokio::test]
    async fn test_single_heartbeat_uptime_is_zero() {
        let (app, _) = test_app().await;
        send(&app, post_json("/devices/dev1/heartbeat", &heartbeat_body(0))).await;
        assert_eq!(stats_of(&app, "dev1").await["uptime"], 0.0);
    }

    #[tokio::test]
    async fn test_upload_average() {
        let (app, _) = test_app().await;

        for t in [10, 20, 30] {
            let (status, _) = send(&app, post_json("/devices/dev1/stats", &upload_body(t))).await;
            assert_eq!(status, StatusCode::CREATED);
        }
        for t in [10, 21] {
            send(&app, post_json("/devices/dev2/stats", &upload_body(t))).await;
        }

        assert_eq!(stats_of(&app, "dev1").await["avg_upload_time"], "20");
        assert_eq!(stats_of(&app, "dev2").await["avg_upload_time"], "15");
    }

    #[tokio::test]
    async fn test_unknown_device_is_404_everywhere() {
        let (app, _) = test_app().await;

        let (status, body) =
            send(&app, post_json("/devices/dev3/heartbeat", &heartbeat_body(0))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, b"Device not found");

        let (status, _) = send(&app, post_json("/devices/dev3/stats", &upload_body(5))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, get("/devices/dev3/stats")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_bodies_are_400_and_change_nothing() {
        let (app, state) = test_app().await;

        let bad_heartbeats = [
            "not json",
            "{}",
            r#"{"sent_at": "yesterday"}"#,
            r#"{"sent_at": 1700000000}"#,
            r#"{"sent_at": "2024-02-01 09:00:00Z"}"#,
        ];
        for body in bad_heartbeats {
            let (status, resp) = send(&app, post_json("/devices/dev1/heartbeat", body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
            assert_eq!(resp, b"Bad request format");
        }

        let bad_uploads = [
            "",
            r#"{"sent_at": "2024-02-01T09:00:00Z"}"#,
            r#"{"upload_time": 12}"#,
            r#"{"sent_at": "2024-02-01T09:00:00Z", "upload_time": "12"}"#,
            r#"{"sent_at": "2024-02-01T09:00:00Z", "upload_time": 1.5}"#,
            r#"{"sent_at": "2024-02-01 09:00:00Z", "upload_time": 12}"#,
        ];
        for body in bad_uploads {
            let (status, _) = send(&app, post_json("/devices/dev1/stats", body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
        }

        let snap = state.registry().lookup("dev1").await.unwrap().snapshot().await;
        assert!(snap.heartbeats.is_empty());
        assert!(snap.upload_times.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_body_for_unknown_device_is_400() {
        let (app, _) = test_app().await;
        let (status, _) = send(&app, post_json("/devices/dev3/heartbeat", "{")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_body_accepted_without_content_type() {
        let (app, _) = test_app().await;
        let req = Request::builder()
            .method("POST")
            .uri("/devices/dev1/stats")
            .body(Body::from(upload_body(42)))
            .unwrap();
        let (status, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(stats_of(&app, "dev1").await["avg_upload_time"], "42");
    }

    #[tokio::test]
    async fn test_wrong_method_and_unknown_route() {
        let (app, _) = test_app().await;

        let (status, _) = send(&app, get("/devices/dev1/heartbeat")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

        let (status, _) = send(&app, get("/devices")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_heartbeats_are_all_recorded() {
        let (app, state) = test_app().await;
        let app = Arc::new(app);
        const CLIENTS: i64 = 100;

        let mut handles = Vec::new();
        for i in 0..CLIENTS {
            let app = app.clone();
            handles.push(tokio::spawn(async move {
                let (status, _) =
                    send(&app, post_json("/devices/dev1/heartbeat", &heartbeat_body(i))).await;
                status
            }));
        }
        for h in handles {
            assert_eq!(h.await.unwrap(), StatusCode::CREATED);
        }

        let device = state.registry().lookup("dev1").await.unwrap();
        assert_eq!(device.heartbeat_count().await, CLIENTS as usize);
        assert_eq!(
            state.registry().lookup("dev2").await.unwrap().heartbeat_count().await,
            0
        );

        // 100 heartbeats over 99 minutes
        let uptime = stats_of(&app, "dev1").await["uptime"].as_f64().unwrap();
        assert!((uptime - 100.0 / 99.0 * 100.0).abs() < 1e-9);
    }
}
