// tests/metrics.rs
//
// Own test binary: installs the global Prometheus recorder exactly once.

use std::sync::Arc;

use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use clock_dashboard::config::{SensorConfig, SensorCredentials};
use clock_dashboard::metrics::Metrics;
use clock_dashboard::transport::MockTransport;
use clock_dashboard::Sensor;
use tower::ServiceExt;

#[tokio::test]
async fn metrics_endpoint_reports_refresh_outcomes() {
    let metrics = Metrics::init().expect("install recorder");

    let mock = Arc::new(MockTransport::status(500));
    mock.push_ok(include_str!("fixtures/sensor_device.json"));
    let sensor = Sensor::new(
        mock.clone(),
        &SensorConfig::default(),
        SensorCredentials {
            app_id: "app".into(),
            device_id: "dev".into(),
            token: "tok".into(),
        },
    );
    sensor.fetch().await;
    sensor.fetch().await;

    let resp = metrics
        .router()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap(); // 1 MiB
    let text = String::from_utf8(body.to_vec()).unwrap();

    assert!(text.contains("collector_refresh_total"), "{text}");
    assert!(text.contains(r#"outcome="updated""#), "{text}");
    assert!(text.contains(r#"outcome="failed""#), "{text}");
    assert!(text.contains(r#"reason="status""#), "{text}");
    assert!(
        text.contains("collector_last_success_timestamp_seconds"),
        "{text}"
    );
}
