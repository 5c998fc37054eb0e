// tests/scheduler.rs
//
// Background loop timing with a paused tokio clock: eager first fetch,
// fixed-interval ticks, and prompt shutdown between ticks.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clock_dashboard::config::{AlmanacConfig, SensorConfig, SensorCredentials};
use clock_dashboard::shutdown;
use clock_dashboard::transport::MockTransport;
use clock_dashboard::{Almanac, Sensor};

const DEVICE: &str = include_str!("fixtures/sensor_device.json");

fn sensor_with(mock: &Arc<MockTransport>) -> Arc<Sensor> {
    let creds = SensorCredentials {
        app_id: "app".into(),
        device_id: "dev".into(),
        token: "tok".into(),
    };
    Arc::new(Sensor::new(mock.clone(), &SensorConfig::default(), creds))
}

async fn wait_for_calls(mock: &MockTransport, n: usize) {
    // sleeping lets the paused clock auto-advance, so the timeout can fire
    tokio::time::timeout(Duration::from_secs(1), async {
        while mock.call_count() < n {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("expected {n} calls, saw {}", mock.call_count()));
}

#[tokio::test(start_paused = true)]
async fn shutdown_after_eager_fetch_stops_without_second_fetch() {
    let mock = Arc::new(MockTransport::ok(DEVICE));
    let sensor = sensor_with(&mock);
    let (trigger, signal) = shutdown::channel();

    let task = tokio::spawn({
        let sensor = sensor.clone();
        async move { sensor.run(signal).await }
    });

    wait_for_calls(&mock, 1).await;
    trigger.trigger();

    tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .expect("scheduler should stop promptly")
        .expect("scheduler task should not panic");

    assert_eq!(mock.call_count(), 1);
    assert_eq!(sensor.get().battery, 80);
}

#[tokio::test(start_paused = true)]
async fn sensor_fetches_on_every_tick() {
    let mock = Arc::new(MockTransport::ok(DEVICE));
    let sensor = sensor_with(&mock);
    let (trigger, signal) = shutdown::channel();

    let task = tokio::spawn({
        let sensor = sensor.clone();
        async move { sensor.run(signal).await }
    });

    // eager fetch + ticks at 5, 10 and 15 minutes
    tokio::time::sleep(Duration::from_secs(15 * 60 + 1)).await;
    assert_eq!(mock.call_count(), 4);

    trigger.trigger();
    task.await.unwrap();
    assert_eq!(mock.call_count(), 4);
}

#[tokio::test(start_paused = true)]
async fn failing_upstream_keeps_ticking_and_stays_empty() {
    let mock = Arc::new(MockTransport::status(500));
    let sensor = sensor_with(&mock);
    let (trigger, signal) = shutdown::channel();

    let task = tokio::spawn({
        let sensor = sensor.clone();
        async move { sensor.run(signal).await }
    });

    tokio::time::sleep(Duration::from_secs(10 * 60 + 1)).await;
    assert_eq!(mock.call_count(), 3);
    assert!(sensor.latest().is_none());

    trigger.trigger();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn almanac_ticks_every_minute_but_fetches_once_per_day() {
    // retried if UTC midnight passes while the collector runs
    loop {
        let today = Utc::now().date_naive();
        let body = format!(
            r#"{{"results":{{"date":"{}","sunrise":"06:00:00","sunset":"21:45:00"}},"status":"OK"}}"#,
            today.format("%Y-%m-%d")
        );
        let mock = Arc::new(MockTransport::ok(body));
        let almanac = Arc::new(Almanac::new(mock.clone(), &AlmanacConfig::default()));
        let (trigger, signal) = shutdown::channel();

        let task = tokio::spawn({
            let almanac = almanac.clone();
            async move { almanac.run(signal).await }
        });

        tokio::time::sleep(Duration::from_secs(10 * 60 + 1)).await;
        let calls = mock.call_count();
        trigger.trigger();
        task.await.unwrap();
        if Utc::now().date_naive() != today {
            continue;
        }

        assert_eq!(calls, 1);
        assert!(almanac.sunrise().is_some());
        break;
    }
}

#[tokio::test(start_paused = true)]
async fn already_cancelled_runs_only_the_eager_fetch() {
    let mock = Arc::new(MockTransport::ok(DEVICE));
    let sensor = sensor_with(&mock);
    let (trigger, signal) = shutdown::channel();
    trigger.trigger();

    tokio::time::timeout(Duration::from_secs(1), sensor.run(signal))
        .await
        .expect("returns without waiting for a tick");
    assert_eq!(mock.call_count(), 1);
}
