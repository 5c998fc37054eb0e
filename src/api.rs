use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::State,
    response::Html,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use tower_http::{services::ServeFile, trace::TraceLayer};

use crate::almanac::{Almanac, AlmanacResults};
use crate::sensor::{Sensor, SensorReading};
use crate::snippets::{self, DisplaySettings};

#[derive(Clone)]
pub struct AppState {
    pub almanac: Arc<Almanac>,
    pub sensor: Arc<Sensor>,
    pub display: Arc<DisplaySettings>,
}

pub fn create_router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route_service("/clock", ServeFile::new(static_dir.join("clock.html")))
        .route_service("/dist.css", ServeFile::new(static_dir.join("dist.css")))
        .route("/snippets/time", get(snippet_time))
        .route("/snippets/date", get(snippet_date))
        .route("/snippets/temperature", get(snippet_temperature))
        .route("/snippets/humidity", get(snippet_humidity))
        .route("/snippets/sunrise", get(snippet_sunrise))
        .route("/snippets/sunset", get(snippet_sunset))
        .route("/data.json", get(data_json))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn snippet_time(State(state): State<AppState>) -> Html<String> {
    Html(snippets::clock(Utc::now(), &state.display))
}

async fn snippet_date(State(state): State<AppState>) -> Html<String> {
    Html(snippets::date(Utc::now(), &state.display))
}

async fn snippet_temperature(State(state): State<AppState>) -> Html<String> {
    let reading = state.sensor.get();
    Html(snippets::temperature(&reading, Utc::now(), &state.display))
}

async fn snippet_humidity(State(state): State<AppState>) -> Html<String> {
    let reading = state.sensor.get();
    Html(snippets::humidity(&reading, Utc::now(), &state.display))
}

async fn snippet_sunrise(State(state): State<AppState>) -> Html<String> {
    Html(snippets::sunrise(state.almanac.sunrise(), &state.display))
}

async fn snippet_sunset(State(state): State<AppState>) -> Html<String> {
    Html(snippets::sunset(state.almanac.sunset(), &state.display))
}

#[derive(serde::Serialize)]
struct DataOut {
    sensor: Option<SensorReading>,
    almanac: Option<AlmanacResults>,
}

async fn data_json(State(state): State<AppState>) -> Json<DataOut> {
    Json(DataOut {
        sensor: state.sensor.latest().map(|r| *r),
        almanac: state.almanac.results().map(|r| (*r).clone()),
    })
}
