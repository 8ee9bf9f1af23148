//! Integration tests for the airview client against an in-process mock backend

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use airview::config::ApiConfig;
use airview::location_resolver::StaticPosition;
use airview::models::{LocationQuery, SourceType};
use airview::{
    AirQualityApi, AirQualityClient, AirViewError, AlertGate, CityName, Command, Coordinates,
    DataFetcher, ErrorKind, LocationResolver, Phase, ViewController,
};
use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

type Params = Query<HashMap<String, String>>;

async fn snapshot_handler(Query(params): Params) -> Response {
    if let Some(city) = params.get("city") {
        return match city.as_str() {
            "Nowhere" => (StatusCode::NOT_FOUND, "city not found").into_response(),
            "Broken" => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
            "Garbage" => (StatusCode::OK, "<html>not json</html>").into_response(),
            "Slowtown" => {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Json(json!({"city": city, "aqi": 10, "timestamp": "2025-10-05T14:30:00Z"}))
                    .into_response()
            }
            "Smogville" => Json(json!({
                "city": "Smogville",
                "aqi": 250,
                "timestamp": "2025-10-05T14:30:00Z"
            }))
            .into_response(),
            _ => Json(json!({
                "city": city,
                "aqi": 42,
                "timestamp": "2025-10-05T14:30:00",
                "pollutants": {"pm25": 8.1, "o3": 30.0},
                "recent": [40, 41, 42]
            }))
            .into_response(),
        };
    }

    let lat = params.get("lat").and_then(|v| v.parse::<f64>().ok());
    let lon = params.get("lon").and_then(|v| v.parse::<f64>().ok());
    match lat.zip(lon) {
        Some((lat, lon)) => Json(json!({
            "city": "Los Angeles",
            "aqi": 155,
            "timestamp": "2025-10-05T14:30:00Z",
            "coordinates": {"lat": lat, "lon": lon}
        }))
        .into_response(),
        None => (StatusCode::BAD_REQUEST, "missing location").into_response(),
    }
}

async fn nearby_handler(Query(params): Params) -> Response {
    let radius = params.get("radius").cloned().unwrap_or_default();
    Json(json!([
        {"name": "Pasadena", "aqi": 80, "safe": true, "distance": 14.3},
        {"name": format!("Radius {radius}"), "safe": false}
    ]))
    .into_response()
}

async fn nearby_failing() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, "nearby down").into_response()
}

async fn forecast_handler(Query(params): Params) -> Response {
    let lat: f64 = params.get("lat").and_then(|v| v.parse().ok()).unwrap_or_default();
    let lon: f64 = params.get("lon").and_then(|v| v.parse().ok()).unwrap_or_default();
    let hours: u32 = params.get("hours").and_then(|v| v.parse().ok()).unwrap_or(24);
    if lat > 80.0 {
        return Json(json!({"error": "Model not loaded"})).into_response();
    }
    Json(json!({
        "lat": lat,
        "lon": lon,
        "hours": hours,
        "prediction": 61.6,
        "confidence_interval": [50.0, 73.0],
        "timestamp": "2025-10-05T14:30:00Z"
    }))
    .into_response()
}

async fn attribution_handler() -> Json<serde_json::Value> {
    Json(json!([
        {
            "source_name": "NASA TEMPO",
            "source_type": "satellite",
            "url": "https://tempo.si.edu/",
            "citation": "NASA Tropospheric Emissions: Monitoring of Pollution (TEMPO)",
            "license": "Public Domain",
            "description": "Hourly NO2, O3 and HCHO",
            "parameters": ["NO2", "O3", "HCHO"],
            "coverage": "North America",
            "fetched_at": "2025-10-05T14:30:00",
            "additional_info": {"resolution": "2.1 km x 4.4 km"}
        },
        {
            "source_name": "OpenAQ",
            "source_type": "api",
            "url": "https://openaq.org/",
            "citation": "OpenAQ open air quality data",
            "license": "CC BY 4.0",
            "description": "Ground station measurements",
            "parameters": ["PM2.5", "PM10"],
            "coverage": "Global",
            "fetched_at": "2025-10-05T14:30:00"
        }
    ]))
}

async fn citation_handler() -> Json<serde_json::Value> {
    Json(json!({"citation_text": "Data Sources:\n\n- Backend citation\n"}))
}

async fn accuracy_handler() -> Json<serde_json::Value> {
    Json(json!({"model": "RandomForestRegressor", "rmse": 12.5, "r2_score": 0.87}))
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({"status": "healthy"}))
}

fn router(nearby_fails: bool) -> Router {
    let router = Router::new()
        .route("/api/airquality", get(snapshot_handler))
        .route("/api/v1/forecast/location", get(forecast_handler))
        .route("/api/v1/forecast/accuracy", get(accuracy_handler))
        .route("/api/v1/attribution", get(attribution_handler))
        .route("/api/v1/attribution/citation", get(citation_handler))
        .route("/health", get(health_handler));
    if nearby_fails {
        router.route("/api/nearby", get(nearby_failing))
    } else {
        router.route("/api/nearby", get(nearby_handler))
    }
}

async fn start_backend(nearby_fails: bool) -> SocketAddr {
    serve(router(nearby_fails)).await
}

async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn client_for(addr: SocketAddr, timeout_seconds: u32) -> AirQualityClient {
    AirQualityClient::new(&ApiConfig {
        base_url: format!("http://{addr}"),
        timeout_seconds,
    })
    .unwrap()
}

fn city(name: &str) -> LocationQuery {
    LocationQuery::City(CityName::parse(name).unwrap())
}

fn controller_for(addr: SocketAddr, position: Coordinates) -> ViewController {
    let fetcher = DataFetcher::new(Arc::new(client_for(addr, 5)), 25);
    let resolver = LocationResolver::new(
        Box::new(StaticPosition(Ok(position))),
        Duration::from_secs(1),
    );
    ViewController::new(
        fetcher,
        resolver,
        AlertGate::default(),
        Duration::from_millis(100),
    )
}

#[tokio::test]
async fn test_city_snapshot() {
    let addr = start_backend(false).await;
    let client = client_for(addr, 5);

    let snapshot = client.snapshot(&city("Los Angeles, CA")).await.unwrap();
    assert_eq!(snapshot.city, "Los Angeles, CA");
    assert_eq!(snapshot.aqi, 42);
    assert_eq!(snapshot.recent, Some(vec![40, 41, 42]));
    assert_eq!(snapshot.pollutant_readings().len(), 2);
}

#[tokio::test]
async fn test_coordinate_snapshot_echoes_position() {
    let addr = start_backend(false).await;
    let client = client_for(addr, 5);
    let coordinates = Coordinates::new(34.05, -118.24).unwrap();

    let snapshot = client
        .snapshot(&LocationQuery::detected(coordinates))
        .await
        .unwrap();
    assert_eq!(snapshot.coordinates, Some(coordinates));
}

#[tokio::test]
async fn test_nearby_passes_radius() {
    let addr = start_backend(false).await;
    let client = client_for(addr, 5);

    let areas = client
        .nearby(Coordinates::new(34.05, -118.24).unwrap(), 25)
        .await
        .unwrap();
    assert_eq!(areas.len(), 2);
    assert_eq!(areas[1].name, "Radius 25");
    assert_eq!(areas[1].aqi, None);
}

#[tokio::test]
async fn test_not_found_maps_to_server_error() {
    let addr = start_backend(false).await;
    let client = client_for(addr, 5);

    let err = client.snapshot(&city("Nowhere")).await.unwrap_err();
    assert!(matches!(err, AirViewError::Server { status: Some(404), .. }));
    assert_eq!(
        err.user_message(),
        "No air quality data was found for this location."
    );
}

#[tokio::test]
async fn test_internal_error_maps_to_server_error() {
    let addr = start_backend(false).await;
    let client = client_for(addr, 5);

    let err = client.snapshot(&city("Broken")).await.unwrap_err();
    assert!(matches!(err, AirViewError::Server { status: Some(500), .. }));
}

#[tokio::test]
async fn test_malformed_body_maps_to_server_error() {
    let addr = start_backend(false).await;
    let client = client_for(addr, 5);

    let err = client.snapshot(&city("Garbage")).await.unwrap_err();
    assert!(matches!(err, AirViewError::Server { status: None, .. }));
}

#[tokio::test]
async fn test_slow_backend_maps_to_timeout() {
    let addr = start_backend(false).await;
    let client = client_for(addr, 1);

    let err = client.snapshot(&city("Slowtown")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
}

#[tokio::test]
async fn test_unreachable_backend_maps_to_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(addr, 2);
    let err = client.snapshot(&city("Boston")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
}

#[tokio::test]
async fn test_forecast() {
    let addr = start_backend(false).await;
    let client = client_for(addr, 5);

    let forecast = client
        .forecast(Coordinates::new(34.05, -118.24).unwrap(), 48)
        .await
        .unwrap();
    assert_eq!(forecast.hours, 48);
    assert_eq!(forecast.predicted_aqi(), 62);
    assert_eq!(forecast.confidence_interval, [50.0, 73.0]);
}

#[tokio::test]
async fn test_forecast_unavailable() {
    let addr = start_backend(false).await;
    let client = client_for(addr, 5);

    let err = client
        .forecast(Coordinates::new(85.0, 10.0).unwrap(), 24)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Server);
    assert!(err.to_string().contains("Model not loaded"));
}

#[tokio::test]
async fn test_health() {
    let addr = start_backend(false).await;
    let client = client_for(addr, 5);

    let health = client.health().await.unwrap();
    assert!(health.is_healthy());
}

#[tokio::test]
async fn test_model_accuracy() {
    let addr = start_backend(false).await;
    let client = client_for(addr, 5);

    let accuracy = client.accuracy().await.unwrap();
    assert_eq!(accuracy.model, "RandomForestRegressor");
    assert_eq!(accuracy.rmse, 12.5);
    assert_eq!(accuracy.r2_score, 0.87);
}

#[tokio::test]
async fn test_attributions() {
    let addr = start_backend(false).await;
    let client = client_for(addr, 5);

    let sources = client.attributions().await.unwrap();
    assert_eq!(sources.len(), 2);
    assert_eq!(sources[0].source_name, "NASA TEMPO");
    assert_eq!(sources[0].source_type, SourceType::Satellite);
    assert_eq!(sources[1].license, "CC BY 4.0");
    assert_eq!(sources[1].additional_info, None);
}

#[tokio::test]
async fn test_citation_from_backend() {
    let addr = start_backend(false).await;
    let client = client_for(addr, 5);

    let citation = client.citation().await.unwrap();
    assert_eq!(citation, "Data Sources:\n\n- Backend citation\n");
}

#[tokio::test]
async fn test_citation_falls_back_to_attributions_on_404() {
    // Only the list route: the citation path answers 404
    let addr = serve(Router::new().route("/api/v1/attribution", get(attribution_handler))).await;
    let client = client_for(addr, 5);

    let citation = client.citation().await.unwrap();
    assert!(citation.starts_with("Data Sources:\n\n- NASA TEMPO: NASA Tropospheric"));
    let openaq = "- OpenAQ: OpenAQ open air quality data\n  URL: https://openaq.org/\n";
    assert!(citation.contains(openaq));
    assert!(citation.contains("License: CC BY 4.0"));
}

#[tokio::test]
async fn test_citation_server_error_is_not_masked() {
    let addr = serve(
        Router::new().route(
            "/api/v1/attribution/citation",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        ),
    )
    .await;
    let client = client_for(addr, 5);

    let err = client.citation().await.unwrap_err();
    assert!(matches!(err, AirViewError::Server { status: Some(500), .. }));
}

#[tokio::test]
async fn test_controller_locate_shows_nearby() {
    let addr = start_backend(false).await;
    let mut controller = controller_for(addr, Coordinates::new(34.05, -118.24).unwrap());

    controller.handle_command(Command::Locate);
    let alerts = controller.settle().await;

    let state = controller.state();
    assert!(alerts.is_empty());
    assert_eq!(state.phase, Phase::Success);
    assert_eq!(state.snapshot.as_ref().unwrap().aqi, 155);
    assert_eq!(state.nearby.len(), 2);
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_controller_nearby_failure_keeps_snapshot() {
    let addr = start_backend(true).await;
    let mut controller = controller_for(addr, Coordinates::new(34.05, -118.24).unwrap());

    controller.handle_command(Command::Locate);
    controller.settle().await;

    let state = controller.state();
    assert_eq!(state.phase, Phase::Success);
    assert!(state.snapshot.is_some());
    assert!(state.nearby.is_empty());
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_controller_severe_city_alerts_once() {
    let addr = start_backend(false).await;
    let mut controller = controller_for(addr, Coordinates::new(34.05, -118.24).unwrap());

    controller.handle_command(Command::Search("Smogville".to_string()));
    let alerts = controller.settle().await;

    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].aqi, 250);
    assert!(controller.state().nearby.is_empty());
}

#[tokio::test]
async fn test_controller_server_error_is_retryable() {
    let addr = start_backend(false).await;
    let mut controller = controller_for(addr, Coordinates::new(34.05, -118.24).unwrap());

    controller.handle_command(Command::Search("Broken".to_string()));
    controller.settle().await;

    let state = controller.state();
    assert_eq!(state.phase, Phase::Error);
    assert!(state.snapshot.is_none());
    assert!(state.retry.is_some());
    assert_eq!(state.error.as_ref().unwrap().kind, ErrorKind::Server);
}

#[tokio::test]
async fn test_cli_check_city() {
    let addr = start_backend(false).await;
    let base_url = format!("http://{addr}");

    let output = tokio::task::spawn_blocking(move || {
        std::process::Command::new(env!("CARGO_BIN_EXE_airview"))
            .args(["--base-url", &base_url, "check", "--city", "Boston"])
            .env("AIRVIEW_CONFIG", "/nonexistent/airview.toml")
            .env_remove("RUST_LOG")
            .output()
    })
    .await
    .unwrap()
    .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Boston"));
    assert!(stdout.contains("AQI 42 - Good"));
}

#[tokio::test]
async fn test_cli_forecast_prints_accuracy_footer() {
    let addr = start_backend(false).await;
    let base_url = format!("http://{addr}");

    let output = tokio::task::spawn_blocking(move || {
        std::process::Command::new(env!("CARGO_BIN_EXE_airview"))
            .args(["--base-url", &base_url, "forecast", "--lat", "34.05", "--lon", "-118.24"])
            .env("AIRVIEW_CONFIG", "/nonexistent/airview.toml")
            .env_remove("RUST_LOG")
            .output()
    })
    .await
    .unwrap()
    .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Forecast for 34.0500, -118.2400"));
    assert!(stdout.contains("Model RandomForestRegressor: RMSE 12.5 AQI"));
}

#[tokio::test]
async fn test_cli_sources() {
    let addr = start_backend(false).await;
    let base_url = format!("http://{addr}");

    let output = tokio::task::spawn_blocking(move || {
        std::process::Command::new(env!("CARGO_BIN_EXE_airview"))
            .args(["--base-url", &base_url, "sources"])
            .env("AIRVIEW_CONFIG", "/nonexistent/airview.toml")
            .env_remove("RUST_LOG")
            .output()
    })
    .await
    .unwrap()
    .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("NASA TEMPO (satellite, Public Domain)"));
    assert!(stdout.contains("OpenAQ (API, CC BY 4.0)"));
}

#[test]
fn test_cli_help() {
    let output = std::process::Command::new(env!("CARGO_BIN_EXE_airview"))
        .arg("--help")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("check"));
    assert!(stdout.contains("interactive"));
}

#[test]
fn test_cli_check_requires_location() {
    let output = std::process::Command::new(env!("CARGO_BIN_EXE_airview"))
        .args(["check"])
        .env("AIRVIEW_CONFIG", "/nonexistent/airview.toml")
        .output()
        .unwrap();

    assert!(!output.status.success());
}
