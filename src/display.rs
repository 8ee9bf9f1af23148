//! Plain-text rendering of the view state for the terminal

use crate::models::{
    AirQualitySnapshot, DataSourceAttribution, Forecast, ModelAccuracy, NearbyArea, Trend,
};
use crate::severity::SevereAlert;
use crate::view::{Phase, ViewState};
use std::fmt::Write;

const SPARK: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Render the whole view
#[must_use]
pub fn render_state(state: &ViewState) -> String {
    let mut out = String::new();

    match state.phase {
        Phase::Idle => {}
        Phase::Loading => {
            let target = state
                .pending_query
                .as_ref()
                .map_or_else(|| "your location".to_string(), ToString::to_string);
            let _ = writeln!(out, "Loading air quality for {target}...");
        }
        Phase::Success => {
            if let Some(snapshot) = &state.snapshot {
                out.push_str(&format_snapshot(snapshot));
            }
            if !state.nearby.is_empty() {
                out.push_str(&format_nearby(&state.nearby));
            }
        }
        Phase::Error => {}
    }

    if let Some(error) = &state.error {
        let _ = writeln!(out, "Error: {}", error.message);
        if state.retry.is_some() {
            let _ = writeln!(out, "  (retry available)");
        }
    }
    if let Some(notice) = &state.notice {
        let _ = writeln!(out, "{notice}");
    }

    out
}

/// Headline, pollutants and trend of a snapshot
#[must_use]
pub fn format_snapshot(snapshot: &AirQualitySnapshot) -> String {
    let bucket = snapshot.bucket();
    let mut out = String::new();

    let _ = writeln!(out, "{}", snapshot.city);
    let _ = writeln!(out, "  AQI {} - {} ({})", snapshot.aqi, bucket.label(), bucket.color());
    let _ = writeln!(out, "  {}", bucket.guidance());
    let _ = writeln!(
        out,
        "  Updated {}",
        snapshot.timestamp.format("%Y-%m-%d %H:%M UTC")
    );
    if let Some(coordinates) = &snapshot.coordinates {
        let _ = writeln!(out, "  Location {}", coordinates.format_coordinates());
    }

    let readings = snapshot.pollutant_readings();
    if !readings.is_empty() {
        let _ = writeln!(out, "  Pollutants:");
        for reading in readings {
            let _ = writeln!(out, "    {}", reading.label());
        }
    }

    if let Some(recent) = snapshot.recent.as_deref().filter(|r| !r.is_empty()) {
        let direction = match snapshot.trend() {
            Some(Trend::Rising) => " rising",
            Some(Trend::Falling) => " falling",
            Some(Trend::Steady) => " steady",
            None => "",
        };
        let _ = writeln!(out, "  Trend {}{}", sparkline(recent), direction);
    }

    out
}

#[must_use]
pub fn format_nearby(areas: &[NearbyArea]) -> String {
    let mut out = String::from("  Nearby:\n");
    for area in areas {
        let aqi = area
            .aqi
            .map_or_else(|| "AQI n/a".to_string(), |aqi| format!("AQI {aqi}"));
        let distance = area
            .distance
            .map(|d| format!(", {d:.1} km"))
            .unwrap_or_default();
        let safety = if area.safe { "safe" } else { "unsafe" };
        let _ = writeln!(out, "    {} ({aqi}{distance}) {safety}", area.name);
    }
    out
}

#[must_use]
pub fn format_alert(alert: &SevereAlert) -> String {
    format!("!! {}", alert.message())
}

#[must_use]
pub fn format_forecast(forecast: &Forecast) -> String {
    let bucket = forecast.bucket();
    let [lower, upper] = forecast.confidence_interval;
    format!(
        "Forecast for {:.4}, {:.4} (next {}h)\n  AQI {} - {} (range {:.0}-{:.0})\n  {}\n",
        forecast.lat,
        forecast.lon,
        forecast.hours,
        forecast.predicted_aqi(),
        bucket.label(),
        lower,
        upper,
        bucket.guidance()
    )
}

/// Footer line under a forecast
#[must_use]
pub fn format_accuracy(accuracy: &ModelAccuracy) -> String {
    format!(
        "  Model {}: RMSE {:.1} AQI, R² {:.2}\n",
        accuracy.model, accuracy.rmse, accuracy.r2_score
    )
}

#[must_use]
pub fn format_attributions(sources: &[DataSourceAttribution]) -> String {
    if sources.is_empty() {
        return "No data sources reported.\n".to_string();
    }
    let mut out = String::from("Data sources:\n");
    for source in sources {
        let _ = writeln!(
            out,
            "  {} ({}, {})",
            source.source_name,
            source.source_type.label(),
            source.license
        );
        if !source.parameters.is_empty() {
            let _ = writeln!(out, "    Parameters: {}", source.parameters.join(", "));
        }
        if !source.coverage.is_empty() {
            let _ = writeln!(out, "    Coverage: {}", source.coverage);
        }
        let _ = writeln!(out, "    {}", source.url);
    }
    out
}

/// Scale readings onto block characters relative to their own range
#[must_use]
pub fn sparkline(values: &[u32]) -> String {
    let (Some(min), Some(max)) = (values.iter().min(), values.iter().max()) else {
        return String::new();
    };
    let span = (max - min).max(1);
    values
        .iter()
        .map(|v| {
            let index = ((v - min) as usize * (SPARK.len() - 1)) / span as usize;
            SPARK[index]
        })
        .collect()
}
