//! Forecast and service health models

use super::air_quality::deserialize_timestamp;
use crate::severity::SeverityBucket;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Forecast horizons the backend model is trained for
pub const FORECAST_HOURS: [u32; 2] = [24, 48];

/// Predicted AQI for a location over the next `hours`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Forecast {
    pub lat: f64,
    pub lon: f64,
    pub hours: u32,
    pub prediction: f64,
    /// Lower and upper bound of the prediction
    pub confidence_interval: [f64; 2],
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// The forecast endpoint answers 200 with `{"error": ..}` when no model is loaded
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ForecastResponse {
    Forecast(Forecast),
    Unavailable { error: String },
}

impl Forecast {
    /// Predicted AQI rounded to the nearest non-negative integer
    #[must_use]
    pub fn predicted_aqi(&self) -> u32 {
        // Saturating float-to-int cast
        self.prediction.max(0.0).round() as u32
    }

    #[must_use]
    pub fn bucket(&self) -> SeverityBucket {
        SeverityBucket::classify(self.predicted_aqi())
    }

    /// Whether the returned numbers are usable
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        let [lower, upper] = self.confidence_interval;
        self.prediction.is_finite()
            && lower.is_finite()
            && upper.is_finite()
            && lower <= upper
    }
}

/// Response of the backend health check
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}
