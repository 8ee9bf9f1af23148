//! Data source attribution and forecast model accuracy

use crate::AirViewError;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Kind of upstream source the backend draws from
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Satellite,
    GroundStation,
    SensorNetwork,
    Weather,
    Model,
    Api,
    #[serde(other)]
    Other,
}

impl SourceType {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Satellite => "satellite",
            Self::GroundStation => "ground station",
            Self::SensorNetwork => "sensor network",
            Self::Weather => "weather",
            Self::Model => "model",
            Self::Api => "API",
            Self::Other => "other",
        }
    }
}

/// Attribution metadata for one upstream data source
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DataSourceAttribution {
    pub source_name: String,
    pub source_type: SourceType,
    pub url: String,
    pub citation: String,
    pub license: String,
    #[serde(default)]
    pub description: String,
    /// Parameters or pollutants provided by the source
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default)]
    pub coverage: String,
    /// When the backend last pulled from the source, as reported
    #[serde(default)]
    pub fetched_at: String,
    #[serde(default)]
    pub additional_info: Option<serde_json::Value>,
}

impl DataSourceAttribution {
    /// Citation entry in the backend's plain-text layout
    #[must_use]
    pub fn citation_entry(&self) -> String {
        format!(
            "- {}: {}\n  URL: {}\n  License: {}\n",
            self.source_name, self.citation, self.url, self.license
        )
    }
}

/// Citation text covering `sources`, laid out like the backend's citation endpoint
#[must_use]
pub fn citation_text(sources: &[DataSourceAttribution]) -> String {
    let mut out = String::from("Data Sources:\n");
    for source in sources {
        let _ = write!(out, "\n{}", source.citation_entry());
    }
    out
}

#[derive(Debug, Deserialize)]
pub(crate) struct CitationResponse {
    pub citation_text: String,
}

/// Validation metrics of the forecast model
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ModelAccuracy {
    pub model: String,
    /// Root mean squared error in AQI points
    pub rmse: f64,
    pub r2_score: f64,
}

impl ModelAccuracy {
    pub fn validate(&self) -> Result<(), AirViewError> {
        if !self.rmse.is_finite() || self.rmse < 0.0 {
            return Err(AirViewError::server(format!(
                "Model accuracy has an invalid RMSE: {}",
                self.rmse
            )));
        }
        if !self.r2_score.is_finite() || self.r2_score > 1.0 {
            return Err(AirViewError::server(format!(
                "Model accuracy has an invalid R² score: {}",
                self.r2_score
            )));
        }
        Ok(())
    }
}
