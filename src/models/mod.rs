//! Data models for `AirView`
//!
//! - Location: coordinates, validated city names and location queries
//! - Air quality: snapshots, pollutants and nearby areas
//! - Forecast: predicted AQI and backend health
//! - Attribution: upstream data sources and forecast model accuracy

pub mod air_quality;
pub mod attribution;
pub mod forecast;
pub mod location;

pub use air_quality::{AirQualitySnapshot, NearbyArea, Pollutant, PollutantReading, Trend};
pub use attribution::{DataSourceAttribution, ModelAccuracy, SourceType, citation_text};
pub use forecast::{FORECAST_HOURS, Forecast, HealthStatus};
pub use location::{CityName, Coordinates, LocationQuery, LocationSource, MAX_CITY_NAME_LEN};
