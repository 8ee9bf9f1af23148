//! `AirView` - Air quality lookup client
//!
//! This library resolves a location from a typed city, typed coordinates or
//! the current position, fetches the current air quality snapshot and nearby
//! areas from the backend, classifies the AQI into severity buckets and keeps
//! a race-free view state for interactive front ends.

pub mod api;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod display;
pub mod error;
pub mod fetcher;
pub mod location_resolver;
pub mod logging;
pub mod models;
pub mod severity;
pub mod view;

// Re-export core types for public API
pub use api::{AirQualityApi, AirQualityClient};
pub use config::AirViewConfig;
pub use controller::{Command, ViewController};
pub use error::{AirViewError, ErrorKind};
pub use fetcher::{DataFetcher, FetchOutcome};
pub use location_resolver::{GeolocationProvider, LocationParser, LocationResolver};
pub use models::{
    AirQualitySnapshot, CityName, Coordinates, DataSourceAttribution, Forecast, HealthStatus,
    LocationQuery, ModelAccuracy, NearbyArea,
};
pub use severity::{AlertGate, SevereAlert, SeverityBucket};
pub use view::{Phase, ViewState, ViewStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, AirViewError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
