//! Location Resolution Module
//!
//! Turns user input (typed city names or coordinates) and geolocation
//! results into validated [`LocationQuery`] values. Nothing here touches the
//! air quality backend; invalid input is rejected before any request.

use crate::AirViewError;
use crate::config::GeolocationConfig;
use crate::models::{CityName, Coordinates, LocationQuery};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

/// Why a position could not be obtained
#[derive(Debug, Clone, PartialEq)]
pub enum PositionError {
    PermissionDenied,
    PositionUnavailable(String),
    Timeout,
}

/// Source of the device's current position
#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, PositionError>;
}

/// Position taken from configuration
pub struct ConfiguredPosition {
    enabled: bool,
    position: Option<(f64, f64)>,
}

impl ConfiguredPosition {
    #[must_use]
    pub fn from_config(config: &GeolocationConfig) -> Self {
        Self {
            enabled: config.enabled,
            position: config.latitude.zip(config.longitude),
        }
    }
}

#[async_trait]
impl GeolocationProvider for ConfiguredPosition {
    async fn current_position(&self) -> Result<Coordinates, PositionError> {
        if !self.enabled {
            return Err(PositionError::PermissionDenied);
        }
        let (lat, lon) = self.position.ok_or_else(|| {
            PositionError::PositionUnavailable("no position configured".to_string())
        })?;
        Coordinates::new(lat, lon).map_err(|e| PositionError::PositionUnavailable(e.to_string()))
    }
}

/// Always answers with the same result
pub struct StaticPosition(pub Result<Coordinates, PositionError>);

#[async_trait]
impl GeolocationProvider for StaticPosition {
    async fn current_position(&self) -> Result<Coordinates, PositionError> {
        self.0.clone()
    }
}

/// Service for resolving location inputs
pub struct LocationResolver {
    provider: Box<dyn GeolocationProvider>,
    timeout: Duration,
}

impl LocationResolver {
    pub fn new(provider: Box<dyn GeolocationProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub fn from_config(config: &GeolocationConfig) -> Self {
        Self::new(
            Box::new(ConfiguredPosition::from_config(config)),
            config.timeout(),
        )
    }

    /// Validate a typed city name into a query
    pub fn resolve_city(input: &str) -> Result<LocationQuery, AirViewError> {
        let city = CityName::parse(input)?;
        debug!("Resolved city query: {}", city);
        Ok(LocationQuery::City(city))
    }

    /// Validate typed coordinates into a query
    pub fn resolve_coordinates(lat: f64, lon: f64) -> Result<LocationQuery, AirViewError> {
        Ok(LocationQuery::typed(Coordinates::new(lat, lon)?))
    }

    /// Ask the geolocation provider for the current position.
    ///
    /// The provider call is bounded by the configured timeout; no retry
    /// happens here.
    pub async fn locate(&self) -> Result<LocationQuery, AirViewError> {
        debug!("Requesting current position (timeout {:?})", self.timeout);

        let outcome = tokio::time::timeout(self.timeout, self.provider.current_position()).await;

        let coordinates = match outcome {
            Ok(Ok(coordinates)) => coordinates,
            Ok(Err(e)) => {
                warn!("Geolocation failed: {:?}", e);
                return Err(self.position_error(e));
            }
            Err(_) => {
                warn!("Geolocation timed out after {:?}", self.timeout);
                return Err(self.position_error(PositionError::Timeout));
            }
        };

        debug!(
            "Resolved position: ({:.4}, {:.4})",
            coordinates.latitude, coordinates.longitude
        );
        Ok(LocationQuery::detected(coordinates))
    }

    fn position_error(&self, error: PositionError) -> AirViewError {
        match error {
            PositionError::PermissionDenied => AirViewError::GeolocationDenied,
            PositionError::PositionUnavailable(message) => {
                AirViewError::geolocation_unavailable(message)
            }
            PositionError::Timeout => AirViewError::GeolocationTimeout {
                seconds: self.timeout.as_secs(),
            },
        }
    }
}

/// Free-text location parsing
pub struct LocationParser;

impl LocationParser {
    /// Parse `lat,lon` / `lat lon` pairs as coordinates, anything else as a city name
    pub fn parse(input: &str) -> Result<LocationQuery, AirViewError> {
        let input = input.trim();

        if let Some((lat, lon)) = Self::parse_coordinates(input) {
            return LocationResolver::resolve_coordinates(lat, lon);
        }

        LocationResolver::resolve_city(input)
    }

    fn parse_coordinates(input: &str) -> Option<(f64, f64)> {
        let parts: Vec<&str> = input
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .collect();

        if parts.len() != 2 {
            return None;
        }

        let lat = parts[0].parse::<f64>().ok()?;
        let lon = parts[1].parse::<f64>().ok()?;
        Some((lat, lon))
    }
}
