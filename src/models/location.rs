//! Location model: coordinates, validated city names and the query built from them

use crate::AirViewError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of characters accepted in a typed city name
pub const MAX_CITY_NAME_LEN: usize = 100;

/// Geographic coordinates in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Latitude in decimal degrees
    #[serde(rename = "lat", alias = "latitude")]
    pub latitude: f64,
    /// Longitude in decimal degrees
    #[serde(rename = "lon", alias = "longitude", alias = "lng")]
    pub longitude: f64,
}

impl Coordinates {
    /// Create coordinates, rejecting non-finite or out-of-range values
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, AirViewError> {
        let coordinates = Self {
            latitude,
            longitude,
        };
        coordinates.validate()?;
        Ok(coordinates)
    }

    pub fn validate(&self) -> Result<(), AirViewError> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(AirViewError::invalid_input(format!(
                "Latitude must be between -90 and 90, got: {}",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(AirViewError::invalid_input(format!(
                "Longitude must be between -180 and 180, got: {}",
                self.longitude
            )));
        }
        Ok(())
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// A city name restricted to letters, whitespace, commas and hyphens
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CityName(String);

impl CityName {
    /// Validate and sanitize a typed city name.
    ///
    /// Leading and trailing whitespace is removed and inner whitespace runs
    /// collapse to a single space. The trimmed input must hold between 1 and
    /// [`MAX_CITY_NAME_LEN`] characters, all of them ASCII letters,
    /// whitespace, `,` or `-`.
    pub fn parse(input: &str) -> Result<Self, AirViewError> {
        let trimmed = input.trim();

        if trimmed.is_empty() {
            return Err(AirViewError::invalid_input("City name cannot be empty"));
        }

        let len = trimmed.chars().count();
        if len > MAX_CITY_NAME_LEN {
            return Err(AirViewError::invalid_input(format!(
                "City name cannot exceed {MAX_CITY_NAME_LEN} characters, got {len}"
            )));
        }

        if let Some(bad) = trimmed.chars().find(|c| !Self::is_allowed(*c)) {
            return Err(AirViewError::invalid_input(format!(
                "City name contains invalid character '{bad}'. Only letters, spaces, commas and hyphens are allowed"
            )));
        }

        Ok(Self(trimmed.split_whitespace().collect::<Vec<_>>().join(" ")))
    }

    fn is_allowed(c: char) -> bool {
        c.is_ascii_alphabetic() || c.is_whitespace() || c == ',' || c == '-'
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a coordinate query came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationSource {
    /// Entered by the user
    Typed,
    /// Obtained from a geolocation provider
    Detected,
}

/// A validated location to query; exactly one form is active per request
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    Coordinates {
        coordinates: Coordinates,
        source: LocationSource,
    },
    City(CityName),
}

impl LocationQuery {
    #[must_use]
    pub fn detected(coordinates: Coordinates) -> Self {
        Self::Coordinates {
            coordinates,
            source: LocationSource::Detected,
        }
    }

    #[must_use]
    pub fn typed(coordinates: Coordinates) -> Self {
        Self::Coordinates {
            coordinates,
            source: LocationSource::Typed,
        }
    }

    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        match self {
            Self::Coordinates { coordinates, .. } => Some(*coordinates),
            Self::City(_) => None,
        }
    }

    #[must_use]
    pub fn is_auto_detected(&self) -> bool {
        matches!(
            self,
            Self::Coordinates {
                source: LocationSource::Detected,
                ..
            }
        )
    }
}

impl fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coordinates { coordinates, .. } => {
                f.write_str(&coordinates.format_coordinates())
            }
            Self::City(city) => fmt::Display::fmt(city, f),
        }
    }
}
