//! Air quality snapshot and nearby area models returned by the backend

use super::Coordinates;
use crate::AirViewError;
use crate::severity::SeverityBucket;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// One fetched air quality result for a location at a point in time
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AirQualitySnapshot {
    /// Display name of the resolved city
    pub city: String,
    /// Air Quality Index
    pub aqi: u32,
    /// When the backend computed this reading
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Resolved coordinates, when the backend knows them
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    /// Pollutant key (`pm25`, `no2`, ...) to concentration
    #[serde(default)]
    pub pollutants: Option<BTreeMap<String, f64>>,
    /// Recent AQI readings, oldest first
    #[serde(default)]
    pub recent: Option<Vec<u32>>,
}

/// An area near the queried coordinates
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NearbyArea {
    pub name: String,
    #[serde(default)]
    pub aqi: Option<u32>,
    pub safe: bool,
    /// Distance from the query point in kilometers
    #[serde(default)]
    pub distance: Option<f64>,
}

/// Pollutants known to the backend's data model
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Pollutant {
    Pm25,
    Pm10,
    No2,
    O3,
    Co,
    So2,
}

impl Pollutant {
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().replace(['.', '_'], "").as_str() {
            "pm25" => Some(Self::Pm25),
            "pm10" => Some(Self::Pm10),
            "no2" => Some(Self::No2),
            "o3" => Some(Self::O3),
            "co" => Some(Self::Co),
            "so2" => Some(Self::So2),
            _ => None,
        }
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Pm25 => "PM2.5",
            Self::Pm10 => "PM10",
            Self::No2 => "NO₂",
            Self::O3 => "O₃",
            Self::Co => "CO",
            Self::So2 => "SO₂",
        }
    }

    #[must_use]
    pub fn unit(self) -> &'static str {
        match self {
            Self::Pm25 | Self::Pm10 => "µg/m³",
            Self::Co => "ppm",
            Self::No2 | Self::O3 | Self::So2 => "ppb",
        }
    }
}

/// A pollutant concentration ready for display
#[derive(Debug, Clone, PartialEq)]
pub struct PollutantReading {
    pub key: String,
    pub pollutant: Option<Pollutant>,
    pub concentration: f64,
}

impl PollutantReading {
    #[must_use]
    pub fn label(&self) -> String {
        match self.pollutant {
            Some(p) => format!("{} {:.1} {}", p.display_name(), self.concentration, p.unit()),
            None => format!("{} {:.1}", self.key, self.concentration),
        }
    }
}

/// Direction of the recent AQI readings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Rising,
    Falling,
    Steady,
}

impl AirQualitySnapshot {
    #[must_use]
    pub fn bucket(&self) -> SeverityBucket {
        SeverityBucket::classify(self.aqi)
    }

    /// Check the fields serde cannot express on its own
    pub fn validate(&self) -> Result<(), AirViewError> {
        if self.city.trim().is_empty() {
            return Err(AirViewError::server("Snapshot is missing a city name"));
        }
        if let Some(coordinates) = &self.coordinates {
            coordinates
                .validate()
                .map_err(|e| AirViewError::server(format!("Snapshot coordinates: {e}")))?;
        }
        if let Some(pollutants) = &self.pollutants {
            if let Some((key, value)) = pollutants
                .iter()
                .find(|(_, v)| !v.is_finite() || **v < 0.0)
            {
                return Err(AirViewError::server(format!(
                    "Pollutant '{key}' has invalid concentration {value}"
                )));
            }
        }
        Ok(())
    }

    /// Pollutants with known ones first, in a stable order
    #[must_use]
    pub fn pollutant_readings(&self) -> Vec<PollutantReading> {
        let mut readings: Vec<PollutantReading> = self
            .pollutants
            .iter()
            .flatten()
            .map(|(key, value)| PollutantReading {
                key: key.clone(),
                pollutant: Pollutant::from_key(key),
                concentration: *value,
            })
            .collect();
        readings.sort_by(|a, b| match (a.pollutant, b.pollutant) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.key.cmp(&b.key),
        });
        readings
    }

    /// Compare the newest recent reading with the oldest one
    #[must_use]
    pub fn trend(&self) -> Option<Trend> {
        let recent = self.recent.as_ref()?;
        let (first, last) = (recent.first()?, recent.last()?);
        if recent.len() < 2 {
            return None;
        }
        // Swings under 5 AQI points are noise
        Some(match i64::from(*last) - i64::from(*first) {
            d if d >= 5 => Trend::Rising,
            d if d <= -5 => Trend::Falling,
            _ => Trend::Steady,
        })
    }
}

impl NearbyArea {
    pub fn validate(&self) -> Result<(), AirViewError> {
        if self.name.trim().is_empty() {
            return Err(AirViewError::server("Nearby area is missing a name"));
        }
        if let Some(distance) = self.distance {
            if !distance.is_finite() || distance < 0.0 {
                return Err(AirViewError::server(format!(
                    "Nearby area '{}' has invalid distance {distance}",
                    self.name
                )));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn bucket(&self) -> Option<SeverityBucket> {
        self.aqi.map(SeverityBucket::classify)
    }
}

/// Accept RFC 3339 as well as offset-less ISO timestamps, which are taken as UTC
pub(crate) fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("invalid timestamp '{raw}'"))
    })
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.and_utc())
}
