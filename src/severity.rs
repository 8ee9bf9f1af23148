//! AQI severity buckets and the severe air quality alert gate

use serde::{Deserialize, Serialize};
use std::fmt;

/// Named AQI range with associated health guidance.
///
/// Buckets are contiguous and cover every non-negative AQI:
/// `0..=50`, `51..=100`, `101..=150`, `151..=200`, `201..=300`, `301..`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SeverityBucket {
    /// 0-50
    Good,
    /// 51-100
    Moderate,
    /// 101-150
    UnhealthyForSensitive,
    /// 151-200
    Unhealthy,
    /// 201-300
    VeryUnhealthy,
    /// >300
    Hazardous,
}

impl SeverityBucket {
    pub const ALL: [SeverityBucket; 6] = [
        Self::Good,
        Self::Moderate,
        Self::UnhealthyForSensitive,
        Self::Unhealthy,
        Self::VeryUnhealthy,
        Self::Hazardous,
    ];

    /// Classify an AQI value
    #[must_use]
    pub fn classify(aqi: u32) -> Self {
        match aqi {
            0..=50 => Self::Good,
            51..=100 => Self::Moderate,
            101..=150 => Self::UnhealthyForSensitive,
            151..=200 => Self::Unhealthy,
            201..=300 => Self::VeryUnhealthy,
            _ => Self::Hazardous,
        }
    }

    /// Inclusive upper bound, `None` for the open-ended top bucket
    #[must_use]
    pub fn upper_bound(self) -> Option<u32> {
        match self {
            Self::Good => Some(50),
            Self::Moderate => Some(100),
            Self::UnhealthyForSensitive => Some(150),
            Self::Unhealthy => Some(200),
            Self::VeryUnhealthy => Some(300),
            Self::Hazardous => None,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Moderate => "Moderate",
            Self::UnhealthyForSensitive => "Unhealthy for Sensitive Groups",
            Self::Unhealthy => "Unhealthy",
            Self::VeryUnhealthy => "Very Unhealthy",
            Self::Hazardous => "Hazardous",
        }
    }

    /// Conventional AQI display colour as `#rrggbb`
    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            Self::Good => "#00e400",
            Self::Moderate => "#ffff00",
            Self::UnhealthyForSensitive => "#ff7e00",
            Self::Unhealthy => "#ff0000",
            Self::VeryUnhealthy => "#8f3f97",
            Self::Hazardous => "#7e0023",
        }
    }

    #[must_use]
    pub fn guidance(self) -> &'static str {
        match self {
            Self::Good => "Air quality is satisfactory, and air pollution poses little or no risk.",
            Self::Moderate => {
                "Air quality is acceptable. Unusually sensitive people should consider limiting prolonged outdoor exertion."
            }
            Self::UnhealthyForSensitive => {
                "Members of sensitive groups may experience health effects. The general public is less likely to be affected."
            }
            Self::Unhealthy => {
                "Some members of the general public may experience health effects; sensitive groups may experience more serious effects."
            }
            Self::VeryUnhealthy => "Health alert: the risk of health effects is increased for everyone.",
            Self::Hazardous => "Health warning of emergency conditions: everyone is more likely to be affected.",
        }
    }
}

impl fmt::Display for SeverityBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A severe air quality notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SevereAlert {
    pub city: String,
    pub aqi: u32,
    pub bucket: SeverityBucket,
}

impl SevereAlert {
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "Air quality alert for {}: AQI {} ({}). {}",
            self.city,
            self.aqi,
            self.bucket.label(),
            self.bucket.guidance()
        )
    }
}

/// Decides when a severe alert is raised.
///
/// An alert is raised for a fetch whose AQI is strictly above the threshold,
/// at most once per fetch sequence number. Evaluating the same fetch again
/// (e.g. when the view re-renders) never raises it twice.
#[derive(Debug, Clone)]
pub struct AlertGate {
    threshold: u32,
    last_alerted: Option<u64>,
}

impl AlertGate {
    #[must_use]
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            last_alerted: None,
        }
    }

    #[must_use]
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    #[must_use]
    pub fn is_severe(&self, aqi: u32) -> bool {
        aqi > self.threshold
    }

    /// Evaluate the result of fetch `seq`
    pub fn evaluate(&mut self, seq: u64, city: &str, aqi: u32) -> Option<SevereAlert> {
        if !self.is_severe(aqi) || self.last_alerted == Some(seq) {
            return None;
        }
        self.last_alerted = Some(seq);
        tracing::info!(seq, aqi, threshold = self.threshold, "Severe air quality alert raised");
        Some(SevereAlert {
            city: city.to_string(),
            aqi,
            bucket: SeverityBucket::classify(aqi),
        })
    }
}

impl Default for AlertGate {
    fn default() -> Self {
        Self::new(200)
    }
}
