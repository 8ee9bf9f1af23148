//! HTTP client for the air quality backend
//!
//! Wraps the backend's REST contract:
//!
//! - `GET /api/airquality?lat=..&lon=..` or `?city=..`
//! - `GET /api/nearby?lat=..&lon=..&radius=..`
//! - `GET /api/v1/forecast/location?lat=..&lon=..&hours=..`
//! - `GET /api/v1/forecast/accuracy`
//! - `GET /api/v1/attribution` and `GET /api/v1/attribution/citation`
//! - `GET /health`
//!
//! Every request is sent exactly once with a client-side timeout. Failures
//! are classified as [`AirViewError::Timeout`], [`AirViewError::Network`] or
//! [`AirViewError::Server`] (non-2xx status or a body that does not match
//! the expected shape).

use crate::AirViewError;
use crate::config::ApiConfig;
use crate::models::attribution::CitationResponse;
use crate::models::forecast::ForecastResponse;
use crate::models::{
    AirQualitySnapshot, Coordinates, DataSourceAttribution, FORECAST_HOURS, Forecast,
    HealthStatus, LocationQuery, ModelAccuracy, NearbyArea, citation_text,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

const SLOW_RESPONSE: Duration = Duration::from_secs(5);

/// The backend calls the view depends on
#[async_trait]
pub trait AirQualityApi: Send + Sync {
    /// Fetch the primary snapshot for a location
    async fn snapshot(&self, query: &LocationQuery) -> Result<AirQualitySnapshot, AirViewError>;

    /// Fetch areas around `coordinates`
    async fn nearby(
        &self,
        coordinates: Coordinates,
        radius_km: u32,
    ) -> Result<Vec<NearbyArea>, AirViewError>;
}

/// `reqwest`-backed client for the air quality backend
#[derive(Clone)]
pub struct AirQualityClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl AirQualityClient {
    /// Create a new client from the API configuration
    pub fn new(config: &ApiConfig) -> Result<Self, AirViewError> {
        let timeout = config.timeout();

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("AirView/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AirViewError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn snapshot_url(&self, query: &LocationQuery) -> String {
        match query {
            LocationQuery::Coordinates { coordinates, .. } => format!(
                "{}/api/airquality?lat={}&lon={}",
                self.base_url, coordinates.latitude, coordinates.longitude
            ),
            LocationQuery::City(city) => format!(
                "{}/api/airquality?city={}",
                self.base_url,
                urlencoding::encode(city.as_str())
            ),
        }
    }

    pub(crate) fn nearby_url(&self, coordinates: Coordinates, radius_km: u32) -> String {
        format!(
            "{}/api/nearby?lat={}&lon={}&radius={}",
            self.base_url, coordinates.latitude, coordinates.longitude, radius_km
        )
    }

    /// Fetch the AQI forecast for the next 24 or 48 hours
    #[instrument(skip(self), fields(lat = coordinates.latitude, lon = coordinates.longitude))]
    pub async fn forecast(
        &self,
        coordinates: Coordinates,
        hours: u32,
    ) -> Result<Forecast, AirViewError> {
        if !FORECAST_HOURS.contains(&hours) {
            return Err(AirViewError::invalid_input(format!(
                "Forecast horizon must be 24 or 48 hours, got {hours}"
            )));
        }

        let url = format!(
            "{}/api/v1/forecast/location?lat={}&lon={}&hours={}",
            self.base_url, coordinates.latitude, coordinates.longitude, hours
        );

        match self.get_json::<ForecastResponse>(&url, "forecast").await? {
            ForecastResponse::Forecast(forecast) if forecast.is_well_formed() => Ok(forecast),
            ForecastResponse::Forecast(_) => Err(AirViewError::server(
                "Forecast response contains an invalid prediction or confidence interval",
            )),
            ForecastResponse::Unavailable { error } => {
                warn!("Forecast unavailable: {}", error);
                Err(AirViewError::server(format!("Forecast unavailable: {error}")))
            }
        }
    }

    /// Validation metrics of the forecast model
    pub async fn accuracy(&self) -> Result<ModelAccuracy, AirViewError> {
        let url = format!("{}/api/v1/forecast/accuracy", self.base_url);
        let accuracy: ModelAccuracy = self.get_json(&url, "model accuracy").await?;
        accuracy.validate()?;
        Ok(accuracy)
    }

    /// Attribution metadata for every upstream data source
    pub async fn attributions(&self) -> Result<Vec<DataSourceAttribution>, AirViewError> {
        let url = format!("{}/api/v1/attribution", self.base_url);
        self.get_json(&url, "attribution").await
    }

    /// Plain-text citation for all data sources.
    ///
    /// Backends that route `citation` as a source name answer 404; the text
    /// is then built locally from the attribution list.
    pub async fn citation(&self) -> Result<String, AirViewError> {
        let url = format!("{}/api/v1/attribution/citation", self.base_url);
        match self.get_json::<CitationResponse>(&url, "citation").await {
            Ok(response) => Ok(response.citation_text),
            Err(AirViewError::Server {
                status: Some(404), ..
            }) => {
                debug!("Citation endpoint missing, formatting from attributions");
                Ok(citation_text(&self.attributions().await?))
            }
            Err(e) => Err(e),
        }
    }

    /// Query the backend health endpoint
    pub async fn health(&self) -> Result<HealthStatus, AirViewError> {
        let url = format!("{}/health", self.base_url);
        self.get_json(&url, "health").await
    }

    /// Send a single GET request and decode the JSON body
    #[instrument(skip(self, url), fields(url = %url))]
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        what: &str,
    ) -> Result<T, AirViewError> {
        let start_time = Instant::now();
        debug!("Requesting {} data", what);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e, what))?;

        let status = response.status();
        if !status.is_success() {
            warn!("{} request failed with HTTP {}", what, status);
            return Err(AirViewError::server_status(
                status.as_u16(),
                format!(
                    "{what} request failed with status: {} - {}",
                    status,
                    status.canonical_reason().unwrap_or("Unknown error")
                ),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e, what))?;

        let parsed = serde_json::from_slice::<T>(&body).map_err(|e| {
            warn!("Failed to parse {} response: {}", what, e);
            AirViewError::server(format!("Malformed {what} response: {e}"))
        })?;

        let elapsed = start_time.elapsed();
        info!("Received {} data in {:.3}s", what, elapsed.as_secs_f64());
        if elapsed > SLOW_RESPONSE {
            warn!("Slow {} response: {:.3}s", what, elapsed.as_secs_f64());
        }

        Ok(parsed)
    }

    fn transport_error(&self, error: reqwest::Error, what: &str) -> AirViewError {
        if error.is_timeout() {
            warn!("{} request timed out after {:?}", what, self.timeout);
            AirViewError::timeout(format!(
                "{what} request exceeded {}s",
                self.timeout.as_secs()
            ))
        } else {
            warn!("{} request failed: {}", what, error);
            AirViewError::network(format!("{what} request failed: {error}"))
        }
    }
}

#[async_trait]
impl AirQualityApi for AirQualityClient {
    #[instrument(skip(self, query), fields(query = %query))]
    async fn snapshot(&self, query: &LocationQuery) -> Result<AirQualitySnapshot, AirViewError> {
        let url = self.snapshot_url(query);
        let snapshot: AirQualitySnapshot = self.get_json(&url, "air quality").await?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    #[instrument(skip(self))]
    async fn nearby(
        &self,
        coordinates: Coordinates,
        radius_km: u32,
    ) -> Result<Vec<NearbyArea>, AirViewError> {
        let url = self.nearby_url(coordinates, radius_km);
        let areas: Vec<NearbyArea> = self.get_json(&url, "nearby areas").await?;
        for area in &areas {
            area.validate()?;
        }
        Ok(areas)
    }
}
