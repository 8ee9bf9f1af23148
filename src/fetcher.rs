//! Request orchestration for one location query

use crate::AirViewError;
use crate::api::AirQualityApi;
use crate::models::{AirQualitySnapshot, LocationQuery, NearbyArea};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Everything one successful query produced
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub snapshot: AirQualitySnapshot,
    pub nearby: Vec<NearbyArea>,
}

/// Issues the primary snapshot request and, for coordinate queries, the
/// dependent nearby areas request
#[derive(Clone)]
pub struct DataFetcher {
    api: Arc<dyn AirQualityApi>,
    nearby_radius_km: u32,
}

impl DataFetcher {
    pub fn new(api: Arc<dyn AirQualityApi>, nearby_radius_km: u32) -> Self {
        Self {
            api,
            nearby_radius_km,
        }
    }

    /// Fetch a snapshot, then nearby areas.
    ///
    /// A failing primary request fails the whole fetch. A failing nearby
    /// request only empties the nearby list. City queries never request
    /// nearby areas.
    #[instrument(skip(self, query), fields(query = %query))]
    pub async fn fetch(&self, query: &LocationQuery) -> Result<FetchOutcome, AirViewError> {
        let snapshot = self.api.snapshot(query).await?;

        let Some(query_coordinates) = query.coordinates() else {
            debug!("City query, skipping nearby areas");
            return Ok(FetchOutcome {
                snapshot,
                nearby: Vec::new(),
            });
        };

        let coordinates = snapshot.coordinates.unwrap_or(query_coordinates);
        let nearby = match self.api.nearby(coordinates, self.nearby_radius_km).await {
            Ok(areas) => {
                debug!("Found {} nearby areas", areas.len());
                areas
            }
            Err(e) => {
                warn!("Nearby areas unavailable, continuing without them: {}", e);
                Vec::new()
            }
        };

        Ok(FetchOutcome { snapshot, nearby })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CityName, Coordinates};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingApi {
        fail_snapshot: bool,
        fail_nearby: bool,
        nearby_calls: Mutex<Vec<(Coordinates, u32)>>,
    }

    #[async_trait]
    impl AirQualityApi for RecordingApi {
        async fn snapshot(
            &self,
            query: &LocationQuery,
        ) -> Result<AirQualitySnapshot, AirViewError> {
            if self.fail_snapshot {
                return Err(AirViewError::server_status(500, "boom"));
            }
            Ok(AirQualitySnapshot {
                city: query.to_string(),
                aqi: 42,
                timestamp: Utc::now(),
                coordinates: None,
                pollutants: None,
                recent: None,
            })
        }

        async fn nearby(
            &self,
            coordinates: Coordinates,
            radius_km: u32,
        ) -> Result<Vec<NearbyArea>, AirViewError> {
            self.nearby_calls.lock().unwrap().push((coordinates, radius_km));
            if self.fail_nearby {
                return Err(AirViewError::timeout("slow"));
            }
            Ok(vec![NearbyArea {
                name: "Harbor".to_string(),
                aqi: Some(30),
                safe: true,
                distance: Some(3.5),
            }])
        }
    }

    fn coordinate_query() -> LocationQuery {
        LocationQuery::detected(Coordinates::new(34.05, -118.24).unwrap())
    }

    #[tokio::test]
    async fn test_coordinate_query_fetches_nearby() {
        let api = Arc::new(RecordingApi::default());
        let fetcher = DataFetcher::new(api.clone(), 25);

        let outcome = fetcher.fetch(&coordinate_query()).await.unwrap();
        assert_eq!(outcome.nearby.len(), 1);

        let calls = api.nearby_calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, 25);
    }

    #[tokio::test]
    async fn test_city_query_skips_nearby() {
        let api = Arc::new(RecordingApi::default());
        let fetcher = DataFetcher::new(api.clone(), 25);
        let query = LocationQuery::City(CityName::parse("Boston").unwrap());

        let outcome = fetcher.fetch(&query).await.unwrap();
        assert!(outcome.nearby.is_empty());
        assert!(api.nearby_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_nearby_failure_degrades_to_empty_list() {
        let api = Arc::new(RecordingApi {
            fail_nearby: true,
            ..Default::default()
        });
        let fetcher = DataFetcher::new(api, 25);

        let outcome = fetcher.fetch(&coordinate_query()).await.unwrap();
        assert_eq!(outcome.snapshot.aqi, 42);
        assert!(outcome.nearby.is_empty());
    }

    #[tokio::test]
    async fn test_primary_failure_skips_nearby() {
        let api = Arc::new(RecordingApi {
            fail_snapshot: true,
            ..Default::default()
        });
        let fetcher = DataFetcher::new(api.clone(), 25);

        let err = fetcher.fetch(&coordinate_query()).await.unwrap_err();
        assert!(matches!(err, AirViewError::Server { status: Some(500), .. }));
        assert!(api.nearby_calls.lock().unwrap().is_empty());
    }
}
