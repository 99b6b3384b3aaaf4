//! Driven port for forecast and geocoding lookups.
//!
//! Forecast payloads are passed through untouched, so the port deals in raw
//! JSON rather than a typed forecast.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::domain::{CityName, Coordinates};

use super::UpstreamServiceError;

/// Port for weather data.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Hourly forecast for a location, as returned by the provider.
    async fn forecast(&self, at: Coordinates) -> Result<Value, UpstreamServiceError>;

    /// Coordinates of the best match for a city name, if any.
    async fn geocode(&self, city: &CityName) -> Result<Option<Coordinates>, UpstreamServiceError>;
}

/// Fixture implementation with a flat forecast and a single known city.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureWeatherSource;

impl FixtureWeatherSource {
    /// The only city the fixture can geocode.
    pub const CITY: &'static str = "London";
}

#[async_trait]
impl WeatherSource for FixtureWeatherSource {
    async fn forecast(&self, at: Coordinates) -> Result<Value, UpstreamServiceError> {
        Ok(json!({
            "latitude": at.latitude(),
            "longitude": at.longitude(),
            "hourly": {
                "time": ["2024-05-01T00:00", "2024-05-01T01:00"],
                "temperature_2m": [14.2, 13.8],
                "weather_code": [3, 3],
            },
        }))
    }

    async fn geocode(&self, city: &CityName) -> Result<Option<Coordinates>, UpstreamServiceError> {
        if !city.as_str().eq_ignore_ascii_case(Self::CITY) {
            return Ok(None);
        }
        Coordinates::new(51.5085, -0.1257)
            .map(Some)
            .map_err(|err| UpstreamServiceError::decode(err.to_string()))
    }
}
