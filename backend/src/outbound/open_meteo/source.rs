//! Reqwest-backed [`WeatherSource`] for the Open-Meteo forecast and
//! geocoding APIs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;

use super::dto::GeocodingResponseDto;
use crate::domain::ports::{UpstreamServiceError, WeatherSource};
use crate::domain::{CityName, Coordinates};
use crate::outbound::http_support::{build_client, decode, map_transport_error, read_success};

const HOURLY_VARIABLES: &str = "temperature_2m,weather_code";

/// Open-Meteo adapter.
pub struct OpenMeteoSource {
    client: Client,
    forecast_url: Url,
    geocoding_url: Url,
}

impl OpenMeteoSource {
    /// Build an adapter against the given endpoints.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        forecast_url: Url,
        geocoding_url: Url,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(timeout)?,
            forecast_url,
            geocoding_url,
        })
    }

    async fn get(&self, url: Url) -> Result<Vec<u8>, UpstreamServiceError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_transport_error)?;
        read_success(response).await
    }
}

fn forecast_request_url(base: &Url, at: Coordinates) -> Url {
    let mut url = base.clone();
    url.query_pairs_mut()
        .append_pair("latitude", &at.latitude().to_string())
        .append_pair("longitude", &at.longitude().to_string())
        .append_pair("hourly", HOURLY_VARIABLES);
    url
}

fn geocoding_request_url(base: &Url, city: &CityName) -> Url {
    let mut url = base.clone();
    url.query_pairs_mut()
        .append_pair("name", city.as_str())
        .append_pair("count", "1")
        .append_pair("language", "en")
        .append_pair("format", "json");
    url
}

fn parse_geocoding(body: &[u8]) -> Result<Option<Coordinates>, UpstreamServiceError> {
    let decoded: GeocodingResponseDto = decode(body, "geocoding")?;
    decoded
        .results
        .into_iter()
        .next()
        .map(|first| {
            Coordinates::new(first.latitude, first.longitude)
                .map_err(|err| UpstreamServiceError::decode(err.to_string()))
        })
        .transpose()
}

#[async_trait]
impl WeatherSource for OpenMeteoSource {
    async fn forecast(&self, at: Coordinates) -> Result<Value, UpstreamServiceError> {
        let body = self.get(forecast_request_url(&self.forecast_url, at)).await?;
        decode(&body, "forecast")
    }

    async fn geocode(&self, city: &CityName) -> Result<Option<Coordinates>, UpstreamServiceError> {
        let body = self
            .get(geocoding_request_url(&self.geocoding_url, city))
            .await?;
        parse_geocoding(&body)
    }
}
