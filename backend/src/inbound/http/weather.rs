//! Forecast and geocoding proxies.
//!
//! ```text
//! GET /api/weather?latitude=51.5&longitude=-0.12
//! GET /api/city?city=London
//! ```

use actix_web::{get, web};
use serde::Deserialize;
use serde_json::Value;
use tracing::error;

use crate::domain::ports::UpstreamServiceError;
use crate::domain::{CityName, Coordinates, Error, LocationValidationError};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{ValidationCode, field_error};

/// Message for a geocoding lookup with no results.
pub const CITY_NOT_FOUND_MESSAGE: &str = "City not found";

/// Query for `GET /api/weather`.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ForecastQuery {
    /// Latitude in degrees, `[-90, 90]`.
    pub latitude: Option<f64>,
    /// Longitude in degrees, `[-180, 180]`.
    pub longitude: Option<f64>,
}

/// Query for `GET /api/city`.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct CityQuery {
    /// City name to look up.
    pub city: Option<String>,
}

fn map_location_error(err: LocationValidationError) -> Error {
    let field = match err {
        LocationValidationError::Latitude(_) => "latitude",
        LocationValidationError::Longitude(_) => "longitude",
        LocationValidationError::EmptyCity => "city",
    };
    field_error(field, err.to_string(), ValidationCode::InvalidValue)
}

fn upstream(operation: &'static str, err: &UpstreamServiceError) -> Error {
    error!(operation, error = %err, "weather service call failed");
    Error::upstream_failure(format!("Error fetching {operation}"))
}

/// Hourly forecast for a location, passed through from the weather service.
#[utoipa::path(
    get,
    path = "/api/weather",
    params(ForecastQuery),
    responses(
        (status = 200, description = "Forecast payload", body = serde_json::Value),
        (status = 400, description = "Missing or out-of-range coordinates", body = Error),
        (status = 500, description = "Weather service failure", body = Error)
    ),
    tags = ["weather"],
    operation_id = "getForecast",
    security([])
)]
#[get("/api/weather")]
pub async fn forecast(
    state: web::Data<HttpState>,
    query: web::Query<ForecastQuery>,
) -> ApiResult<web::Json<Value>> {
    let latitude = query.latitude.ok_or_else(|| {
        field_error("latitude", "latitude is required", ValidationCode::MissingField)
    })?;
    let longitude = query.longitude.ok_or_else(|| {
        field_error("longitude", "longitude is required", ValidationCode::MissingField)
    })?;
    let at = Coordinates::new(latitude, longitude).map_err(map_location_error)?;
    let payload = state
        .weather
        .forecast(at)
        .await
        .map_err(|err| upstream("weather data", &err))?;
    Ok(web::Json(payload))
}

/// Coordinates of the best match for a city name.
#[utoipa::path(
    get,
    path = "/api/city",
    params(CityQuery),
    responses(
        (status = 200, description = "City coordinates", body = Coordinates),
        (status = 400, description = "Missing city", body = Error),
        (status = 404, description = "City not found", body = Error),
        (status = 500, description = "Geocoding service failure", body = Error)
    ),
    tags = ["weather"],
    operation_id = "geocodeCity",
    security([])
)]
#[get("/api/city")]
pub async fn city(
    state: web::Data<HttpState>,
    query: web::Query<CityQuery>,
) -> ApiResult<web::Json<Coordinates>> {
    let name = CityName::new(query.city.as_deref().unwrap_or_default())
        .map_err(map_location_error)?;
    state
        .weather
        .geocode(&name)
        .await
        .map_err(|err| upstream("city data", &err))?
        .map(web::Json)
        .ok_or_else(|| Error::not_found(CITY_NOT_FOUND_MESSAGE))
}
