//! Location values used by the forecast and geocoding lookups.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Validation errors for location inputs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocationValidationError {
    /// Latitude outside `[-90, 90]` or not finite.
    #[error("latitude must be within [-90, 90], got {0}")]
    Latitude(f64),
    /// Longitude outside `[-180, 180]` or not finite.
    #[error("longitude must be within [-180, 180], got {0}")]
    Longitude(f64),
    /// City name missing or blank.
    #[error("city must not be empty")]
    EmptyCity,
}

/// WGS84 coordinates.
///
/// # Examples
/// ```
/// use weatherwear::domain::Coordinates;
///
/// assert!(Coordinates::new(51.5, -0.12).is_ok());
/// assert!(Coordinates::new(91.0, 0.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Validate and construct coordinates.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, LocationValidationError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(LocationValidationError::Latitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(LocationValidationError::Longitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in degrees.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Non-blank city name for geocoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityName(String);

impl CityName {
    /// Trim and validate a city name.
    pub fn new(raw: &str) -> Result<Self, LocationValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(LocationValidationError::EmptyCity);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the name.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}
