//! Wire types for the Open-Meteo geocoding API.

use serde::Deserialize;

/// Search response; `results` is omitted entirely when nothing matches.
#[derive(Debug, Deserialize)]
pub(super) struct GeocodingResponseDto {
    #[serde(default)]
    pub results: Vec<GeocodingResultDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct GeocodingResultDto {
    pub latitude: f64,
    pub longitude: f64,
}
