//! Open-Meteo adapter for forecasts and geocoding.

mod dto;
mod source;

pub use source::OpenMeteoSource;
