//! Shared validation helpers for inbound HTTP adapters.
//!
//! Extractor failures (bad JSON, bad query strings) are turned into the same
//! JSON error body as every other failure instead of actix's plain-text
//! default.

use actix_web::{HttpRequest, error::JsonPayloadError, error::QueryPayloadError, web};
use serde_json::json;

use crate::domain::{Error, GenerationId, GenerationValidationError, Rating};

/// Message for a rating that is not a whole number from 1 to 5.
pub const RATING_RANGE_MESSAGE: &str = "Rating must be between 1 and 5";

/// Validation error codes carried in `details.code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValidationCode {
    MissingField,
    InvalidValue,
    MalformedBody,
}

impl ValidationCode {
    fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::InvalidValue => "invalid_value",
            Self::MalformedBody => "malformed_body",
        }
    }
}

/// `400` naming the offending field.
pub(crate) fn field_error(field: &str, message: impl Into<String>, code: ValidationCode) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field,
        "code": code.as_str(),
    }))
}

/// Parse a path segment into a [`GenerationId`].
pub(crate) fn parse_generation_id(raw: &str) -> Result<GenerationId, Error> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(|value| GenerationId::new(value).ok())
        .ok_or_else(|| {
            field_error(
                "generationId",
                "Generation id must be a positive integer",
                ValidationCode::InvalidValue,
            )
        })
}

/// Parse a path segment into a [`Rating`]. Non-integers and out-of-range
/// values share one message.
pub(crate) fn parse_rating(raw: &str) -> Result<Rating, Error> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| GenerationValidationError::RatingOutOfRange(0))
        .and_then(Rating::new)
        .map_err(|_| field_error("rating", RATING_RANGE_MESSAGE, ValidationCode::InvalidValue))
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let message = match &err {
        JsonPayloadError::ContentType => "Request body must be JSON".to_owned(),
        other => format!("Malformed JSON body: {other}"),
    };
    Error::invalid_request(message)
        .with_details(json!({ "code": ValidationCode::MalformedBody.as_str() }))
        .into()
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    Error::invalid_request(format!("Malformed query string: {err}"))
        .with_details(json!({ "code": ValidationCode::MalformedBody.as_str() }))
        .into()
}

/// JSON extractor configuration producing JSON error bodies.
#[must_use]
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(json_error)
}

/// Query extractor configuration producing JSON error bodies.
#[must_use]
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(query_error)
}
