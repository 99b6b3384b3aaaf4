//! Transport helpers shared by the reqwest adapters.
//!
//! Adapters send, read the status, then read the body; non-success statuses
//! become [`UpstreamServiceError::Status`] with a short body preview, and
//! bodies are decoded with `serde_json` into private DTOs.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::domain::ports::UpstreamServiceError;

const USER_AGENT: &str = concat!("weatherwear/", env!("CARGO_PKG_VERSION"));

/// Client with the shared user agent and an explicit request timeout.
///
/// # Errors
///
/// Returns an error when the TLS backend cannot be initialised.
pub(crate) fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}

/// Join `path` onto `base`, keeping any path segments `base` already has.
pub(crate) fn endpoint(base: &Url, path: &str) -> Result<Url, UpstreamServiceError> {
    let joined = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&joined).map_err(|err| {
        UpstreamServiceError::configuration(format!("invalid endpoint {joined}: {err}"))
    })
}

/// Read a response body, failing on non-success statuses.
pub(crate) async fn read_success(response: Response) -> Result<Vec<u8>, UpstreamServiceError> {
    let status = response.status();
    let body = response.bytes().await.map_err(map_transport_error)?;
    if !status.is_success() {
        return Err(map_status_error(status, body.as_ref()));
    }
    Ok(body.to_vec())
}

/// Decode a JSON body into `T`, naming `what` in the error.
pub(crate) fn decode<T: DeserializeOwned>(
    body: &[u8],
    what: &str,
) -> Result<T, UpstreamServiceError> {
    serde_json::from_slice(body)
        .map_err(|err| UpstreamServiceError::decode(format!("invalid {what} payload: {err}")))
}

pub(crate) fn map_transport_error(error: reqwest::Error) -> UpstreamServiceError {
    if error.is_timeout() {
        UpstreamServiceError::timeout(error.to_string())
    } else {
        UpstreamServiceError::transport(error.to_string())
    }
}

pub(crate) fn map_status_error(status: StatusCode, body: &[u8]) -> UpstreamServiceError {
    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            UpstreamServiceError::timeout(format!("status {}", status.as_u16()))
        }
        _ => UpstreamServiceError::status(status.as_u16(), body_preview(body)),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
