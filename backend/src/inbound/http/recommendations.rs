//! Outfit recommendation endpoints.
//!
//! ```text
//! POST /api/chatgpt {"weatherData":{...},"userPreferences":{...},"date":"2024-05-01"}
//! POST /api/chatgpt/regenerate {"id":42}
//! ```

use actix_web::{post, web};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::domain::ports::{Outfit, RecommendationRequest};
use crate::domain::{Error, GenerationId, GenerationRecord, Preferences, Recommendation};
use crate::inbound::http::ApiResult;
use crate::inbound::http::guards::MaybeUser;
use crate::inbound::http::preferences::INVALID_PREFERENCES_MESSAGE;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{ValidationCode, field_error};

/// Request body for `POST /api/chatgpt`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationBody {
    /// Forecast payload as returned by `/api/weather`.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub weather_data: Option<Value>,
    /// Preferences for this request; merged over stored ones.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub user_preferences: Option<Value>,
    /// Target date, usually `YYYY-MM-DD`.
    #[serde(default)]
    #[schema(value_type = String)]
    pub date: Option<Value>,
}

impl RecommendationBody {
    fn into_request(self) -> Result<RecommendationRequest, Error> {
        let weather_data = match self.weather_data {
            Some(value @ Value::Object(_)) => value,
            Some(_) => {
                return Err(field_error(
                    "weatherData",
                    "weatherData must be an object",
                    ValidationCode::InvalidValue,
                ));
            }
            None => {
                return Err(field_error(
                    "weatherData",
                    "weatherData is required",
                    ValidationCode::MissingField,
                ));
            }
        };
        let preferences = match self.user_preferences {
            None | Some(Value::Null) => Preferences::new(),
            Some(value) => Preferences::try_from(value).map_err(|_| {
                field_error(
                    "userPreferences",
                    INVALID_PREFERENCES_MESSAGE,
                    ValidationCode::InvalidValue,
                )
            })?,
        };
        Ok(RecommendationRequest {
            weather_data,
            preferences,
            date: self.date.unwrap_or(Value::Null),
        })
    }
}

/// A recommendation and its illustration.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    pub clothing_recommendation: Recommendation,
    pub image_url: String,
}

impl From<Outfit> for RecommendationResponse {
    fn from(outfit: Outfit) -> Self {
        Self {
            clothing_recommendation: outfit.recommendation,
            image_url: outfit.image_url,
        }
    }
}

/// Request body for `POST /api/chatgpt/regenerate`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RegenerateBody {
    /// History record to regenerate.
    #[serde(default)]
    pub id: Option<i64>,
}

/// A regenerated record with its fresh recommendation.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegenerationResponse {
    pub generation: GenerationRecord,
    pub clothing_recommendation: Recommendation,
    pub image_url: String,
}

/// Produce an outfit recommendation for a forecast.
///
/// Signed-in callers have their stored preferences merged in and the result
/// recorded in their history.
#[utoipa::path(
    post,
    path = "/api/chatgpt",
    request_body = RecommendationBody,
    responses(
        (status = 200, description = "Recommendation", body = RecommendationResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 500, description = "Upstream or internal failure", body = Error)
    ),
    tags = ["recommendations"],
    operation_id = "recommendOutfit"
)]
#[post("/api/chatgpt")]
pub async fn recommend(
    state: web::Data<HttpState>,
    caller: MaybeUser,
    payload: web::Json<RecommendationBody>,
) -> ApiResult<web::Json<RecommendationResponse>> {
    let request = payload.into_inner().into_request()?;
    let caller = caller.0.map(|user| user.id);
    let outfit = state.recommendations.generate(&request, caller).await?;
    Ok(web::Json(outfit.into()))
}

/// Re-run a stored recommendation against today's forecast.
#[utoipa::path(
    post,
    path = "/api/chatgpt/regenerate",
    request_body = RegenerateBody,
    responses(
        (status = 200, description = "Regenerated record", body = RegenerationResponse),
        (status = 400, description = "Invalid id or unusable stored prompt", body = Error),
        (status = 404, description = "Unknown record", body = Error),
        (status = 500, description = "Upstream or internal failure", body = Error)
    ),
    tags = ["recommendations"],
    operation_id = "regenerateOutfit"
)]
#[post("/api/chatgpt/regenerate")]
pub async fn regenerate(
    state: web::Data<HttpState>,
    caller: MaybeUser,
    payload: web::Json<RegenerateBody>,
) -> ApiResult<web::Json<RegenerationResponse>> {
    let raw = payload
        .id
        .ok_or_else(|| field_error("id", "id is required", ValidationCode::MissingField))?;
    let id = GenerationId::new(raw).map_err(|err| {
        field_error("id", err.to_string(), ValidationCode::InvalidValue)
    })?;
    let regenerated = state.recommendations.regenerate(id).await?;
    let owner = regenerated.generation.user_id;
    match caller.0 {
        Some(user) if user.id == owner => {}
        Some(user) => {
            warn!(
                generation_id = %id,
                owner = %owner,
                caller = %user.id,
                "record regenerated by a different user"
            );
        }
        None => {
            warn!(generation_id = %id, owner = %owner, "record regenerated anonymously");
        }
    }
    info!(generation_id = %id, "recommendation regenerated");
    Ok(web::Json(RegenerationResponse {
        generation: regenerated.generation,
        clothing_recommendation: regenerated.outfit.recommendation,
        image_url: regenerated.outfit.image_url,
    }))
}
