//! Driving port for recommendation generation.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{Error, GenerationId, GenerationRecord, Preferences, Recommendation, UserId};

/// Input to a fresh recommendation.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationRequest {
    /// Forecast payload, passed to the completion service verbatim.
    pub weather_data: Value,
    /// Preferences supplied with the request; they win over stored ones.
    pub preferences: Preferences,
    /// Target date as sent by the client.
    pub date: Value,
}

/// A recommendation and its illustration.
#[derive(Debug, Clone, PartialEq)]
pub struct Outfit {
    /// Parsed recommendation document.
    pub recommendation: Recommendation,
    /// URL of the generated image.
    pub image_url: String,
}

/// Outcome of regenerating a stored record.
#[derive(Debug, Clone, PartialEq)]
pub struct RegeneratedOutfit {
    /// The record after its prompt and response were overwritten.
    pub generation: GenerationRecord,
    /// The fresh recommendation.
    pub outfit: Outfit,
}

/// Recommendation use-cases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecommendationService: Send + Sync {
    /// Produce a recommendation, recording it when `caller` is signed in.
    async fn generate(
        &self,
        request: &RecommendationRequest,
        caller: Option<UserId>,
    ) -> Result<Outfit, Error>;

    /// Re-run a stored record against today's forecast and overwrite it.
    async fn regenerate(&self, id: GenerationId) -> Result<RegeneratedOutfit, Error>;
}
