//! Recommendation orchestrator implementing [`RecommendationService`].
//!
//! A request runs strictly in sequence: resolve preferences, ask the
//! completion service for a recommendation document, validate it, render an
//! image, then record the result for signed-in callers. Upstream failures are
//! fatal and never retried. A failed history write is logged and swallowed.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::Value;
use tracing::{error, warn};

use crate::domain::ports::{
    CompletionPrompt, CredentialStore, GenerationRepository, ImageGeneration, Outfit,
    RecommendationRequest, RecommendationService, RegeneratedOutfit, TextCompletion,
    UpstreamServiceError, WeatherSource,
};
use crate::domain::{
    Error, GenerationContext, GenerationId, NewGeneration, Preferences, Recommendation,
    StoredContextError, UserId,
};

const SYSTEM_PROMPT: &str =
    "You are a weather assistant. Provide recommendations based on customer preferences.";

/// Message returned when any third-party call fails.
pub const UPSTREAM_FAILURE_MESSAGE: &str = "Error fetching recommendation";

/// Adapters the orchestrator depends on.
#[derive(Clone)]
pub struct RecommendationPorts {
    /// Drafts the recommendation text.
    pub completion: Arc<dyn TextCompletion>,
    /// Renders the outfit image.
    pub images: Arc<dyn ImageGeneration>,
    /// Re-fetches forecasts on regeneration.
    pub weather: Arc<dyn WeatherSource>,
    /// Source of stored preferences.
    pub accounts: Arc<dyn CredentialStore>,
    /// Destination for generation records.
    pub history: Arc<dyn GenerationRepository>,
    /// Supplies "today" for regeneration.
    pub clock: Arc<dyn Clock>,
}

/// Chains completion, validation, image generation and persistence.
#[derive(Clone)]
pub struct RecommendationOrchestrator {
    ports: RecommendationPorts,
}

impl RecommendationOrchestrator {
    /// Build an orchestrator over `ports`.
    pub fn new(ports: RecommendationPorts) -> Self {
        Self { ports }
    }

    async fn effective_preferences(
        &self,
        caller: Option<UserId>,
        supplied: &Preferences,
    ) -> Result<Preferences, Error> {
        let Some(id) = caller else {
            return Ok(supplied.clone());
        };
        let stored = self
            .ports
            .accounts
            .find_by_id(id)
            .await
            .map_err(|err| Error::internal(format!("failed to load preferences: {err}")))?;
        Ok(match stored {
            Some(user) => user.preferences.merged_with(supplied),
            None => supplied.clone(),
        })
    }

    /// Ask for a recommendation and render its image.
    ///
    /// Returns the outfit and the cleaned completion text.
    async fn draft(&self, context: &GenerationContext) -> Result<(Outfit, String), Error> {
        let prompt = completion_prompt(context);
        let reply = self
            .ports
            .completion
            .complete(&prompt)
            .await
            .map_err(|err| upstream_error("text completion", &err))?;
        let (recommendation, cleaned) = Recommendation::parse_completion(&reply).map_err(|err| {
            error!(error = %err, "completion did not match the recommendation schema");
            Error::upstream_failure(UPSTREAM_FAILURE_MESSAGE)
        })?;
        let image_url = self
            .ports
            .images
            .generate(&recommendation.image_prompt())
            .await
            .map_err(|err| upstream_error("image generation", &err))?;
        Ok((
            Outfit {
                recommendation,
                image_url,
            },
            cleaned,
        ))
    }

    async fn record(&self, owner: UserId, context: &GenerationContext, response: String) {
        let prompt = match context.to_prompt_text() {
            Ok(prompt) => prompt,
            Err(err) => {
                warn!(user_id = %owner, error = %err, "failed to serialise generation context");
                return;
            }
        };
        let record = NewGeneration {
            user_id: owner,
            prompt,
            response,
        };
        if let Err(err) = self.ports.history.insert(&record).await {
            warn!(user_id = %owner, error = %err, "failed to save generation history");
        }
    }
}

fn upstream_error(stage: &str, err: &UpstreamServiceError) -> Error {
    error!(stage, error = %err, "upstream call failed");
    Error::upstream_failure(UPSTREAM_FAILURE_MESSAGE)
}

fn to_json(value: &impl serde::Serialize) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_owned())
}

/// Build the completion request for a context.
pub fn completion_prompt(context: &GenerationContext) -> CompletionPrompt {
    let user = format!(
        "Here is the weather data: {weather}. The customer preferences are: {prefs}, \
         provide recommendations for a date of: {date}, in this format JSON - \
         summary:,clothes:[hat:(if required),top:,bottom:,shoes:],items:[], explanation:[]\n\
         where in explanation you explain why you have chosen the clothes and items. \
         write no text at all, only provide the JSON.",
        weather = to_json(&context.weather_data),
        prefs = to_json(&context.user_preferences),
        date = to_json(&context.date),
    );
    CompletionPrompt {
        system: SYSTEM_PROMPT.to_owned(),
        user,
    }
}

#[async_trait]
impl RecommendationService for RecommendationOrchestrator {
    async fn generate(
        &self,
        request: &RecommendationRequest,
        caller: Option<UserId>,
    ) -> Result<Outfit, Error> {
        let preferences = self
            .effective_preferences(caller, &request.preferences)
            .await?;
        let context = GenerationContext {
            weather_data: request.weather_data.clone(),
            user_preferences: preferences,
            date: request.date.clone(),
        };
        let (outfit, cleaned) = self.draft(&context).await?;
        if let Some(owner) = caller {
            self.record(owner, &context, cleaned).await;
        }
        Ok(outfit)
    }

    async fn regenerate(&self, id: GenerationId) -> Result<RegeneratedOutfit, Error> {
        let existing = self
            .ports
            .history
            .find_by_id(id)
            .await
            .map_err(|err| Error::internal(format!("failed to load generation: {err}")))?
            .ok_or_else(|| Error::not_found("Generation not found"))?;
        let stored = GenerationContext::from_prompt_text(&existing.prompt)
            .map_err(|err| stored_context_error(&err))?;
        let at = stored.coordinates().map_err(|err| stored_context_error(&err))?;
        let weather_data = self
            .ports
            .weather
            .forecast(at)
            .await
            .map_err(|err| upstream_error("forecast", &err))?;
        let today = self.ports.clock.utc().format("%Y-%m-%d").to_string();
        let context = GenerationContext {
            weather_data,
            user_preferences: stored.user_preferences,
            date: Value::String(today),
        };
        let (outfit, cleaned) = self.draft(&context).await?;
        let prompt = context
            .to_prompt_text()
            .map_err(|err| Error::internal(format!("failed to serialise context: {err}")))?;
        let generation = self
            .ports
            .history
            .overwrite(id, &prompt, &cleaned)
            .await
            .map_err(|err| Error::internal(format!("failed to update generation: {err}")))?
            .ok_or_else(|| Error::not_found("Generation not found"))?;
        Ok(RegeneratedOutfit { generation, outfit })
    }
}

fn stored_context_error(err: &StoredContextError) -> Error {
    Error::invalid_request(format!("Generation cannot be regenerated: {err}"))
}

#[cfg(test)]
#[path = "recommendation_service_tests.rs"]
mod tests;
