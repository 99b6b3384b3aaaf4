//! Driven port for the chat-completion service that drafts recommendations.

use async_trait::async_trait;

use super::UpstreamServiceError;

/// Two-message conversation sent to the completion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionPrompt {
    /// Instruction framing the assistant's role.
    pub system: String,
    /// The request itself.
    pub user: String,
}

/// Port for text completion.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextCompletion: Send + Sync {
    /// Return the assistant's reply text, unmodified.
    async fn complete(&self, prompt: &CompletionPrompt) -> Result<String, UpstreamServiceError>;
}

/// Canned reply used when no completion service is configured.
pub const FIXTURE_COMPLETION: &str = "```json\n{\"summary\":\"Mild with a light breeze\",\"clothes\":{\"top\":\"long-sleeve shirt\",\"bottom\":\"chinos\",\"shoes\":\"trainers\",\"items\":[]},\"items\":[\"sunglasses\"],\"explanation\":[\"Temperatures stay mild through the day.\"]}\n```";

/// Fixture implementation answering every prompt with [`FIXTURE_COMPLETION`].
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureTextCompletion;

#[async_trait]
impl TextCompletion for FixtureTextCompletion {
    async fn complete(&self, _prompt: &CompletionPrompt) -> Result<String, UpstreamServiceError> {
        Ok(FIXTURE_COMPLETION.to_owned())
    }
}
