//! Reqwest-backed OpenAI adapter for chat completions and image generation.
//!
//! Both calls authenticate with a bearer key. Image generation gets its own
//! client because it routinely takes far longer than a chat completion.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;
use zeroize::Zeroizing;

use super::dto::{
    ChatMessageDto, ChatRequestDto, ChatResponseDto, ImageRequestDto, ImageResponseDto,
};
use crate::domain::ports::{CompletionPrompt, ImageGeneration, TextCompletion, UpstreamServiceError};
use crate::outbound::http_support::{
    build_client, decode, endpoint, map_transport_error, read_success,
};

const IMAGE_SIZE: &str = "1024x1024";

/// Connection settings for [`OpenAiClient`].
pub struct OpenAiSettings {
    /// API root, for example `https://api.openai.com/v1`.
    pub base_url: Url,
    /// Bearer key.
    pub api_key: Zeroizing<String>,
    /// Chat model name.
    pub chat_model: String,
    /// Image model name.
    pub image_model: String,
    /// Timeout for chat completions.
    pub chat_timeout: Duration,
    /// Timeout for image generation.
    pub image_timeout: Duration,
}

/// OpenAI adapter implementing [`TextCompletion`] and [`ImageGeneration`].
pub struct OpenAiClient {
    chat_client: Client,
    image_client: Client,
    chat_url: Url,
    images_url: Url,
    api_key: Zeroizing<String>,
    chat_model: String,
    image_model: String,
}

/// Failure constructing an [`OpenAiClient`].
#[derive(Debug, thiserror::Error)]
pub enum OpenAiClientError {
    /// The HTTP client could not be built.
    #[error("failed to build OpenAI HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    /// An endpoint could not be derived from the base URL.
    #[error(transparent)]
    Endpoint(#[from] UpstreamServiceError),
}

impl OpenAiClient {
    /// Build the adapter.
    ///
    /// # Errors
    ///
    /// Returns [`OpenAiClientError`] when a client cannot be constructed or
    /// the base URL cannot take the endpoint paths.
    pub fn new(settings: OpenAiSettings) -> Result<Self, OpenAiClientError> {
        Ok(Self {
            chat_client: build_client(settings.chat_timeout)?,
            image_client: build_client(settings.image_timeout)?,
            chat_url: endpoint(&settings.base_url, "chat/completions")?,
            images_url: endpoint(&settings.base_url, "images/generations")?,
            api_key: settings.api_key,
            chat_model: settings.chat_model,
            image_model: settings.image_model,
        })
    }
}

#[async_trait]
impl TextCompletion for OpenAiClient {
    async fn complete(&self, prompt: &CompletionPrompt) -> Result<String, UpstreamServiceError> {
        let request = ChatRequestDto {
            model: self.chat_model.as_str(),
            messages: [
                ChatMessageDto {
                    role: "system",
                    content: prompt.system.as_str(),
                },
                ChatMessageDto {
                    role: "user",
                    content: prompt.user.as_str(),
                },
            ],
        };
        let response = self
            .chat_client
            .post(self.chat_url.clone())
            .bearer_auth(self.api_key.as_str())
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;
        let body = read_success(response).await?;
        debug!(bytes = body.len(), model = %self.chat_model, "chat completion received");
        parse_completion(&body)
    }
}

#[async_trait]
impl ImageGeneration for OpenAiClient {
    async fn generate(&self, prompt: &str) -> Result<String, UpstreamServiceError> {
        let request = ImageRequestDto {
            model: self.image_model.as_str(),
            prompt,
            n: 1,
            size: IMAGE_SIZE,
        };
        let response = self
            .image_client
            .post(self.images_url.clone())
            .bearer_auth(self.api_key.as_str())
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;
        let body = read_success(response).await?;
        parse_image(&body)
    }
}

fn parse_completion(body: &[u8]) -> Result<String, UpstreamServiceError> {
    decode::<ChatResponseDto>(body, "chat completion")?
        .into_first_content()
        .ok_or_else(|| UpstreamServiceError::decode("chat completion has no message content"))
}

fn parse_image(body: &[u8]) -> Result<String, UpstreamServiceError> {
    decode::<ImageResponseDto>(body, "image generation")?
        .into_first_url()
        .ok_or_else(|| UpstreamServiceError::decode("image generation returned no URL"))
}
