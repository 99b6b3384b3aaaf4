//! Driven port for the image-generation service.

use async_trait::async_trait;

use super::UpstreamServiceError;

/// Port for rendering an outfit image.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageGeneration: Send + Sync {
    /// Generate one image for `prompt` and return its URL.
    async fn generate(&self, prompt: &str) -> Result<String, UpstreamServiceError>;
}

/// URL returned by [`FixtureImageGeneration`].
pub const FIXTURE_IMAGE_URL: &str = "https://images.example.com/outfit.png";

/// Fixture implementation returning a fixed URL.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureImageGeneration;

#[async_trait]
impl ImageGeneration for FixtureImageGeneration {
    async fn generate(&self, _prompt: &str) -> Result<String, UpstreamServiceError> {
        Ok(FIXTURE_IMAGE_URL.to_owned())
    }
}
