//! Wire types for the OpenAI chat and image endpoints.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(super) struct ChatRequestDto<'a> {
    pub model: &'a str,
    pub messages: [ChatMessageDto<'a>; 2],
}

#[derive(Debug, Serialize)]
pub(super) struct ChatMessageDto<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChatResponseDto {
    #[serde(default)]
    pub choices: Vec<ChatChoiceDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChatChoiceDto {
    pub message: ChatReplyDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChatReplyDto {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct ImageRequestDto<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub n: u8,
    pub size: &'static str,
}

#[derive(Debug, Deserialize)]
pub(super) struct ImageResponseDto {
    #[serde(default)]
    pub data: Vec<ImageDatumDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ImageDatumDto {
    #[serde(default)]
    pub url: Option<String>,
}

impl ChatResponseDto {
    /// Content of the first choice.
    pub fn into_first_content(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
    }
}

impl ImageResponseDto {
    /// URL of the first image.
    pub fn into_first_url(self) -> Option<String> {
        self.data.into_iter().next().and_then(|datum| datum.url)
    }
}
