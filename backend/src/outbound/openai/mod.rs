//! OpenAI adapter for text completion and image generation.

mod client;
mod dto;

pub use client::{OpenAiClient, OpenAiClientError, OpenAiSettings};
