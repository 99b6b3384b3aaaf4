//! Driving port for a user's own recommendation history.

use async_trait::async_trait;

use crate::domain::{Error, GenerationId, GenerationRecord, Rating, UserId};

/// History use-cases, always scoped to the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistoryService: Send + Sync {
    /// Store a prompt and response pair for `owner`.
    async fn save(
        &self,
        owner: UserId,
        prompt: String,
        response: String,
    ) -> Result<GenerationRecord, Error>;

    /// The caller's records, newest first.
    async fn list(&self, owner: UserId) -> Result<Vec<GenerationRecord>, Error>;

    /// Rate one of the caller's records. Unknown or foreign records are
    /// "not found".
    async fn rate(&self, owner: UserId, id: GenerationId, rating: Rating) -> Result<(), Error>;
}
