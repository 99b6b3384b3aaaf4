//! History domain service implementing [`HistoryService`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::ports::{GenerationRepository, GenerationRepositoryError, HistoryService};
use crate::domain::{Error, GenerationId, GenerationRecord, NewGeneration, Rating, UserId};

/// Message returned when a rating matches none of the caller's records.
pub const GENERATION_NOT_FOUND_MESSAGE: &str = "Generation not found or not authorized";

/// Caller-scoped access to generation records.
pub struct HistoryLedger<G: ?Sized> {
    repository: Arc<G>,
}

impl<G: ?Sized> HistoryLedger<G> {
    /// Create a service over `repository`.
    pub fn new(repository: Arc<G>) -> Self {
        Self { repository }
    }
}

impl<G: ?Sized> Clone for HistoryLedger<G> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

fn map_repository_error(error: GenerationRepositoryError) -> Error {
    match error {
        GenerationRepositoryError::Connection { message } => {
            Error::internal(format!("history repository unavailable: {message}"))
        }
        GenerationRepositoryError::Query { message } => {
            Error::internal(format!("history repository error: {message}"))
        }
    }
}

#[async_trait]
impl<G> HistoryService for HistoryLedger<G>
where
    G: GenerationRepository + ?Sized,
{
    async fn save(
        &self,
        owner: UserId,
        prompt: String,
        response: String,
    ) -> Result<GenerationRecord, Error> {
        let record = NewGeneration {
            user_id: owner,
            prompt,
            response,
        };
        self.repository
            .insert(&record)
            .await
            .map_err(map_repository_error)
    }

    async fn list(&self, owner: UserId) -> Result<Vec<GenerationRecord>, Error> {
        self.repository
            .list_for_user(owner)
            .await
            .map_err(map_repository_error)
    }

    async fn rate(&self, owner: UserId, id: GenerationId, rating: Rating) -> Result<(), Error> {
        let updated = self
            .repository
            .rate_owned(id, owner, rating)
            .await
            .map_err(map_repository_error)?;
        if updated {
            Ok(())
        } else {
            Err(Error::not_found(GENERATION_NOT_FOUND_MESSAGE))
        }
    }
}
