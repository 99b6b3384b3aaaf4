//! Driven port for recommendation history.

use async_trait::async_trait;

use crate::domain::{GenerationId, GenerationRecord, NewGeneration, Rating, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by history repository adapters.
    pub enum GenerationRepositoryError {
        /// Connection could not be checked out.
        Connection { message: String } =>
            "history repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "history repository query failed: {message}",
    }
}

/// Port for persisting generation records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationRepository: Send + Sync {
    /// Store a new record and return it with its assigned id and timestamp.
    async fn insert(
        &self,
        record: &NewGeneration,
    ) -> Result<GenerationRecord, GenerationRepositoryError>;

    /// Records owned by `owner`, newest first, ties broken by id descending.
    async fn list_for_user(
        &self,
        owner: UserId,
    ) -> Result<Vec<GenerationRecord>, GenerationRepositoryError>;

    /// Fetch a record by id regardless of owner.
    async fn find_by_id(
        &self,
        id: GenerationId,
    ) -> Result<Option<GenerationRecord>, GenerationRepositoryError>;

    /// Set the rating on a record only when it is owned by `owner`.
    ///
    /// Returns `false` when no row matched both the id and the owner.
    async fn rate_owned(
        &self,
        id: GenerationId,
        owner: UserId,
        rating: Rating,
    ) -> Result<bool, GenerationRepositoryError>;

    /// Replace the prompt and response of a record in place.
    async fn overwrite(
        &self,
        id: GenerationId,
        prompt: &str,
        response: &str,
    ) -> Result<Option<GenerationRecord>, GenerationRepositoryError>;
}
