//! PostgreSQL-backed [`GenerationRepository`].

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{GenerationRepository, GenerationRepositoryError};
use crate::domain::{GenerationId, GenerationRecord, NewGeneration, Rating, UserId};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{GenerationRow, NewGenerationRow};
use super::pool::{DbPool, PoolError};
use super::schema::generation_history;

/// Diesel implementation of the history repository.
#[derive(Clone)]
pub struct DieselGenerationRepository {
    pool: DbPool,
}

impl DieselGenerationRepository {
    /// Create a repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> GenerationRepositoryError {
    map_pool_error(error, GenerationRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> GenerationRepositoryError {
    map_diesel_error(
        error,
        GenerationRepositoryError::query,
        GenerationRepositoryError::connection,
    )
}

fn to_record(row: GenerationRow) -> Result<GenerationRecord, GenerationRepositoryError> {
    row.into_record().map_err(GenerationRepositoryError::query)
}

#[async_trait]
impl GenerationRepository for DieselGenerationRepository {
    async fn insert(
        &self,
        record: &NewGeneration,
    ) -> Result<GenerationRecord, GenerationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let new_row = NewGenerationRow {
            user_id: record.user_id.as_i32(),
            prompt: record.prompt.as_str(),
            response: record.response.as_str(),
        };
        let row = diesel::insert_into(generation_history::table)
            .values(&new_row)
            .returning(GenerationRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(diesel_error)?;
        to_record(row)
    }

    async fn list_for_user(
        &self,
        owner: UserId,
    ) -> Result<Vec<GenerationRecord>, GenerationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<GenerationRow> = generation_history::table
            .filter(generation_history::user_id.eq(owner.as_i32()))
            .order((
                generation_history::created_at.desc(),
                generation_history::id.desc(),
            ))
            .select(GenerationRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        rows.into_iter().map(to_record).collect()
    }

    async fn find_by_id(
        &self,
        id: GenerationId,
    ) -> Result<Option<GenerationRecord>, GenerationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<GenerationRow> = generation_history::table
            .find(id.as_i32())
            .select(GenerationRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(to_record).transpose()
    }

    async fn rate_owned(
        &self,
        id: GenerationId,
        owner: UserId,
        rating: Rating,
    ) -> Result<bool, GenerationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated = diesel::update(
            generation_history::table
                .filter(generation_history::id.eq(id.as_i32()))
                .filter(generation_history::user_id.eq(owner.as_i32())),
        )
        .set(generation_history::rating.eq(Some(rating.value())))
        .execute(&mut conn)
        .await
        .map_err(diesel_error)?;
        Ok(updated > 0)
    }

    async fn overwrite(
        &self,
        id: GenerationId,
        prompt: &str,
        response: &str,
    ) -> Result<Option<GenerationRecord>, GenerationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<GenerationRow> =
            diesel::update(generation_history::table.find(id.as_i32()))
                .set((
                    generation_history::prompt.eq(prompt),
                    generation_history::response.eq(response),
                ))
                .returning(GenerationRow::as_returning())
                .get_result(&mut conn)
                .await
                .optional()
                .map_err(diesel_error)?;
        row.map(to_record).transpose()
    }
}
