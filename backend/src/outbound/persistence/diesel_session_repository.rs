//! PostgreSQL-backed [`SessionRepository`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde_json::Value;

use crate::domain::ports::{SessionEntries, SessionRepository, SessionRepositoryError};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::SessionRow;
use super::pool::{DbPool, PoolError};
use super::schema::sessions;

/// Diesel implementation of the session repository.
#[derive(Clone)]
pub struct DieselSessionRepository {
    pool: DbPool,
}

impl DieselSessionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> SessionRepositoryError {
    map_pool_error(error, SessionRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> SessionRepositoryError {
    map_diesel_error(
        error,
        SessionRepositoryError::query,
        SessionRepositoryError::connection,
    )
}

fn encode(entries: &SessionEntries) -> Result<Value, SessionRepositoryError> {
    serde_json::to_value(entries)
        .map_err(|err| SessionRepositoryError::query(format!("unencodable session: {err}")))
}

fn decode(entries: Value) -> Result<SessionEntries, SessionRepositoryError> {
    serde_json::from_value(entries)
        .map_err(|err| SessionRepositoryError::query(format!("corrupt session row: {err}")))
}

#[async_trait]
impl SessionRepository for DieselSessionRepository {
    async fn load(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionEntries>, SessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let entries: Option<Value> = sessions::table
            .filter(sessions::token.eq(token))
            .filter(sessions::expires_at.gt(now))
            .select(sessions::entries)
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        entries.map(decode).transpose()
    }

    async fn insert(
        &self,
        token: &str,
        entries: &SessionEntries,
        expires_at: DateTime<Utc>,
    ) -> Result<(), SessionRepositoryError> {
        let row = SessionRow {
            token,
            entries: encode(entries)?,
            expires_at,
        };
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(sessions::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(())
    }

    async fn update(
        &self,
        token: &str,
        entries: &SessionEntries,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, SessionRepositoryError> {
        let entries = encode(entries)?;
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated = diesel::update(sessions::table.find(token))
            .set((
                sessions::entries.eq(entries),
                sessions::expires_at.eq(expires_at),
            ))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(updated > 0)
    }

    async fn extend(
        &self,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), SessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::update(sessions::table.find(token))
            .set(sessions::expires_at.eq(expires_at))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(())
    }

    async fn remove(&self, token: &str) -> Result<(), SessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::delete(sessions::table.find(token))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(())
    }

    async fn remove_expired(&self, now: DateTime<Utc>) -> Result<usize, SessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::delete(sessions::table.filter(sessions::expires_at.le(now)))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)
    }
}
