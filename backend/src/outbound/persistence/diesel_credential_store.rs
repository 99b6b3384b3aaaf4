//! PostgreSQL-backed [`CredentialStore`].
//!
//! Uniqueness is enforced by the schema: a unique index on local usernames,
//! one on federated `(provider, provider_id)` pairs, and the e-mail unique
//! constraint. Violations surface as [`CredentialStoreError::Duplicate`].

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{CredentialStore, CredentialStoreError, LocalAccount, NewLocalAccount};
use crate::domain::{
    AuthProvider, FederatedProfile, PasswordDigest, Preferences, Role, User, UserId,
};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error, unique_violation};
use super::models::{NewUserRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel implementation of the credential store.
#[derive(Clone)]
pub struct DieselCredentialStore {
    pool: DbPool,
}

impl DieselCredentialStore {
    /// Create a store over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> CredentialStoreError {
    map_pool_error(error, CredentialStoreError::connection)
}

fn diesel_error(error: diesel::result::Error) -> CredentialStoreError {
    if let Some(constraint) = unique_violation(&error) {
        return CredentialStoreError::duplicate(constraint);
    }
    map_diesel_error(
        error,
        CredentialStoreError::query,
        CredentialStoreError::connection,
    )
}

fn to_user(row: UserRow) -> Result<User, CredentialStoreError> {
    row.into_user().map_err(CredentialStoreError::query)
}

#[async_trait]
impl CredentialStore for DieselCredentialStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, CredentialStoreError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<UserRow> = users::table
            .find(id.as_i32())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(to_user).transpose()
    }

    async fn find_local_account(
        &self,
        username: &str,
    ) -> Result<Option<LocalAccount>, CredentialStoreError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::provider.eq(AuthProvider::Local.as_str()))
            .filter(users::username.eq(username))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        let Some(mut row) = row else {
            return Ok(None);
        };
        let Some(password) = row.password.take() else {
            return Ok(None);
        };
        Ok(Some(LocalAccount {
            user: to_user(row)?,
            password: PasswordDigest::new(password),
        }))
    }

    async fn find_by_provider_identity(
        &self,
        provider: AuthProvider,
        external_id: &str,
    ) -> Result<Option<User>, CredentialStoreError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::provider.eq(provider.as_str()))
            .filter(users::provider_id.eq(external_id))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(to_user).transpose()
    }

    async fn insert_local(&self, account: &NewLocalAccount) -> Result<User, CredentialStoreError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let new_row = NewUserRow {
            username: Some(account.username.as_str()),
            email: Some(account.email.as_str()),
            password: Some(account.password.as_str()),
            provider: AuthProvider::Local.as_str(),
            provider_id: None,
        };
        let row = diesel::insert_into(users::table)
            .values(&new_row)
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(diesel_error)?;
        to_user(row)
    }

    async fn insert_federated(
        &self,
        profile: &FederatedProfile,
    ) -> Result<User, CredentialStoreError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let username = profile.preferred_username();
        let new_row = NewUserRow {
            username: Some(username.as_str()),
            email: profile.email.as_deref(),
            password: None,
            provider: profile.provider.as_str(),
            provider_id: Some(profile.external_id.as_str()),
        };
        let row = diesel::insert_into(users::table)
            .values(&new_row)
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(diesel_error)?;
        to_user(row)
    }

    async fn merge_preferences(
        &self,
        id: UserId,
        overlay: &Preferences,
    ) -> Result<bool, CredentialStoreError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        // `jsonb || jsonb` is a shallow merge where the right side wins.
        let updated = diesel::update(users::table.find(id.as_i32()))
            .set(users::preferences.eq(users::preferences.concat(overlay.clone().into_value())))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(updated > 0)
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<User>, CredentialStoreError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<UserRow> = users::table
            .filter(users::role.eq(role.as_str()))
            .order(users::id.asc())
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        rows.into_iter().map(to_user).collect()
    }

    async fn delete(&self, id: UserId) -> Result<bool, CredentialStoreError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let deleted = diesel::delete(users::table.find(id.as_i32()))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(deleted > 0)
    }
}
