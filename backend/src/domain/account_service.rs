//! Account domain service implementing [`AccountService`].

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use crate::domain::ports::{
    AccountService, CredentialStore, CredentialStoreError, NewLocalAccount, PasswordHasher,
    PasswordHasherError,
};
use crate::domain::{
    Error, FederatedProfile, LoginCredentials, Preferences, Registration, Role, User, UserId,
};

/// Message returned for any failed local login.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Incorrect username or password";
/// Message returned when a unique constraint rejects a new account.
pub const ALREADY_EXISTS_MESSAGE: &str = "User already exists";

/// Registration, login and administration over a credential store.
pub struct AccountManager<S: ?Sized, H: ?Sized> {
    store: Arc<S>,
    hasher: Arc<H>,
}

impl<S: ?Sized, H: ?Sized> AccountManager<S, H> {
    /// Create a service over the given store and hasher.
    pub fn new(store: Arc<S>, hasher: Arc<H>) -> Self {
        Self { store, hasher }
    }
}

impl<S: ?Sized, H: ?Sized> Clone for AccountManager<S, H> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            hasher: Arc::clone(&self.hasher),
        }
    }
}

fn already_exists() -> Error {
    Error::invalid_request(ALREADY_EXISTS_MESSAGE).with_details(json!({ "code": "already_exists" }))
}

fn map_store_error(error: CredentialStoreError) -> Error {
    match error {
        CredentialStoreError::Connection { message } => {
            Error::internal(format!("credential store unavailable: {message}"))
        }
        CredentialStoreError::Query { message } => {
            Error::internal(format!("credential store error: {message}"))
        }
        CredentialStoreError::Duplicate { .. } => already_exists(),
    }
}

fn map_hasher_error(error: PasswordHasherError) -> Error {
    Error::internal(error.to_string())
}

#[async_trait]
impl<S, H> AccountService for AccountManager<S, H>
where
    S: CredentialStore + ?Sized,
    H: PasswordHasher + ?Sized,
{
    async fn register(&self, registration: &Registration) -> Result<User, Error> {
        let password = self
            .hasher
            .hash(registration.password())
            .await
            .map_err(map_hasher_error)?;
        let account = NewLocalAccount {
            username: registration.username().to_owned(),
            email: registration.email().to_owned(),
            password,
        };
        let user = self
            .store
            .insert_local(&account)
            .await
            .map_err(map_store_error)?;
        info!(user_id = %user.id, "registered local account");
        Ok(user)
    }

    async fn authenticate_local(&self, credentials: &LoginCredentials) -> Result<User, Error> {
        let Some(account) = self
            .store
            .find_local_account(credentials.username())
            .await
            .map_err(map_store_error)?
        else {
            debug!("login rejected: unknown username");
            return Err(Error::unauthorized(INVALID_CREDENTIALS_MESSAGE));
        };
        let verified = self
            .hasher
            .verify(credentials.password(), &account.password)
            .await
            .map_err(map_hasher_error)?;
        if !verified {
            debug!(user_id = %account.user.id, "login rejected: password mismatch");
            return Err(Error::unauthorized(INVALID_CREDENTIALS_MESSAGE));
        }
        Ok(account.user)
    }

    async fn authenticate_federated(&self, profile: &FederatedProfile) -> Result<User, Error> {
        if let Some(user) = self
            .store
            .find_by_provider_identity(profile.provider, &profile.external_id)
            .await
            .map_err(map_store_error)?
        {
            return Ok(user);
        }
        match self.store.insert_federated(profile).await {
            Ok(user) => {
                info!(
                    user_id = %user.id,
                    provider = %profile.provider,
                    "created federated account"
                );
                Ok(user)
            }
            // A concurrent first login may have won the insert; anything else
            // that collided (such as the e-mail) belongs to another identity.
            Err(CredentialStoreError::Duplicate { constraint }) => {
                debug!(%constraint, "federated insert collided; re-fetching");
                self.store
                    .find_by_provider_identity(profile.provider, &profile.external_id)
                    .await
                    .map_err(map_store_error)?
                    .ok_or_else(already_exists)
            }
            Err(other) => Err(map_store_error(other)),
        }
    }

    async fn resolve_session_user(&self, id: UserId) -> Result<Option<User>, Error> {
        self.store.find_by_id(id).await.map_err(map_store_error)
    }

    async fn update_preferences(&self, id: UserId, overlay: &Preferences) -> Result<(), Error> {
        let found = self
            .store
            .merge_preferences(id, overlay)
            .await
            .map_err(map_store_error)?;
        if found {
            Ok(())
        } else {
            Err(Error::not_found("User not found"))
        }
    }

    async fn list_users(&self) -> Result<Vec<User>, Error> {
        self.store
            .list_by_role(Role::User)
            .await
            .map_err(map_store_error)
    }

    async fn delete_user(&self, id: UserId) -> Result<(), Error> {
        let deleted = self.store.delete(id).await.map_err(map_store_error)?;
        if deleted {
            info!(user_id = %id, "deleted account");
            Ok(())
        } else {
            Err(Error::not_found("User not found"))
        }
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
