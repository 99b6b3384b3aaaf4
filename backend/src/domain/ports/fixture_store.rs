//! In-memory store used when no database is configured and by tests.
//!
//! One value backs both [`CredentialStore`] and [`GenerationRepository`] so
//! that deleting an account drops its history, mirroring the database
//! cascade. Uniqueness rules match the Postgres indexes.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use mockable::{Clock, DefaultClock};

use crate::domain::{
    AuthProvider, FederatedProfile, GenerationId, GenerationRecord, NewGeneration,
    PasswordDigest, Preferences, Rating, Role, User, UserId,
};

use super::{
    CredentialStore, CredentialStoreError, GenerationRepository, GenerationRepositoryError,
    LocalAccount, NewLocalAccount,
};

#[derive(Debug, Default)]
struct Tables {
    next_user_id: i32,
    next_generation_id: i32,
    users: Vec<(User, Option<PasswordDigest>)>,
    generations: Vec<GenerationRecord>,
}

/// Shared in-memory tables.
#[derive(Clone)]
pub struct FixtureStore {
    tables: Arc<Mutex<Tables>>,
    clock: Arc<dyn Clock>,
}

impl Default for FixtureStore {
    fn default() -> Self {
        Self::new(Arc::new(DefaultClock))
    }
}

impl FixtureStore {
    /// Empty store stamping rows with `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables::default())),
            clock,
        }
    }

    /// Change an account's role. Returns `false` for unknown ids.
    ///
    /// Roles are never changed through the API, so seeding an administrator
    /// goes through here.
    pub fn set_role(&self, id: UserId, role: Role) -> bool {
        let Ok(mut tables) = self.tables.lock() else {
            return false;
        };
        match tables.users.iter_mut().find(|(user, _)| user.id == id) {
            Some((user, _)) => {
                user.role = role;
                true
            }
            None => false,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, String> {
        self.tables
            .lock()
            .map_err(|_| "fixture store lock poisoned".to_owned())
    }

    fn credential_lock(&self) -> Result<MutexGuard<'_, Tables>, CredentialStoreError> {
        self.lock().map_err(CredentialStoreError::connection)
    }

    fn generation_lock(&self) -> Result<MutexGuard<'_, Tables>, GenerationRepositoryError> {
        self.lock().map_err(GenerationRepositoryError::connection)
    }
}

impl Tables {
    fn insert_user(
        &mut self,
        mut user: User,
        password: Option<PasswordDigest>,
    ) -> Result<User, CredentialStoreError> {
        let clash = self.users.iter().find_map(|(existing, _)| {
            if user.email.is_some() && existing.email == user.email {
                return Some("users_email_key");
            }
            if user.provider == AuthProvider::Local
                && existing.provider == AuthProvider::Local
                && existing.username == user.username
            {
                return Some("users_local_username_key");
            }
            if user.provider.is_federated()
                && existing.provider == user.provider
                && existing.provider_id == user.provider_id
            {
                return Some("users_provider_identity_key");
            }
            None
        });
        if let Some(constraint) = clash {
            return Err(CredentialStoreError::duplicate(constraint));
        }
        self.next_user_id += 1;
        user.id = UserId::new(self.next_user_id)
            .map_err(|err| CredentialStoreError::query(err.to_string()))?;
        self.users.push((user.clone(), password));
        Ok(user)
    }

    fn user_exists(&self, id: UserId) -> bool {
        self.users.iter().any(|(user, _)| user.id == id)
    }
}

fn placeholder_id() -> Result<UserId, CredentialStoreError> {
    UserId::new(1).map_err(|err| CredentialStoreError::query(err.to_string()))
}

#[async_trait]
impl CredentialStore for FixtureStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, CredentialStoreError> {
        let tables = self.credential_lock()?;
        Ok(tables
            .users
            .iter()
            .find(|(user, _)| user.id == id)
            .map(|(user, _)| user.clone()))
    }

    async fn find_local_account(
        &self,
        username: &str,
    ) -> Result<Option<LocalAccount>, CredentialStoreError> {
        let tables = self.credential_lock()?;
        Ok(tables.users.iter().find_map(|(user, password)| {
            let matches = user.provider == AuthProvider::Local
                && user.username.as_deref() == Some(username);
            match (matches, password) {
                (true, Some(password)) => Some(LocalAccount {
                    user: user.clone(),
                    password: password.clone(),
                }),
                _ => None,
            }
        }))
    }

    async fn find_by_provider_identity(
        &self,
        provider: AuthProvider,
        external_id: &str,
    ) -> Result<Option<User>, CredentialStoreError> {
        let tables = self.credential_lock()?;
        Ok(tables
            .users
            .iter()
            .find(|(user, _)| {
                user.provider == provider && user.provider_id.as_deref() == Some(external_id)
            })
            .map(|(user, _)| user.clone()))
    }

    async fn insert_local(&self, account: &NewLocalAccount) -> Result<User, CredentialStoreError> {
        let user = User {
            id: placeholder_id()?,
            username: Some(account.username.clone()),
            email: Some(account.email.clone()),
            provider: AuthProvider::Local,
            provider_id: None,
            role: Role::User,
            preferences: Preferences::new(),
            created_at: self.clock.utc(),
        };
        self.credential_lock()?
            .insert_user(user, Some(account.password.clone()))
    }

    async fn insert_federated(
        &self,
        profile: &FederatedProfile,
    ) -> Result<User, CredentialStoreError> {
        let user = User {
            id: placeholder_id()?,
            username: Some(profile.preferred_username()),
            email: profile.email.clone(),
            provider: profile.provider,
            provider_id: Some(profile.external_id.clone()),
            role: Role::User,
            preferences: Preferences::new(),
            created_at: self.clock.utc(),
        };
        self.credential_lock()?.insert_user(user, None)
    }

    async fn merge_preferences(
        &self,
        id: UserId,
        overlay: &Preferences,
    ) -> Result<bool, CredentialStoreError> {
        let mut tables = self.credential_lock()?;
        match tables.users.iter_mut().find(|(user, _)| user.id == id) {
            Some((user, _)) => {
                user.preferences.merge(overlay);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<User>, CredentialStoreError> {
        let tables = self.credential_lock()?;
        let mut users: Vec<User> = tables
            .users
            .iter()
            .filter(|(user, _)| user.role == role)
            .map(|(user, _)| user.clone())
            .collect();
        users.sort_by_key(|user| user.id);
        Ok(users)
    }

    async fn delete(&self, id: UserId) -> Result<bool, CredentialStoreError> {
        let mut tables = self.credential_lock()?;
        let before = tables.users.len();
        tables.users.retain(|(user, _)| user.id != id);
        let deleted = tables.users.len() != before;
        if deleted {
            tables.generations.retain(|record| record.user_id != id);
        }
        Ok(deleted)
    }
}

#[async_trait]
impl GenerationRepository for FixtureStore {
    async fn insert(
        &self,
        record: &NewGeneration,
    ) -> Result<GenerationRecord, GenerationRepositoryError> {
        let mut tables = self.generation_lock()?;
        if !tables.user_exists(record.user_id) {
            return Err(GenerationRepositoryError::query(format!(
                "user {} does not exist",
                record.user_id
            )));
        }
        tables.next_generation_id += 1;
        let id = GenerationId::new(i64::from(tables.next_generation_id))
            .map_err(|err| GenerationRepositoryError::query(err.to_string()))?;
        let stored = GenerationRecord {
            id,
            user_id: record.user_id,
            prompt: record.prompt.clone(),
            response: record.response.clone(),
            rating: None,
            created_at: self.clock.utc(),
        };
        tables.generations.push(stored.clone());
        Ok(stored)
    }

    async fn list_for_user(
        &self,
        owner: UserId,
    ) -> Result<Vec<GenerationRecord>, GenerationRepositoryError> {
        let tables = self.generation_lock()?;
        let mut records: Vec<GenerationRecord> = tables
            .generations
            .iter()
            .filter(|record| record.user_id == owner)
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.as_i32().cmp(&a.id.as_i32()))
        });
        Ok(records)
    }

    async fn find_by_id(
        &self,
        id: GenerationId,
    ) -> Result<Option<GenerationRecord>, GenerationRepositoryError> {
        let tables = self.generation_lock()?;
        Ok(tables
            .generations
            .iter()
            .find(|record| record.id == id)
            .cloned())
    }

    async fn rate_owned(
        &self,
        id: GenerationId,
        owner: UserId,
        rating: Rating,
    ) -> Result<bool, GenerationRepositoryError> {
        let mut tables = self.generation_lock()?;
        match tables
            .generations
            .iter_mut()
            .find(|record| record.id == id && record.user_id == owner)
        {
            Some(record) => {
                record.rating = Some(rating);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn overwrite(
        &self,
        id: GenerationId,
        prompt: &str,
        response: &str,
    ) -> Result<Option<GenerationRecord>, GenerationRepositoryError> {
        let mut tables = self.generation_lock()?;
        Ok(tables
            .generations
            .iter_mut()
            .find(|record| record.id == id)
            .map(|record| {
                record.prompt = prompt.to_owned();
                record.response = response.to_owned();
                record.clone()
            }))
    }
}
