//! Driving port for account use-cases.
//!
//! Inbound adapters call this port for registration, login, session
//! resolution, preference updates and user administration, without knowing
//! which store or hasher sits behind it.

use async_trait::async_trait;

use crate::domain::{
    Error, FederatedProfile, LoginCredentials, Preferences, Registration, User, UserId,
};

/// Account use-cases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Create a local account. Collisions fail with "User already exists".
    async fn register(&self, registration: &Registration) -> Result<User, Error>;

    /// Verify a local username and password.
    async fn authenticate_local(&self, credentials: &LoginCredentials) -> Result<User, Error>;

    /// Find or create the account for a federated identity.
    async fn authenticate_federated(&self, profile: &FederatedProfile) -> Result<User, Error>;

    /// Resolve a session's user id; `None` when the account no longer exists.
    async fn resolve_session_user(&self, id: UserId) -> Result<Option<User>, Error>;

    /// Shallow-merge preferences into the stored object.
    async fn update_preferences(&self, id: UserId, overlay: &Preferences) -> Result<(), Error>;

    /// Accounts with the regular `user` role, ordered by id.
    async fn list_users(&self) -> Result<Vec<User>, Error>;

    /// Delete an account and its history.
    async fn delete_user(&self, id: UserId) -> Result<(), Error>;
}
