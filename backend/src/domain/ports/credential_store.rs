//! Driven port for account persistence.
//!
//! Adapters own the uniqueness rules (local usernames, federated identities
//! and e-mail addresses) and report violations as
//! [`CredentialStoreError::Duplicate`] so services can tell a collision apart
//! from an outage.

use async_trait::async_trait;

use crate::domain::{
    AuthProvider, FederatedProfile, PasswordDigest, Preferences, Role, User, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by credential store adapters.
    pub enum CredentialStoreError {
        /// Connection could not be checked out.
        Connection { message: String } =>
            "credential store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "credential store query failed: {message}",
        /// A uniqueness constraint rejected the write.
        Duplicate { constraint: String } =>
            "credential store rejected duplicate value ({constraint})",
    }
}

/// Local account together with its stored password digest.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalAccount {
    /// The account.
    pub user: User,
    /// Stored hash to verify a login attempt against.
    pub password: PasswordDigest,
}

/// Insert payload for a local account.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLocalAccount {
    /// Login name.
    pub username: String,
    /// Contact e-mail.
    pub email: String,
    /// Hashed password.
    pub password: PasswordDigest,
}

/// Port for reading and writing user accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fetch an account by id.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, CredentialStoreError>;

    /// Fetch a local account and its digest by login name.
    async fn find_local_account(
        &self,
        username: &str,
    ) -> Result<Option<LocalAccount>, CredentialStoreError>;

    /// Fetch a federated account by its external identity.
    async fn find_by_provider_identity(
        &self,
        provider: AuthProvider,
        external_id: &str,
    ) -> Result<Option<User>, CredentialStoreError>;

    /// Create a local account with the default role and empty preferences.
    async fn insert_local(&self, account: &NewLocalAccount) -> Result<User, CredentialStoreError>;

    /// Create a password-less account for a federated identity.
    async fn insert_federated(
        &self,
        profile: &FederatedProfile,
    ) -> Result<User, CredentialStoreError>;

    /// Shallow-merge `overlay` into the stored preferences in one write.
    ///
    /// Returns `false` when no account has the given id.
    async fn merge_preferences(
        &self,
        id: UserId,
        overlay: &Preferences,
    ) -> Result<bool, CredentialStoreError>;

    /// List accounts holding `role`, ordered by id.
    async fn list_by_role(&self, role: Role) -> Result<Vec<User>, CredentialStoreError>;

    /// Delete an account and, through the store's cascade, its history.
    ///
    /// Returns `false` when no row was deleted.
    async fn delete(&self, id: UserId) -> Result<bool, CredentialStoreError>;
}
