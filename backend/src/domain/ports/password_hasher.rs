//! Driven port for one-way password hashing.

use async_trait::async_trait;

use crate::domain::PasswordDigest;

use super::define_port_error;

define_port_error! {
    /// Errors raised while hashing or verifying passwords.
    pub enum PasswordHasherError {
        /// The hasher failed to produce a digest.
        Hashing { message: String } =>
            "password hashing failed: {message}",
        /// A stored digest could not be parsed.
        MalformedDigest { message: String } =>
            "stored password digest is malformed: {message}",
    }
}

/// Salted, adaptive password hashing.
///
/// Verification must compare in constant time; a mismatch is `Ok(false)`,
/// not an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    /// Hash a plain-text password with a fresh salt.
    async fn hash(&self, password: &str) -> Result<PasswordDigest, PasswordHasherError>;

    /// Check a plain-text password against a stored digest.
    async fn verify(
        &self,
        password: &str,
        digest: &PasswordDigest,
    ) -> Result<bool, PasswordHasherError>;
}
