//! Argon2id implementation of the [`PasswordHasher`] port.
//!
//! Hashing is deliberately expensive, so both operations run on the blocking
//! pool. Digests are PHC strings and carry their own salt and parameters, so
//! a change of cost settings only affects newly hashed passwords.

use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use async_trait::async_trait;
use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use crate::domain::ports::{PasswordHasher, PasswordHasherError};
use crate::domain::{PasswordDigest, TraceId};

const SALT_LEN: usize = 16;

/// Argon2id hasher with configurable cost parameters.
#[derive(Debug, Clone)]
pub struct Argon2PasswordHasher {
    params: Params,
}

impl Default for Argon2PasswordHasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl Argon2PasswordHasher {
    /// Hasher with explicit cost parameters.
    #[must_use]
    pub fn new(params: Params) -> Self {
        Self { params }
    }

    /// Cheap parameters for tests and local fixtures.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the parameters are constants within range.
    pub fn low_cost() -> Result<Self, argon2::Error> {
        Ok(Self::new(Params::new(1024, 1, 1, None)?))
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

fn hash_blocking(argon2: &Argon2<'_>, password: &str) -> Result<String, PasswordHasherError> {
    let mut salt = [0_u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let salt = SaltString::encode_b64(&salt)
        .map_err(|err| PasswordHasherError::hashing(err.to_string()))?;
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| PasswordHasherError::hashing(err.to_string()))
}

fn verify_blocking(
    argon2: &Argon2<'_>,
    password: &str,
    digest: &str,
) -> Result<bool, PasswordHasherError> {
    let parsed = PasswordHash::new(digest)
        .map_err(|err| PasswordHasherError::malformed_digest(err.to_string()))?;
    match argon2.verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(err) => Err(PasswordHasherError::malformed_digest(err.to_string())),
    }
}

#[async_trait]
impl PasswordHasher for Argon2PasswordHasher {
    async fn hash(&self, password: &str) -> Result<PasswordDigest, PasswordHasherError> {
        let argon2 = self.argon2();
        let password = Zeroizing::new(password.to_owned());
        TraceId::spawn_blocking(move || hash_blocking(&argon2, &password))
            .await
            .map_err(|err| PasswordHasherError::hashing(format!("hashing task failed: {err}")))?
            .map(PasswordDigest::new)
    }

    async fn verify(
        &self,
        password: &str,
        digest: &PasswordDigest,
    ) -> Result<bool, PasswordHasherError> {
        let argon2 = self.argon2();
        let password = Zeroizing::new(password.to_owned());
        let digest = digest.as_str().to_owned();
        TraceId::spawn_blocking(move || verify_blocking(&argon2, &password, &digest))
            .await
            .map_err(|err| PasswordHasherError::hashing(format!("verify task failed: {err}")))?
    }
}
