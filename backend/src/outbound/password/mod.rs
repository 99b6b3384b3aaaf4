//! Password hashing adapter.

mod argon2_hasher;

pub use argon2_hasher::Argon2PasswordHasher;
