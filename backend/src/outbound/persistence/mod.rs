//! PostgreSQL persistence adapters using Diesel.
//!
//! Repositories are thin translators between Diesel rows and domain types,
//! sharing a `bb8` pool through `diesel-async`. Row structs and the schema
//! stay private to this module.
//!
//! # Example
//!
//! ```ignore
//! use weatherwear::outbound::persistence::{DbPool, DieselCredentialStore, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new(database_url)).await?;
//! let store = DieselCredentialStore::new(pool);
//! ```

mod diesel_credential_store;
mod diesel_error_mapping;
mod diesel_generation_repository;
mod diesel_session_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_credential_store::DieselCredentialStore;
pub use diesel_generation_repository::DieselGenerationRepository;
pub use diesel_session_repository::DieselSessionRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError, PoolStage};
