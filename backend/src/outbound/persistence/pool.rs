//! bb8 pool of `diesel-async` PostgreSQL connections.
//!
//! One pool is built at start-up and cloned into every repository.

use std::fmt;
use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};

/// Which pool operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolStage {
    Build,
    Checkout,
}

impl fmt::Display for PoolStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Build => "build",
            Self::Checkout => "checkout",
        })
    }
}

/// A pool failure with the driver's message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("connection pool {stage} failed: {message}")]
pub struct PoolError {
    pub stage: PoolStage,
    message: String,
}

impl PoolError {
    pub fn build(message: impl Into<String>) -> Self {
        Self {
            stage: PoolStage::Build,
            message: message.into(),
        }
    }

    pub fn checkout(message: impl Into<String>) -> Self {
        Self {
            stage: PoolStage::Checkout,
            message: message.into(),
        }
    }

    /// The driver message without the stage prefix.
    pub fn into_message(self) -> String {
        self.message
    }
}

/// Limits applied when the pool is built.
///
/// `PoolConfig::new` gives 10 connections, 2 idle and a 30 second checkout
/// timeout; the fields are public for callers that need something else.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub database_url: String,
    pub max_size: u32,
    pub min_idle: Option<u32>,
    pub checkout_timeout: Duration,
}

impl PoolConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_size: 10,
            min_idle: Some(2),
            checkout_timeout: Duration::from_secs(30),
        }
    }
}

/// Cloneable pool handle.
#[derive(Clone)]
pub struct DbPool(Pool<AsyncPgConnection>);

impl DbPool {
    /// Build the pool, opening `min_idle` connections eagerly.
    ///
    /// # Errors
    ///
    /// A [`PoolStage::Build`] error when the URL is malformed or the server
    /// refuses connections.
    pub async fn new(config: PoolConfig) -> Result<Self, PoolError> {
        let PoolConfig {
            database_url,
            max_size,
            min_idle,
            checkout_timeout,
        } = config;
        Pool::builder()
            .max_size(max_size)
            .min_idle(min_idle)
            .connection_timeout(checkout_timeout)
            .build(AsyncDieselConnectionManager::<AsyncPgConnection>::new(
                database_url,
            ))
            .await
            .map(Self)
            .map_err(|err| PoolError::build(err.to_string()))
    }

    /// Borrow a connection, waiting at most the checkout timeout.
    ///
    /// # Errors
    ///
    /// A [`PoolStage::Checkout`] error when none frees up in time.
    pub async fn get(&self) -> Result<PooledConnection<'_, AsyncPgConnection>, PoolError> {
        self.0
            .get()
            .await
            .map_err(|err| PoolError::checkout(err.to_string()))
    }
}
