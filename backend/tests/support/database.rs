//! Database access for integration tests.
//!
//! Suites that need PostgreSQL read `WEATHERWEAR_TEST_DATABASE_URL` and skip
//! with a marker line when it is unset, so the default `cargo test` run stays
//! hermetic.

use weatherwear::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};

/// Variable naming the database used by persistence suites.
pub const TEST_DATABASE_ENV: &str = "WEATHERWEAR_TEST_DATABASE_URL";

/// Migrated pool for the test database, or `None` when none is configured.
pub async fn migrated_pool() -> Option<DbPool> {
    let Ok(url) = std::env::var(TEST_DATABASE_ENV) else {
        eprintln!("SKIP-TEST-DATABASE: {TEST_DATABASE_ENV} not set");
        return None;
    };
    run_pending_migrations(&url)
        .await
        .expect("migrations apply to the test database");
    let pool = DbPool::new(PoolConfig::new(url))
        .await
        .expect("test database pool");
    Some(pool)
}

/// Name that will not collide with rows left by earlier runs.
pub fn unique_name(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4().simple())
}
