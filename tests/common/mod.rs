//! Common test utilities

use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};

const USERS_SCHEMA: &str = include_str!("../../migrations/001_create_users.sql");

/// Serializes schema creation between test binaries running in parallel
const SCHEMA_LOCK_KEY: i64 = 0x7573_6572;

/// Connect to the test database and make sure the users table exists.
///
/// Tests never truncate; they isolate themselves through [`unique`] values
/// instead.
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    let mut tx = pool.begin().await.expect("Failed to begin transaction");

    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(SCHEMA_LOCK_KEY)
        .execute(&mut *tx)
        .await
        .expect("Failed to take schema lock");

    (&mut *tx)
        .execute(USERS_SCHEMA)
        .await
        .expect("Failed to apply users schema");

    tx.commit().await.expect("Failed to commit schema");

    pool
}

/// A value no other test run will produce
pub fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4())
}
