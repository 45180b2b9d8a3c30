//! User Store Repository
//!
//! PostgreSQL implementation of the versioned user store.
//! Writes lock the target row without waiting, compare the stored version
//! with the caller's expectation, then insert or update.

use std::future::Future;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use crate::domain::{OperationContext, User};

use super::filter::{self, UserFilter};
use super::StoreError;

/// Columns selected and returned by every user query
const USER_COLUMNS: &str = "id, first_name, last_name, nickname, password, email, country, \
                            disabled, version, created_at, updated_at";

/// Version assigned to a freshly inserted row
const INITIAL_VERSION: i64 = 1;

/// Versioned store for user aggregates.
///
/// Every call takes an [`OperationContext`]; when its deadline passes the
/// call fails with [`StoreError::Timeout`] and any open transaction is rolled
/// back.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fetch a visible (not disabled) user
    async fn get(&self, ctx: &OperationContext, id: i64) -> Result<User, StoreError>;

    /// All visible users matching `filter`, ordered by id
    async fn list(&self, ctx: &OperationContext, filter: &UserFilter)
        -> Result<Vec<User>, StoreError>;

    /// Create (`expected_version == 0`) or update the user, returning the
    /// stored state
    async fn store(
        &self,
        ctx: &OperationContext,
        user: &User,
        expected_version: u32,
    ) -> Result<User, StoreError>;

    /// Soft delete. Succeeds even when no row matches.
    async fn delete(&self, ctx: &OperationContext, id: i64) -> Result<(), StoreError>;
}

/// Row as read from the `users` table
#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    first_name: String,
    last_name: String,
    nickname: String,
    password: String,
    email: String,
    country: String,
    disabled: bool,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let version = to_version(row.id, row.version)?;

        let mut user = User::new(
            row.id,
            row.first_name,
            row.last_name,
            row.nickname,
            row.password,
            row.email,
            row.country,
        );
        user.hydrate_meta(version, row.created_at, row.updated_at, row.disabled);

        Ok(user)
    }
}

fn to_version(id: i64, version: i64) -> Result<u32, StoreError> {
    u32::try_from(version)
        .map_err(|_| StoreError::InvalidRow(format!("user {} has version {}", id, version)))
}

/// Version read from storage; a missing row counts as version 0
fn stored_version(id: i64, version: Option<i64>) -> Result<u32, StoreError> {
    version.map_or(Ok(0), |version| to_version(id, version))
}

/// Run `fut` under the context deadline, if any
async fn within_deadline<T, F>(
    ctx: &OperationContext,
    operation: &'static str,
    fut: F,
) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match ctx.deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, fut).await.map_err(|_| {
            tracing::warn!(
                operation,
                correlation_id = ?ctx.correlation_id,
                "Deadline elapsed, abandoning operation"
            );
            StoreError::Timeout { operation }
        })?,
        None => fut.await,
    }
}

/// PostgreSQL-backed [`UserStore`]
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Create a new PgUserStore with a database pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // =========================================================================
    // Store protocol (single attempt, no retries)
    // =========================================================================

    async fn try_store(&self, user: &User, expected_version: u32) -> Result<User, StoreError> {
        let id = user.id();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::from_sqlx("begin transaction", id, e))?;

        // Every early return below drops `tx`, which rolls it back.
        let current = self.lock_for_update(&mut tx, id).await?;

        if current != expected_version {
            tracing::debug!(
                user_id = id,
                expected = expected_version,
                actual = current,
                "Version mismatch, rejecting write"
            );
            return Err(StoreError::VersionConflict {
                id,
                expected: expected_version,
                actual: current,
            });
        }

        let row = if current == 0 {
            self.insert(&mut tx, user).await?
        } else {
            match self.update(&mut tx, user, current).await? {
                Some(row) => row,
                None => {
                    let actual = self.read_version(&mut tx, id).await?;
                    return Err(StoreError::VersionConflict {
                        id,
                        expected: expected_version,
                        actual,
                    });
                }
            }
        };
        let stored = User::try_from(row)?;

        tx.commit()
            .await
            .map_err(|e| StoreError::from_sqlx("commit transaction", id, e))?;

        tracing::info!(
            user_id = stored.id(),
            version = stored.version(),
            "User stored"
        );

        Ok(stored)
    }

    /// Lock the row and read its version; 0 if the row does not exist.
    ///
    /// `NOWAIT` makes a concurrent holder fail this call immediately
    /// instead of queueing behind it.
    async fn lock_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
    ) -> Result<u32, StoreError> {
        if id == 0 {
            return Ok(0);
        }

        let version: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT version
            FROM users
            WHERE id = $1
            FOR UPDATE NOWAIT
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| StoreError::from_sqlx("lock user", id, e))?;

        stored_version(id, version)
    }

    /// Re-read the version inside `tx` without taking a lock
    async fn read_version(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
    ) -> Result<u32, StoreError> {
        let version: Option<i64> = sqlx::query_scalar("SELECT version FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| StoreError::from_sqlx("read user version", id, e))?;

        stored_version(id, version)
    }

    async fn insert(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: &User,
    ) -> Result<UserRow, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO users (first_name, last_name, nickname, password, email, country, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, UserRow>(&sql)
            .bind(user.first_name())
            .bind(user.last_name())
            .bind(user.nickname())
            .bind(user.password())
            .bind(user.email())
            .bind(user.country())
            .bind(INITIAL_VERSION)
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| StoreError::from_sqlx("insert user", user.id(), e))
    }

    async fn update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: &User,
        current: u32,
    ) -> Result<Option<UserRow>, StoreError> {
        let sql = format!(
            r#"
            UPDATE users
            SET first_name = $1, last_name = $2, nickname = $3, password = $4,
                email = $5, country = $6, version = $7, updated_at = NOW()
            WHERE id = $8 AND version = $9
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, UserRow>(&sql)
            .bind(user.first_name())
            .bind(user.last_name())
            .bind(user.nickname())
            .bind(user.password())
            .bind(user.email())
            .bind(user.country())
            .bind(i64::from(current) + 1)
            .bind(user.id())
            .bind(i64::from(current))
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| StoreError::from_sqlx("update user", user.id(), e))
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn get(&self, ctx: &OperationContext, id: i64) -> Result<User, StoreError> {
        within_deadline(ctx, "get user", async {
            let sql = format!(
                r#"
                SELECT {USER_COLUMNS}
                FROM users
                WHERE id = $1 AND disabled = false
                "#
            );

            let row = sqlx::query_as::<_, UserRow>(&sql)
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StoreError::from_sqlx("get user", id, e))?
                .ok_or(StoreError::NotFound(id))?;

            User::try_from(row)
        })
        .await
    }

    async fn list(
        &self,
        ctx: &OperationContext,
        filter: &UserFilter,
    ) -> Result<Vec<User>, StoreError> {
        within_deadline(ctx, "list users", async {
            let clause = filter::compose(filter, 1);
            let predicate = if clause.is_empty() {
                "disabled = false".to_string()
            } else {
                format!("{} AND disabled = false", clause.sql)
            };
            let sql = format!(
                r#"
                SELECT {USER_COLUMNS}
                FROM users
                WHERE {predicate}
                ORDER BY id
                "#
            );

            let mut query = sqlx::query_as::<_, UserRow>(&sql);
            for param in clause.params {
                query = query.bind(param);
            }

            let rows = query
                .fetch_all(&self.pool)
                .await
                .map_err(|e| StoreError::from_sqlx("list users", 0, e))?;

            rows.into_iter().map(User::try_from).collect()
        })
        .await
    }

    async fn store(
        &self,
        ctx: &OperationContext,
        user: &User,
        expected_version: u32,
    ) -> Result<User, StoreError> {
        within_deadline(ctx, "store user", self.try_store(user, expected_version)).await
    }

    async fn delete(&self, ctx: &OperationContext, id: i64) -> Result<(), StoreError> {
        within_deadline(ctx, "delete user", async {
            let result = sqlx::query(
                r#"
                UPDATE users
                SET disabled = true, updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::from_sqlx("delete user", id, e))?;

            if result.rows_affected() == 0 {
                tracing::debug!(user_id = id, "Delete matched no user");
            } else {
                tracing::info!(user_id = id, "User disabled");
            }

            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(version: i64, disabled: bool) -> UserRow {
        let now = Utc::now();
        UserRow {
            id: 3,
            first_name: "Test".to_string(),
            last_name: "Test".to_string(),
            nickname: "testuser".to_string(),
            password: "qwerty".to_string(),
            email: "example@example.qqq".to_string(),
            country: "uk".to_string(),
            disabled,
            version,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_row_hydrates_user_without_changes() {
        let user = User::try_from(row(4, false)).unwrap();

        assert_eq!(user.id(), 3);
        assert_eq!(user.nickname(), "testuser");
        assert_eq!(user.version(), 4);
        assert!(!user.is_disabled());
        assert!(!user.has_changes());
    }

    #[test]
    fn test_row_with_negative_version_is_rejected() {
        let result = User::try_from(row(-1, false));

        assert!(matches!(result, Err(StoreError::InvalidRow(_))));
    }

    #[test]
    fn test_stored_version() {
        assert_eq!(stored_version(3, None).unwrap(), 0);
        assert_eq!(stored_version(3, Some(5)).unwrap(), 5);
        assert!(matches!(stored_version(3, Some(-1)), Err(StoreError::InvalidRow(_))));
    }

    #[tokio::test]
    async fn test_within_deadline_times_out() {
        let ctx = OperationContext::new().with_deadline(tokio::time::Instant::now());

        let result: Result<(), StoreError> = within_deadline(&ctx, "slow op", async {
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(StoreError::Timeout { operation: "slow op" })));
    }

    #[tokio::test]
    async fn test_within_deadline_passes_result_through() {
        let ctx = OperationContext::new();

        let result = within_deadline(&ctx, "fast op", async { Ok::<_, StoreError>(7) }).await;

        assert_eq!(result.unwrap(), 7);
    }
}
