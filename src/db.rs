//! Database module
//!
//! Connectivity and schema checks run at startup.

use sqlx::PgPool;

/// Columns the versioned store reads and writes
const REQUIRED_USER_COLUMNS: &[&str] = &[
    "id",
    "first_name",
    "last_name",
    "nickname",
    "password",
    "email",
    "country",
    "disabled",
    "version",
    "created_at",
    "updated_at",
];

/// Verify database connectivity
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;

    Ok(())
}

/// Check that the `users` table exists with every column the store needs.
///
/// The schema itself is applied out of band (see `migrations/`).
pub async fn check_schema(pool: &PgPool) -> Result<bool, sqlx::Error> {
    let columns: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT column_name::text
        FROM information_schema.columns
        WHERE table_schema = 'public' AND table_name = 'users'
        "#,
    )
    .fetch_all(pool)
    .await?;

    if columns.is_empty() {
        tracing::error!("Required table 'users' does not exist");
        return Ok(false);
    }

    let missing = missing_columns(&columns);
    if !missing.is_empty() {
        tracing::error!(?missing, "Table 'users' is missing required columns");
        return Ok(false);
    }

    tracing::info!("Schema verified: users");
    Ok(true)
}

fn missing_columns(present: &[String]) -> Vec<&'static str> {
    REQUIRED_USER_COLUMNS
        .iter()
        .copied()
        .filter(|required| !present.iter().any(|c| c == required))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns() {
        let present: Vec<String> = REQUIRED_USER_COLUMNS
            .iter()
            .filter(|c| **c != "version")
            .map(|c| c.to_string())
            .collect();

        assert_eq!(missing_columns(&present), vec!["version"]);
    }

    #[test]
    fn test_no_missing_columns() {
        let present: Vec<String> = REQUIRED_USER_COLUMNS.iter().map(|c| c.to_string()).collect();

        assert!(missing_columns(&present).is_empty());
    }
}
