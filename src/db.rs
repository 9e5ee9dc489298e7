use crate::error::ApiError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Type alias for the PostgreSQL connection pool
pub type DbPool = PgPool;

/// Creates and configures a PostgreSQL connection pool
///
/// # Arguments
/// * `database_url` - PostgreSQL connection string
///
/// # Returns
/// * `Result<DbPool>` - Configured connection pool or error
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    tracing::debug!("Creating database connection pool");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(3))
        .connect(database_url)
        .await?;

    tracing::info!("Database connection pool created successfully");
    Ok(pool)
}

/// Check if a course with the given title already exists
pub async fn check_duplicate_course(pool: &PgPool, title: &str) -> Result<bool, ApiError> {
    tracing::debug!("Checking for duplicate course title: {}", title);

    let exists: Option<bool> =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM courses WHERE title = $1)")
            .bind(title)
            .fetch_one(pool)
            .await?;

    let is_duplicate = exists.unwrap_or(false);
    if is_duplicate {
        tracing::debug!("Duplicate course title found: {}", title);
    }

    Ok(is_duplicate)
}

/// Check if a course with the given title already exists, excluding a
/// specific ID. Used for update operations so a course may keep its title.
pub async fn check_duplicate_course_excluding_id(
    pool: &PgPool,
    title: &str,
    exclude_id: i32,
) -> Result<bool, ApiError> {
    let exists: Option<bool> =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM courses WHERE title = $1 AND id != $2)")
            .bind(title)
            .bind(exclude_id)
            .fetch_one(pool)
            .await?;

    Ok(exists.unwrap_or(false))
}
