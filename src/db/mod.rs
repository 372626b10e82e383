//! Database module for SQLite persistence.
//!
//! SQLite is the source of truth for banners, their tags and users. The rest of
//! the crate only sees the [`BannerStore`] and [`UserStore`] traits.

mod banner_repository;
mod user_repository;

pub use banner_repository::*;
pub use user_repository::*;

use std::future::Future;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::errors::AppError;
use crate::models::{Banner, BannerFilter, Content, PreBanner, User};

/// Persistence of banners and their tag associations.
///
/// Every method runs in exactly one transaction.
#[async_trait]
pub trait BannerStore: Send + Sync {
    /// Insert a banner and its tags; returns the new banner id.
    async fn add_banner(&self, pre_banner: &PreBanner, author_id: i64) -> Result<i64, AppError>;

    async fn get_banner(&self, banner_id: i64) -> Result<Content, AppError>;

    /// Replace feature, content and active flag of a banner owned by `user_id`.
    async fn update_banner(
        &self,
        pre_banner: &PreBanner,
        banner_id: i64,
        user_id: i64,
    ) -> Result<(), AppError>;

    /// Permanently remove a banner owned by `user_id`.
    async fn delete_banner(&self, banner_id: i64, user_id: i64) -> Result<(), AppError>;

    async fn get_banners_list(&self, filter: BannerFilter) -> Result<Vec<Banner>, AppError>;
}

/// Persistence of user accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn add_user(
        &self,
        login: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<User, AppError>;

    async fn get_user_by_login(&self, login: &str) -> Result<Option<User>, AppError>;
}

/// Run a store operation under a deadline. Dropping the future on expiry rolls
/// back any open transaction.
pub async fn with_deadline<T, F>(deadline: Duration, operation: &str, fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(elapsed) => {
            tracing::warn!(operation, ?deadline, "store deadline exceeded");
            Err(AppError::from(elapsed))
        }
    }
}

/// Initialize the database connection pool and create the schema.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Create tables and indexes if they don't exist.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            login TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            is_admin INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // AUTOINCREMENT keeps ids strictly increasing and never reused after deletes.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS banner (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            author_id INTEGER NOT NULL,
            feature_id INTEGER NOT NULL,
            title TEXT NOT NULL,
            text TEXT NOT NULL,
            url TEXT NOT NULL,
            is_active INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS banner_tag (
            banner_id INTEGER NOT NULL REFERENCES banner(id) ON DELETE CASCADE,
            tag_id INTEGER NOT NULL,
            PRIMARY KEY (banner_id, tag_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_banner_feature_id ON banner(feature_id);
        CREATE INDEX IF NOT EXISTS idx_banner_author_id ON banner(author_id);
        CREATE INDEX IF NOT EXISTS idx_banner_tag_tag_id ON banner_tag(tag_id);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deadline_expiry_is_timeout() {
        let result: Result<(), AppError> = with_deadline(
            Duration::from_millis(10),
            "slow operation",
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            },
        )
        .await;

        let err = result.unwrap_err();
        assert!(matches!(err, AppError::Timeout(ref m) if m.contains("deadline")));
    }

    #[tokio::test]
    async fn test_deadline_passes_result_through() {
        let result = with_deadline(Duration::from_secs(1), "fast operation", async {
            Err::<(), _>(AppError::NotFound("banner 1 not found".into()))
        })
        .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("test.sqlite");
        let pool = init_database(&path).await.unwrap();
        run_migrations(&pool).await.unwrap();
    }
}
