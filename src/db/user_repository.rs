//! SQLite implementation of [`UserStore`].

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use super::{with_deadline, UserStore};
use crate::errors::AppError;
use crate::models::User;

#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
    deadline: Duration,
}

impl UserRepository {
    pub fn new(pool: SqlitePool, deadline: Duration) -> Self {
        Self { pool, deadline }
    }

    async fn insert_user(
        &self,
        login: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<User, AppError> {
        let result = sqlx::query(
            "INSERT INTO users (login, password_hash, is_admin, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(login)
        .bind(password_hash)
        .bind(is_admin)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let taken = e
                .as_database_error()
                .is_some_and(|db| db.is_unique_violation());
            if taken {
                AppError::Validation(format!("login {} is already taken", login))
            } else {
                AppError::from(e)
            }
        })?;

        let id = result.last_insert_rowid();
        tracing::info!(user_id = id, is_admin, "user created");

        Ok(User {
            id,
            login: login.to_string(),
            password_hash: password_hash.to_string(),
            is_admin,
        })
    }

    async fn select_user(&self, login: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query("SELECT id, login, password_hash, is_admin FROM users WHERE login = ?")
            .bind(login)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| -> Result<User, AppError> {
            Ok(User {
                id: row.try_get("id")?,
                login: row.try_get("login")?,
                password_hash: row.try_get("password_hash")?,
                is_admin: row.try_get("is_admin")?,
            })
        })
        .transpose()
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn add_user(
        &self,
        login: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<User, AppError> {
        with_deadline(
            self.deadline,
            "add user",
            self.insert_user(login, password_hash, is_admin),
        )
        .await
    }

    async fn get_user_by_login(&self, login: &str) -> Result<Option<User>, AppError> {
        with_deadline(self.deadline, "get user", self.select_user(login)).await
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::db::init_database;

    async fn repo() -> (UserRepository, TempDir) {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let pool = init_database(&dir.path().join("test.sqlite"))
            .await
            .expect("Failed to init DB");
        (UserRepository::new(pool, Duration::from_secs(10)), dir)
    }

    #[tokio::test]
    async fn test_add_then_get() {
        let (repo, _dir) = repo().await;
        let created = repo.add_user("editor", "$argon2id$fake", true).await.unwrap();

        let found = repo.get_user_by_login("editor").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.password_hash, "$argon2id$fake");
        assert!(found.is_admin);
    }

    #[tokio::test]
    async fn test_unknown_login() {
        let (repo, _dir) = repo().await;
        assert!(repo.get_user_by_login("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_login_is_validation_error() {
        let (repo, _dir) = repo().await;
        repo.add_user("editor", "h1", false).await.unwrap();
        let err = repo.add_user("editor", "h2", false).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
