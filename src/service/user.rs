//! User sign-up and sign-in.

use std::sync::Arc;

use async_trait::async_trait;

use crate::auth::{hash_password, verify_password};
use crate::config::Config;
use crate::db::UserStore;
use crate::errors::AppError;
use crate::models::UserWithoutPassword;
use crate::sanitize::HtmlSanitizer;
use crate::validation::{validate_credentials, validate_pre_user};

const WRONG_CREDENTIALS: &str = "wrong login or password";

#[async_trait]
pub trait UserService: Send + Sync {
    /// Create an account from a raw `{login, password}` payload.
    async fn sign_up(&self, body: &[u8]) -> Result<UserWithoutPassword, AppError>;

    /// Check credentials and return the matching user.
    async fn sign_in(&self, login: &str, password: &str) -> Result<UserWithoutPassword, AppError>;
}

pub struct UserManager {
    store: Arc<dyn UserStore>,
    sanitizer: HtmlSanitizer,
    config: Arc<Config>,
}

impl UserManager {
    pub fn new(store: Arc<dyn UserStore>, sanitizer: HtmlSanitizer, config: Arc<Config>) -> Self {
        Self {
            store,
            sanitizer,
            config,
        }
    }

    fn sanitize(&self, user: UserWithoutPassword) -> UserWithoutPassword {
        UserWithoutPassword {
            login: self.sanitizer.clean(&user.login),
            ..user
        }
    }
}

/// Run a CPU-heavy hashing step off the async workers.
async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(format!("password task failed: {e}")))
}

#[async_trait]
impl UserService for UserManager {
    async fn sign_up(&self, body: &[u8]) -> Result<UserWithoutPassword, AppError> {
        let pre_user = validate_pre_user(body).map_err(|e| e.context("sign up"))?;

        let password = pre_user.password;
        let password_hash = blocking(move || hash_password(&password)).await??;
        let is_admin = self.config.is_admin_login(&pre_user.login);

        let user = self
            .store
            .add_user(&pre_user.login, &password_hash, is_admin)
            .await
            .map_err(|e| e.context("sign up"))?;

        Ok(self.sanitize(user.into()))
    }

    async fn sign_in(&self, login: &str, password: &str) -> Result<UserWithoutPassword, AppError> {
        let pre_user = validate_credentials(login, password).map_err(|e| e.context("sign in"))?;

        let user = self
            .store
            .get_user_by_login(&pre_user.login)
            .await
            .map_err(|e| e.context("sign in"))?
            .ok_or_else(|| AppError::Unauthorized(WRONG_CREDENTIALS.to_string()))?;

        let password = pre_user.password;
        let stored = user.password_hash.clone();
        let valid = blocking(move || verify_password(&password, &stored)).await?;
        if !valid {
            return Err(AppError::Unauthorized(WRONG_CREDENTIALS.to_string()));
        }

        Ok(self.sanitize(user.into()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::models::User;

    #[derive(Default)]
    struct FakeUserStore {
        users: Mutex<HashMap<String, User>>,
    }

    #[async_trait]
    impl UserStore for FakeUserStore {
        async fn add_user(
            &self,
            login: &str,
            password_hash: &str,
            is_admin: bool,
        ) -> Result<User, AppError> {
            let mut users = self.users.lock().unwrap();
            if users.contains_key(login) {
                return Err(AppError::Validation(format!("login {login} is already taken")));
            }
            let user = User {
                id: users.len() as i64 + 1,
                login: login.to_string(),
                password_hash: password_hash.to_string(),
                is_admin,
            };
            users.insert(login.to_string(), user.clone());
            Ok(user)
        }

        async fn get_user_by_login(&self, login: &str) -> Result<Option<User>, AppError> {
            Ok(self.users.lock().unwrap().get(login).cloned())
        }
    }

    fn config() -> Arc<Config> {
        Arc::new(Config {
            db_path: "unused.sqlite".into(),
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            jwt_secret: "unused".to_string(),
            token_ttl_hours: 1,
            store_timeout: Duration::from_secs(1),
            allow_origin: None,
            admin_logins: vec!["root".to_string()],
        })
    }

    fn service() -> (UserManager, Arc<FakeUserStore>) {
        let store = Arc::new(FakeUserStore::default());
        (
            UserManager::new(store.clone(), HtmlSanitizer::new(), config()),
            store,
        )
    }

    fn body(login: &str, password: &str) -> Vec<u8> {
        serde_json::to_vec(&json!({"login": login, "password": password})).unwrap()
    }

    #[tokio::test]
    async fn test_sign_up_hashes_password() {
        let (service, store) = service();
        let user = service.sign_up(&body(" editor ", "secret1")).await.unwrap();
        assert_eq!(user.login, "editor");
        assert!(!user.is_admin);

        let stored = store.users.lock().unwrap().get("editor").cloned().unwrap();
        assert_ne!(stored.password_hash, "secret1");
        assert!(verify_password("secret1", &stored.password_hash));
    }

    #[tokio::test]
    async fn test_configured_login_becomes_admin() {
        let (service, _store) = service();
        let user = service.sign_up(&body("root", "secret1")).await.unwrap();
        assert!(user.is_admin);
    }

    #[tokio::test]
    async fn test_sign_in() {
        let (service, _store) = service();
        let created = service.sign_up(&body("editor", "secret1")).await.unwrap();

        let signed_in = service.sign_in("editor", "secret1").await.unwrap();
        assert_eq!(signed_in, created);

        let err = service.sign_in("editor", "secret2").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        let err = service.sign_in("nobody", "secret1").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_short_password_is_rejected() {
        let (service, store) = service();
        let err = service.sign_up(&body("editor", "123")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(store.users.lock().unwrap().is_empty());
    }
}
