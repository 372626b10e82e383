//! User models.

use serde::{Deserialize, Serialize};

/// A stored user, including the argon2 PHC hash of the password.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub login: String,
    pub password_hash: String,
    pub is_admin: bool,
}

/// What the rest of the system gets to see about a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserWithoutPassword {
    pub id: i64,
    pub login: String,
    pub is_admin: bool,
}

impl From<User> for UserWithoutPassword {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            login: user.login,
            is_admin: user.is_admin,
        }
    }
}

/// Sign-up / sign-in credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct PreUser {
    pub login: String,
    pub password: String,
}

impl PreUser {
    pub fn trim(&mut self) {
        self.login = self.login.trim().to_string();
    }
}
