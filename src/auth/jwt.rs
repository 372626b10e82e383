//! Signed token issuance and verification (HS256).

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::UserWithoutPassword;

/// Claims stored in every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub login: String,
    pub is_admin: bool,
    /// Expiration timestamp (seconds since epoch)
    pub exp: i64,
}

/// Issues and verifies bearer tokens.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Issue a token for a user, valid for the configured lifetime.
    pub fn issue(&self, user: &UserWithoutPassword) -> Result<String, AppError> {
        if self.ttl <= Duration::zero() {
            return Err(AppError::Internal(format!(
                "token lifetime must be positive, got {}",
                self.ttl
            )));
        }
        let expires_at = Utc::now()
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::Internal("token expiry is out of range".to_string()))?;

        let claims = Claims {
            user_id: user.id,
            login: user.login.clone(),
            is_admin: user.is_admin,
            exp: expires_at.timestamp(),
        };
        self.encode(&claims)
    }

    /// Sign arbitrary claims.
    pub fn encode(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("token generation failed: {e}")))
    }

    /// Verify signature and expiry and return the claims.
    pub fn decode(&self, token: &str) -> Result<Claims, AppError> {
        let validation = Validation::new(Algorithm::HS256);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AppError::Unauthorized("token expired".to_string()),
                ErrorKind::InvalidSignature => {
                    AppError::Unauthorized("invalid token signature".to_string())
                }
                _ => AppError::Unauthorized(format!("invalid token: {e}")),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret-that-is-long-enough";

    fn user(is_admin: bool) -> UserWithoutPassword {
        UserWithoutPassword {
            id: 7,
            login: "editor".to_string(),
            is_admin,
        }
    }

    #[test]
    fn test_issue_then_decode() {
        let codec = TokenCodec::new(SECRET, Duration::hours(24));
        let token = codec.issue(&user(true)).unwrap();
        let claims = codec.decode(&token).unwrap();
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.login, "editor");
        assert!(claims.is_admin);
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let codec = TokenCodec::new(SECRET, Duration::hours(24));
        let token = codec
            .encode(&Claims {
                user_id: 7,
                login: "editor".to_string(),
                is_admin: true,
                exp: (Utc::now() - Duration::hours(2)).timestamp(),
            })
            .unwrap();
        let err = codec.decode(&token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref m) if m.contains("expired")));
    }

    #[test]
    fn test_foreign_signature_is_rejected() {
        let ours = TokenCodec::new(SECRET, Duration::hours(1));
        let theirs = TokenCodec::new("some-other-secret-of-similar-size", Duration::hours(1));
        let token = theirs.issue(&user(true)).unwrap();
        assert!(matches!(ours.decode(&token), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_unusable_lifetime_is_an_error() {
        let codec = TokenCodec::new(SECRET, Duration::hours(-1));
        assert!(matches!(codec.issue(&user(false)), Err(AppError::Internal(_))));

        let codec = TokenCodec::new(SECRET, Duration::hours(2_000_000_000_000));
        assert!(matches!(codec.issue(&user(false)), Err(AppError::Internal(_))));
    }

    #[test]
    fn test_garbage_is_rejected() {
        let codec = TokenCodec::new(SECRET, Duration::hours(1));
        assert!(matches!(codec.decode("not-a-token"), Err(AppError::Unauthorized(_))));
    }
}
