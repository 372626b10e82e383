//! Account endpoints: sign-up, sign-in and log-out.

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue},
};

use super::ApiResponse;
use crate::auth::BEARER_PREFIX;
use crate::errors::AppError;
use crate::models::UserWithoutPassword;
use crate::AppState;

pub const SIGNED_UP: &str = "successful sign up";
pub const SIGNED_IN: &str = "successful sign in";
pub const LOGGED_OUT: &str = "successful log out";

type AuthorizedResponse = (HeaderMap, ApiResponse<&'static str>);

/// Issue a token for `user` and put it into the `Authorization` header.
fn authorized(
    state: &AppState,
    user: &UserWithoutPassword,
    message: &'static str,
) -> Result<AuthorizedResponse, AppError> {
    let token = state.codec.issue(user)?;
    let value = HeaderValue::from_str(&format!("{BEARER_PREFIX}{token}"))
        .map_err(|e| AppError::Internal(format!("token is not a valid header value: {e}")))?;

    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, value);

    Ok((headers, ApiResponse::new(message)))
}

/// POST /api/v1/signup - Create an account and sign it in.
pub async fn sign_up(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<AuthorizedResponse, AppError> {
    let user = state.users.sign_up(&body).await?;
    tracing::info!(user_id = user.id, is_admin = user.is_admin, "user signed up");

    authorized(&state, &user, SIGNED_UP)
}

/// GET /api/v1/signin?login=&password= - Exchange credentials for a token.
pub async fn sign_in(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<AuthorizedResponse, AppError> {
    let login = query.get("login").map(String::as_str).unwrap_or_default();
    let password = query.get("password").map(String::as_str).unwrap_or_default();

    let user = state.users.sign_in(login, password).await?;
    tracing::info!(user_id = user.id, "user signed in");

    authorized(&state, &user, SIGNED_IN)
}

/// POST /api/v1/logout - Clear the `Authorization` header.
///
/// Tokens are stateless, so this only tells the client to drop its copy.
pub async fn log_out(request_headers: HeaderMap) -> Result<AuthorizedResponse, AppError> {
    if !request_headers.contains_key(header::AUTHORIZATION) {
        return Err(AppError::Unauthorized(
            "authorization header is missing".to_string(),
        ));
    }

    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, HeaderValue::from_static(""));

    Ok((headers, ApiResponse::new(LOGGED_OUT)))
}
